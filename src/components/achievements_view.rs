use echo_maze::achievements::AchievementDef;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct AchievementsViewProps {
    /// Catalog entries paired with their unlock state.
    pub entries: Vec<(AchievementDef, bool)>,
    /// (unlocked, total)
    pub progress: (usize, usize),
    pub skins: Vec<(&'static str, bool)>,
    pub back: Callback<()>,
}

#[function_component(AchievementsView)]
pub fn achievements_view(props: &AchievementsViewProps) -> Html {
    let back = {
        let cb = props.back.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let (unlocked, total) = props.progress;
    html! {
        <div style="padding:12px; max-width:900px; margin:0 auto;">
            <div style="display:flex; align-items:center; gap:16px;">
                <h2 style="margin:0;">{"Achievements"}</h2>
                <span style="opacity:0.8;">{ format!("{unlocked}/{total}") }</span>
                <button onclick={back}>{"Back"}</button>
            </div>
            <div style="display:grid; grid-template-columns:repeat(auto-fill, minmax(260px, 1fr)); gap:10px; margin-top:14px;">
                { for props.entries.iter().map(|(def, done)| {
                    let hidden = def.secret && !done;
                    let (name, desc) = if hidden { ("???", "Secret") } else { (def.name, def.description) };
                    html! {
                        <div key={def.id} style={format!("border:2px solid {}; border-radius:10px; padding:8px 10px; background:#111821; opacity:{};", def.tier.color(), if *done { 1.0 } else { 0.5 })}>
                            <div style="font-weight:700;">{ name }</div>
                            <div style="font-size:12px; opacity:0.85;">{ desc }</div>
                            { if let (Some(skin), false) = (def.skin, hidden) {
                                html!{ <div style="font-size:11px; opacity:0.7;">{ format!("Skin: {skin}") }</div> }
                            } else { html!{} } }
                        </div>
                    }
                }) }
            </div>
            <h3>{"Skins"}</h3>
            <div style="display:flex; gap:8px; flex-wrap:wrap;">
                { for props.skins.iter().map(|(id, owned)| html! {
                    <span style={format!("padding:4px 8px; border:1px solid #30363d; border-radius:6px; opacity:{};", if *owned { 1.0 } else { 0.35 })}>{ *id }</span>
                }) }
            </div>
        </div>
    }
}

use echo_maze::endless::RunSummary;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct GameOverOverlayProps {
    pub show: bool,
    /// Campaign finished rather than a run lost.
    pub victory: bool,
    pub summary: Option<RunSummary>,
    pub restart: Callback<()>,
    pub to_upgrades: Callback<()>,
    pub to_menu: Callback<()>,
}

#[function_component]
pub fn GameOverOverlay(props: &GameOverOverlayProps) -> Html {
    if !props.show {
        return html! {};
    }
    let restart_cb = props.restart.clone();
    let restart_btn = Callback::from(move |_| restart_cb.emit(()));
    let upgrades_btn = {
        let cb = props.to_upgrades.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let menu_btn = {
        let cb = props.to_menu.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let (title, color) = if props.victory { ("You Escaped", "#2ea043") } else { ("Game Over", "#f85149") };
    html! {
        <div style={format!("position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:rgba(0,0,0,0.85); border:2px solid {color}; padding:24px 32px; border-radius:12px; text-align:center; min-width:320px;")}>
            <h2 style={format!("margin:0 0 12px 0; color:{color};")}>{ title }</h2>
            { if let Some(s) = &props.summary { html! {
                <>
                    <p style="margin:4px 0;">{ format!("Rooms Cleared: {}", s.rooms) }</p>
                    <p style="margin:4px 0;">{ format!("Points Banked: {}", s.points) }</p>
                    { if s.new_best { html!{ <p style="margin:4px 0; color:#d4af37;">{"New best run!"}</p> } } else { html!{} } }
                </>
            } } else { html!{} } }
            <div style="margin-top:16px; display:flex; gap:12px; justify-content:center;">
                { if props.summary.is_some() { html!{ <button onclick={restart_btn}>{"Run Again"}</button> } } else { html!{} } }
                <button onclick={upgrades_btn}>{"Upgrades"}</button>
                <button onclick={menu_btn}>{"Menu"}</button>
            </div>
        </div>
    }
}

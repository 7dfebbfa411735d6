use crate::util::format_time;
use echo_maze::model::MAX_STAMINA;
use yew::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct HudStatus {
    pub icon: &'static str,
    pub label: &'static str,
    pub remaining_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HudSlot {
    pub key: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    pub charged: bool,
}

#[derive(Properties, PartialEq, Clone)]
pub struct StatsPanelProps {
    pub title: String,
    pub points: Option<u64>,
    pub stamina: f64,
    pub generators: (usize, usize),
    pub extra_lives: u32,
    pub shield_hits: u32,
    pub elapsed_ms: u64,
    pub statuses: Vec<HudStatus>,
    pub slots: Vec<HudSlot>,
    pub simplified: bool,
}

#[function_component]
pub fn StatsPanel(props: &StatsPanelProps) -> Html {
    let row_style = "display:flex; align-items:center; gap:8px;"; // icon | label | value
    let icon_style = "width:20px; text-align:center; flex-shrink:0;";
    let label_style = "flex:1; font-weight:500;";
    let value_style =
        "min-width:70px; text-align:right; font-variant-numeric:tabular-nums; font-weight:600;";
    let pct = (props.stamina / MAX_STAMINA * 100.0).clamp(0.0, 100.0);
    let (done, total) = props.generators;
    html! {
        <div style="position:absolute; top:12px; left:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:10px 14px; min-width:230px; display:flex; flex-direction:column; gap:10px; font-size:14px;">
            <div style="font-weight:700;">{ props.title.clone() }</div>
            <div style={row_style}>
                <span style={format!("{} color:#d29922;", icon_style)}>{"⚡"}</span>
                <span style={format!("{} color:#d29922;", label_style)}>{"Generators"}</span>
                <span style={format!("{} color:#d29922;", value_style)}>{ format!("{done}/{total}") }</span>
            </div>
            { if let Some(points) = props.points { html! {
                <div style={row_style}>
                    <span style={format!("{} color:#d4af37;", icon_style)}>{"🪙"}</span>
                    <span style={format!("{} color:#d4af37;", label_style)}>{"Points"}</span>
                    <span style={format!("{} color:#d4af37;", value_style)}>{ points }</span>
                </div>
            } } else { html!{} } }
            <div style="height:8px; background:#0e1116; border:1px solid #30363d; border-radius:4px; overflow:hidden;">
                <div style={format!("height:100%; width:{pct:.0}%; background:#58a6ff;")}></div>
            </div>
            { if props.simplified { html!{} } else { html! {
                <>
                    <div style={row_style}>
                        <span style={format!("{} color:#f85149;", icon_style)}>{"❤"}</span>
                        <span style={format!("{} color:#f85149;", label_style)}>{"Extra lives"}</span>
                        <span style={format!("{} color:#f85149;", value_style)}>{ props.extra_lives }</span>
                    </div>
                    <div style={row_style}>
                        <span style={format!("{} color:#79c0ff;", icon_style)}>{"🛡"}</span>
                        <span style={format!("{} color:#79c0ff;", label_style)}>{"Shield"}</span>
                        <span style={format!("{} color:#79c0ff;", value_style)}>{ props.shield_hits }</span>
                    </div>
                    <div style="font-size:12px; opacity:0.7;">{ format!("Time {}", format_time(props.elapsed_ms)) }</div>
                </>
            } } }
            { for props.statuses.iter().map(|s| html! {
                <div style="font-size:12px;">{ format!("{} {} {}", s.icon, s.label, format_time(s.remaining_ms)) }</div>
            }) }
            { if props.slots.is_empty() { html!{} } else { html! {
                <div style="display:flex; gap:6px;">
                    { for props.slots.iter().map(|s| html! {
                        <span title={s.label} style={format!("padding:2px 6px; border:1px solid #30363d; border-radius:6px; opacity:{};", if s.charged { 1.0 } else { 0.35 })}>
                            { format!("{} {}", s.key, s.icon) }
                        </span>
                    }) }
                </div>
            } } }
        </div>
    }
}

use echo_maze::model::Popup;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct PopupStackProps {
    pub popups: Vec<Popup>,
}

/// Toasts for unlocks and room results; the session removes them on a timer.
#[function_component(PopupStack)]
pub fn popup_stack(props: &PopupStackProps) -> Html {
    html! {
        <div style="position:absolute; top:64px; left:50%; transform:translateX(-50%); display:flex; flex-direction:column; gap:8px; z-index:40; pointer-events:none;">
            { for props.popups.iter().map(|p| html! {
                <div key={p.id} style={format!("background:rgba(13,17,23,0.95); border:2px solid {}; border-radius:10px; padding:8px 14px; min-width:240px; text-align:center;", p.color)}>
                    <div style={format!("font-weight:700; color:{};", p.color)}>{ p.title.clone() }</div>
                    <div style="font-size:12px; opacity:0.85;">{ p.body.clone() }</div>
                </div>
            }) }
        </div>
    }
}

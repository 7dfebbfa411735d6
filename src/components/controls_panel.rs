use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct ControlsPanelProps {
    pub paused: bool,
    pub on_toggle_pause: Callback<()>,
    pub on_open_settings: Callback<()>,
    pub on_quit: Callback<()>,
    pub flashlight: Option<bool>,
}

#[function_component]
pub fn ControlsPanel(props: &ControlsPanelProps) -> Html {
    let pause_cb = {
        let cb = props.on_toggle_pause.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let settings_cb = {
        let cb = props.on_open_settings.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let quit_cb = {
        let cb = props.on_quit.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let pause_label = if props.paused { "Resume (Esc)" } else { "Pause (Esc)" };
    html! {<div style="position:absolute; top:12px; right:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:8px; min-width:200px; display:flex; flex-direction:column; gap:6px;">
        <button onclick={pause_cb}>{ pause_label }</button>
        <button onclick={settings_cb}>{"Settings"}</button>
        <button onclick={quit_cb}>{"Quit Run"}</button>
        { match props.flashlight {
            Some(on) => html!{ <div style="font-size:11px; opacity:0.7;">{ format!("Flashlight (F): {}", if on { "on" } else { "off" }) }</div> },
            None => html!{},
        } }
    </div>}
}

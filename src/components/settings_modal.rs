use echo_maze::settings::Settings;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct SettingsModalProps {
    pub show: bool,
    pub settings: Settings,
    pub on_change: Callback<Settings>,
    pub on_close: Callback<()>,
    pub on_reset_achievements: Callback<()>,
}

#[function_component]
pub fn SettingsModal(props: &SettingsModalProps) -> Html {
    if !props.show {
        return html! {};
    }

    let close_cb = {
        let cb = props.on_close.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let toggle = |apply: fn(&mut Settings)| {
        let cb = props.on_change.clone();
        let current = props.settings.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = current.clone();
            apply(&mut next);
            cb.emit(next);
        })
    };
    let volume_cb = {
        let cb = props.on_change.clone();
        let current = props.settings.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            if let Ok(v) = input.value().parse::<f32>() {
                let mut next = current.clone();
                next.master_volume = (v / 100.0).clamp(0.0, 1.0);
                cb.emit(next);
            }
        })
    };
    let reset_cb = {
        let cb = props.on_reset_achievements.clone();
        Callback::from(move |_| {
            if let Some(win) = web_sys::window() {
                if win
                    .confirm_with_message("This wipes every achievement and its progress. Are you sure?")
                    .unwrap_or(false)
                {
                    cb.emit(());
                }
            } else {
                cb.emit(());
            }
        })
    };
    let s = &props.settings;

    html! {<div style="position:absolute; inset:0; display:flex; align-items:center; justify-content:center; background:rgba(0,0,0,0.55); z-index:50;">
        <div style="background:#161b22; border:1px solid #30363d; border-radius:12px; padding:16px 20px; min-width:340px; max-width:480px; display:flex; flex-direction:column; gap:14px;">
            <div style="display:flex; justify-content:space-between; align-items:center;">
                <h3 style="margin:0; font-size:18px;">{"Settings"}</h3>
                <button onclick={close_cb.clone()} style="padding:4px 8px;">{"Close"}</button>
            </div>
            <div style="display:flex; flex-direction:column; gap:10px;">
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input type="checkbox" checked={s.auto_movement} onclick={toggle(|s| s.auto_movement = !s.auto_movement)} />
                    <span>{"Auto-movement (hold to keep walking)"}</span>
                </label>
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input type="checkbox" checked={s.movement_audio} onclick={toggle(|s| s.movement_audio = !s.movement_audio)} />
                    <span>{"Footstep audio"}</span>
                </label>
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input type="checkbox" checked={s.simplified_ui} onclick={toggle(|s| s.simplified_ui = !s.simplified_ui)} />
                    <span>{"Simplified HUD"}</span>
                </label>
                <label style="display:flex; align-items:center; gap:8px;">
                    <span>{"Volume"}</span>
                    <input type="range" min="0" max="100" value={format!("{:.0}", s.master_volume * 100.0)} oninput={volume_cb} />
                </label>
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer; opacity:0.7;">
                    <input type="checkbox" checked={s.god_mode} onclick={toggle(|s| s.god_mode = !s.god_mode)} />
                    <span>{"God mode (disables achievements)"}</span>
                </label>
            </div>
            <div style="display:flex; gap:8px; flex-wrap:wrap;">
                <button onclick={reset_cb} style="background:#f85149; border:1px solid #b62324; color:#fff; flex:1;">{"Reset Achievements"}</button>
                <button onclick={close_cb} style="flex:0 0 auto;">{"Done"}</button>
            </div>
        </div>
    </div>}
}

use echo_maze::endless::Difficulty;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct IntroOverlayProps {
    pub show: bool,
    pub best_run: u32,
    pub points: u64,
    pub start_campaign: Callback<()>,
    pub start_endless: Callback<Difficulty>,
    pub to_upgrades: Callback<()>,
    pub to_achievements: Callback<()>,
    pub open_settings: Callback<()>,
}

#[function_component(IntroOverlay)]
pub fn intro_overlay(props: &IntroOverlayProps) -> Html {
    if !props.show {
        return html! {};
    }
    let emit = |cb: &Callback<()>| {
        let cb = cb.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    let endless = |mode: Difficulty| {
        let cb = props.start_endless.clone();
        Callback::from(move |_: MouseEvent| cb.emit(mode))
    };
    html! {
        <div style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:rgba(0,0,0,0.87); border:2px solid #30363d; padding:28px 36px; border-radius:14px; max-width:520px; width:90%; box-shadow:0 0 0 1px #1a1f24, 0 6px 18px rgba(0,0,0,0.6); font-size:14px; line-height:1.4;">
            <h2 style="margin:0 0 12px 0; font-size:22px; color:#58a6ff; text-align:center;">{"EchoMaze"}</h2>
            <p style="margin:4px 0 10px 0; text-align:center; opacity:0.85;">{"Repair every generator, then reach the exit. Something follows the sound."}</p>
            <ul style="margin:0 0 12px 18px; padding:0; list-style:disc; display:flex; flex-direction:column; gap:4px;">
                <li>{"WASD / arrows move. Swipe on touch screens."}</li>
                <li>{"E interacts: generators start a timing check, terminals hold logs."}</li>
                <li>{"Space raises your shield; blocked hits are reflected."}</li>
                <li>{"Shift dashes at full stamina. T drops a trap, F toggles the flashlight."}</li>
                <li>{"1-3 trigger abilities. Esc pauses, Enter skips dialog."}</li>
            </ul>
            <div style="display:flex; gap:12px; justify-content:center; flex-wrap:wrap; margin-top:8px;">
                <button onclick={emit(&props.start_campaign)}>{"Campaign"}</button>
                <button onclick={endless(Difficulty::Easy)}>{"Endless (Easy)"}</button>
                <button onclick={endless(Difficulty::Hard)}>{"Endless (Hard)"}</button>
            </div>
            <div style="display:flex; gap:12px; justify-content:center; margin-top:8px;">
                <button onclick={emit(&props.to_upgrades)}>{"Upgrades"}</button>
                <button onclick={emit(&props.to_achievements)}>{"Achievements"}</button>
                <button onclick={emit(&props.open_settings)}>{"Settings"}</button>
            </div>
            <div style="margin-top:12px; font-size:11px; opacity:0.6; text-align:center;">
                { format!("Best endless run: {} rooms · {} points to spend", props.best_run, props.points) }
            </div>
        </div>
    }
}

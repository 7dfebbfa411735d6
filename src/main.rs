use std::cell::RefCell;
use std::rc::Rc;
use yew::prelude::*;

mod components;
mod util;

use components::achievements_view::AchievementsView;
use components::controls_panel::ControlsPanel;
use components::game_over_overlay::GameOverOverlay;
use components::intro_overlay::IntroOverlay;
use components::legend::Legend;
use components::popups::PopupStack;
use components::run_view::{RunView, SessionHandle};
use components::settings_modal::SettingsModal;
use components::stats_panel::{HudSlot, HudStatus, StatsPanel};
use components::upgrades_view::{UpgradeRow, UpgradesView};
use echo_maze::GameSession;
use echo_maze::achievements::ACHIEVEMENTS;
use echo_maze::endless::{Difficulty, UPGRADE_DEFS, UpgradeKey};
use echo_maze::maze::TileKind;
use echo_maze::model::{CAMPAIGN_LEVELS, Mode};
use echo_maze::settings::Settings;
use echo_maze::storage::{BrowserStore, KeyValueStore, MemoryStore};
use util::now_ms;

#[derive(PartialEq, Clone, Copy)]
enum View {
    Game,
    Upgrades,
    Achievements,
}

fn open_session() -> GameSession {
    let store: Box<dyn KeyValueStore> = match BrowserStore::open() {
        Some(s) => Box::new(s),
        None => {
            log::warn!("localStorage unavailable; progress will not persist");
            Box::new(MemoryStore::new())
        }
    };
    let seed: u64 = rand::random();
    GameSession::new(store, seed)
}

/// Callback that mutates the session and re-renders.
fn session_action(
    session: &Rc<RefCell<GameSession>>,
    force_update: &UseForceUpdateHandle,
    f: impl Fn(&mut GameSession) + 'static,
) -> Callback<()> {
    let session = session.clone();
    let force_update = force_update.clone();
    Callback::from(move |_: ()| {
        f(&mut session.borrow_mut());
        force_update.force_update();
    })
}

fn hud_title(s: &GameSession) -> String {
    match &s.mode {
        Mode::Campaign(run) => format!("Level {}/{}", run.level, CAMPAIGN_LEVELS),
        Mode::Endless => format!("Endless · Room {}", s.endless.current_run.room_number + 1),
        _ => String::new(),
    }
}

fn hud_elapsed(s: &GameSession, now: u64) -> u64 {
    match &s.mode {
        Mode::Campaign(run) => now.saturating_sub(run.started_at),
        Mode::Endless => now.saturating_sub(s.endless.current_run.started_at),
        _ => 0,
    }
}

#[function_component(App)]
fn app() -> Html {
    let session = use_mut_ref(open_session);
    let force_update = use_force_update();
    let view = use_state(|| View::Game);
    let show_settings = use_state(|| false);
    let upgrade_feedback = use_state(|| None::<String>);

    let handle = SessionHandle(session.clone());
    let on_frame = {
        let force_update = force_update.clone();
        Callback::from(move |_: ()| force_update.force_update())
    };

    let set_view = |v: View| {
        let view = view.clone();
        Callback::from(move |_: ()| view.set(v))
    };

    let start_campaign = session_action(&session, &force_update, |s| s.start_campaign(1, now_ms()));
    let start_endless = {
        let session = session.clone();
        Callback::from(move |mode: Difficulty| session.borrow_mut().start_endless(mode, now_ms()))
    };
    let toggle_pause = session_action(&session, &force_update, |s| s.key_down("Escape", now_ms()));
    let quit = session_action(&session, &force_update, |s| s.quit_run(now_ms()));
    let to_menu = session_action(&session, &force_update, |s| s.return_to_menu());
    let reset_achievements = session_action(&session, &force_update, |s| s.reset_achievements());
    let open_settings = {
        let show_settings = show_settings.clone();
        Callback::from(move |_: ()| show_settings.set(true))
    };
    let close_settings = {
        let show_settings = show_settings.clone();
        Callback::from(move |_: ()| show_settings.set(false))
    };
    let change_settings = {
        let session = session.clone();
        let force_update = force_update.clone();
        Callback::from(move |next: Settings| {
            session.borrow_mut().update_settings(next);
            force_update.force_update();
        })
    };
    let purchase = {
        let session = session.clone();
        let feedback = upgrade_feedback.clone();
        Callback::from(move |key: UpgradeKey| {
            let msg = match session.borrow_mut().purchase_upgrade(key) {
                Ok(cost) => format!("Bought {} for {cost}", key.def().name),
                Err(reason) => reason.to_string(),
            };
            feedback.set(Some(msg));
        })
    };
    let refund = {
        let session = session.clone();
        let feedback = upgrade_feedback.clone();
        Callback::from(move |_: ()| {
            let refund = session.borrow_mut().reset_upgrades();
            feedback.set(Some(format!("Refunded {refund} points")));
        })
    };
    let toggle_upgrades = {
        let session = session.clone();
        let force_update = force_update.clone();
        Callback::from(move |on: bool| {
            session.borrow_mut().set_upgrades_enabled(on);
            force_update.force_update();
        })
    };
    let restart_endless = session_action(&session, &force_update, |s| {
        let mode = s.last_endless_mode;
        s.start_endless(mode, now_ms());
    });

    let s = session.borrow();
    let now = now_ms();

    let body = match *view {
        View::Upgrades => {
            let rows: Vec<UpgradeRow> = UPGRADE_DEFS
                .iter()
                .map(|d| UpgradeRow {
                    key: d.key,
                    level: s.endless.permanent_upgrades.level(d.key),
                    next_cost: s.endless.permanent_upgrades.next_cost(d.key),
                })
                .collect();
            html! {
                <UpgradesView
                    points={s.endless.available_points}
                    rows={rows}
                    upgrades_enabled={s.endless.upgrades_enabled}
                    feedback={(*upgrade_feedback).clone()}
                    purchase={purchase}
                    reset={refund}
                    toggle_enabled={toggle_upgrades}
                    back={set_view(View::Game)}
                />
            }
        }
        View::Achievements => {
            let entries: Vec<_> = ACHIEVEMENTS.iter().map(|d| (*d, s.achievements.is_unlocked(d.id))).collect();
            let skins: Vec<_> = ACHIEVEMENTS
                .iter()
                .filter_map(|d| d.skin)
                .map(|skin| (skin, s.skin_unlocked(skin)))
                .collect();
            html! {
                <AchievementsView
                    entries={entries}
                    progress={s.achievements.progress()}
                    skins={skins}
                    back={set_view(View::Game)}
                />
            }
        }
        View::Game => {
            let playing = s.is_playing();
            let statuses: Vec<HudStatus> = s
                .abilities
                .status_effects
                .iter()
                .map(|e| HudStatus { icon: e.icon, label: e.label, remaining_ms: e.expires_at.saturating_sub(now) })
                .collect();
            let slots: Vec<HudSlot> = s
                .ability_slots
                .iter()
                .enumerate()
                .map(|(i, slot)| HudSlot {
                    key: ["1", "2", "3"].get(i).copied().unwrap_or(""),
                    icon: slot.ability.icon(),
                    label: slot.ability.label(),
                    charged: slot.charged,
                })
                .collect();
            let (game_over, victory, summary) = match &s.mode {
                Mode::GameOver { summary } => (true, false, summary.clone()),
                Mode::Victory => (true, true, None),
                _ => (false, false, None),
            };
            let skill = s.skill_check.as_ref().map(|c| (c.needle(now), c.zone(), c.perfect_zone()));
            let has_terminal = s.room.tiles.iter().any(|t| matches!(t, TileKind::Terminal { .. }));
            html! {
                <>
                    <RunView session={handle.clone()} on_frame={on_frame.clone()} />
                    { if playing { html! {
                        <>
                            <StatsPanel
                                title={hud_title(&s)}
                                points={(s.mode == Mode::Endless).then_some(s.endless.current_run.points)}
                                stamina={s.player.stamina}
                                generators={(s.room.generators_repaired(), s.room.generators_total())}
                                extra_lives={s.abilities.extra_lives}
                                shield_hits={s.abilities.shield_boost_hits}
                                elapsed_ms={hud_elapsed(&s, now)}
                                statuses={statuses}
                                slots={slots}
                                simplified={s.settings.simplified_ui}
                            />
                            <ControlsPanel
                                paused={s.paused}
                                on_toggle_pause={toggle_pause}
                                on_open_settings={open_settings.clone()}
                                on_quit={quit}
                                flashlight={s.room.dark.then_some(s.player.flashlight)}
                            />
                            { if s.settings.simplified_ui { html!{} } else { html!{ <Legend dark={s.room.dark} has_terminal={has_terminal} /> } } }
                        </>
                    } } else { html!{} } }
                    { if let Some((needle, (lo, hi), (plo, phi))) = skill { html! {
                        <div style="position:absolute; bottom:80px; left:50%; transform:translateX(-50%); width:360px; height:22px; background:#0e1116; border:2px solid #30363d; border-radius:6px;">
                            <div style={format!("position:absolute; top:0; bottom:0; left:{:.1}%; width:{:.1}%; background:#2ea043;", lo * 100.0, (hi - lo) * 100.0)}></div>
                            <div style={format!("position:absolute; top:0; bottom:0; left:{:.1}%; width:{:.1}%; background:#d4af37;", plo * 100.0, (phi - plo) * 100.0)}></div>
                            <div style={format!("position:absolute; top:-4px; bottom:-4px; left:{:.1}%; width:3px; background:#fff;", needle * 100.0)}></div>
                        </div>
                    } } else { html!{} } }
                    { if let Some(d) = &s.dialog { html! {
                        <div style="position:absolute; bottom:24px; left:50%; transform:translateX(-50%); max-width:560px; background:rgba(13,17,23,0.95); border:1px solid #a371f7; border-radius:10px; padding:12px 16px;">
                            <div>{ d.text.clone() }</div>
                            <div style="font-size:11px; opacity:0.6; margin-top:6px;">{"Enter to skip"}</div>
                        </div>
                    } } else { html!{} } }
                    { if s.paused { html! {
                        <div style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); font-size:28px; font-weight:700;">{"Paused"}</div>
                    } } else { html!{} } }
                    <IntroOverlay
                        show={s.mode == Mode::Menu}
                        best_run={s.endless.lifetime_stats.best_run}
                        points={s.endless.available_points}
                        start_campaign={start_campaign}
                        start_endless={start_endless}
                        to_upgrades={set_view(View::Upgrades)}
                        to_achievements={set_view(View::Achievements)}
                        open_settings={open_settings}
                    />
                    <GameOverOverlay
                        show={game_over}
                        victory={victory}
                        summary={summary}
                        restart={restart_endless}
                        to_upgrades={set_view(View::Upgrades)}
                        to_menu={to_menu}
                    />
                    <PopupStack popups={s.popups.clone()} />
                </>
            }
        }
    };

    html! {
        <div id="root" style="position:relative; width:100vw; height:100vh; overflow:hidden;">
            { body }
            <SettingsModal
                show={*show_settings}
                settings={s.settings.clone()}
                on_change={change_settings}
                on_close={close_settings}
                on_reset_achievements={reset_achievements}
            />
        </div>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger already set: {e}").into());
    }
    yew::Renderer::<App>::new().render();
}

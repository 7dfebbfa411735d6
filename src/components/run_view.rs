use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, TouchEvent};
use yew::prelude::*;

use crate::util::now_ms;
use echo_maze::GameSession;
use echo_maze::endless::EnemyKind;
use echo_maze::input::TICK_MS;
use echo_maze::maze::TileKind;

/// Shared session; equality is identity so props never deep-compare it.
#[derive(Clone)]
pub struct SessionHandle(pub Rc<RefCell<GameSession>>);

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct RunViewProps {
    pub session: SessionHandle,
    /// Fired after every simulation tick so the HUD can re-render.
    pub on_frame: Callback<()>,
}

const KEYS_WITH_DEFAULTS: [&str; 6] = ["Space", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "Enter"];

#[function_component(RunView)]
pub fn run_view(props: &RunViewProps) -> Html {
    let canvas_ref = use_node_ref();

    {
        let canvas_ref = canvas_ref.clone();
        let session = props.session.0.clone();
        let on_frame = props.on_frame.clone();
        use_effect_with((), move |_| {
            let mut cleanup: Vec<Box<dyn FnOnce()>> = Vec::new();
            if let (Some(window), Some(canvas)) = (web_sys::window(), canvas_ref.cast::<HtmlCanvasElement>()) {
                let resize = {
                    let canvas = canvas.clone();
                    let window = window.clone();
                    move || {
                        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
                        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
                        canvas.set_width(width.max(0.0) as u32);
                        canvas.set_height(height.max(0.0) as u32);
                    }
                };
                resize();

                let resize_cb = Closure::wrap(Box::new(resize) as Box<dyn FnMut()>);
                let _ = window.add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref());

                let sim_tick = {
                    let session = session.clone();
                    let canvas = canvas.clone();
                    Closure::wrap(Box::new(move || {
                        let now = now_ms();
                        {
                            let mut s = session.borrow_mut();
                            s.tick(now);
                            draw(&canvas, &s, now);
                        }
                        on_frame.emit(());
                    }) as Box<dyn FnMut()>)
                };
                let tick_id = window
                    .set_interval_with_callback_and_timeout_and_arguments_0(sim_tick.as_ref().unchecked_ref(), TICK_MS as i32)
                    .ok();

                let keydown = {
                    let session = session.clone();
                    Closure::wrap(Box::new(move |e: KeyboardEvent| {
                        let code = e.code();
                        if KEYS_WITH_DEFAULTS.contains(&code.as_str()) {
                            e.prevent_default();
                        }
                        session.borrow_mut().key_down(&code, now_ms());
                    }) as Box<dyn FnMut(_)>)
                };
                let keyup = {
                    let session = session.clone();
                    Closure::wrap(Box::new(move |e: KeyboardEvent| {
                        session.borrow_mut().key_up(&e.code());
                    }) as Box<dyn FnMut(_)>)
                };
                let _ = window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
                let _ = window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());

                let touch_start = {
                    let session = session.clone();
                    Closure::wrap(Box::new(move |e: TouchEvent| {
                        e.prevent_default();
                        if let Some(t) = e.changed_touches().get(0) {
                            session.borrow_mut().touch_start(t.client_x() as f64, t.client_y() as f64);
                        }
                    }) as Box<dyn FnMut(_)>)
                };
                let touch_end = {
                    let session = session.clone();
                    Closure::wrap(Box::new(move |e: TouchEvent| {
                        e.prevent_default();
                        if let Some(t) = e.changed_touches().get(0) {
                            session.borrow_mut().touch_end(t.client_x() as f64, t.client_y() as f64, now_ms());
                        }
                    }) as Box<dyn FnMut(_)>)
                };
                let _ = canvas.add_event_listener_with_callback("touchstart", touch_start.as_ref().unchecked_ref());
                let _ = canvas.add_event_listener_with_callback("touchend", touch_end.as_ref().unchecked_ref());

                cleanup.push(Box::new(move || {
                    if let Some(id) = tick_id {
                        window.clear_interval_with_handle(id);
                    }
                    let _ = window.remove_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref());
                    let _ = window.remove_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
                    let _ = window.remove_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());
                    let _ = canvas.remove_event_listener_with_callback("touchstart", touch_start.as_ref().unchecked_ref());
                    let _ = canvas.remove_event_listener_with_callback("touchend", touch_end.as_ref().unchecked_ref());
                    drop(sim_tick);
                }));
            } else {
                log::error!("canvas not mounted; run view inactive");
            }
            move || {
                for f in cleanup {
                    f();
                }
            }
        });
    }

    html! {
        <canvas ref={canvas_ref} id="game-canvas" style="display:block; width:100%; height:100%; touch-action:none;"></canvas>
    }
}

fn enemy_color(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Chaser => "#f85149",
        EnemyKind::Seeker => "#db61a2",
        EnemyKind::FlyingPig => "#ffa7c4",
        EnemyKind::Batter => "#bc4c00",
        EnemyKind::Mortar => "#8b949e",
    }
}

fn draw(canvas: &HtmlCanvasElement, s: &GameSession, now: u64) {
    if !canvas.is_connected() {
        return;
    }
    let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        return;
    };
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
    ctx.set_fill_style_str("#0e1116");
    ctx.fill_rect(0.0, 0.0, w, h);

    let room = &s.room;
    let gs = room.grid_size;
    let scale_px = (w / gs.width as f64).min(h / gs.height as f64) * 0.9;
    let offset_x = (w - scale_px * gs.width as f64) * 0.5;
    let offset_y = (h - scale_px * gs.height as f64) * 0.5;
    ctx.set_transform(scale_px, 0.0, 0.0, scale_px, offset_x, offset_y).ok();

    let margin = 0.1;
    for p in room.positions() {
        let Some(kind) = room.tile(p) else { continue };
        let (x, y) = (p.x as f64, p.y as f64);
        let color = match kind {
            TileKind::Wall => "#1d2430",
            TileKind::Floor => "#161b22",
            TileKind::Generator { repaired: false } => "#d29922",
            TileKind::Generator { repaired: true } => "#2ea043",
            TileKind::Terminal { read } => if read { "#4c3a75" } else { "#a371f7" },
            TileKind::Pickup => "#e3b341",
            TileKind::Exit => if room.all_generators_repaired() { "#f0883e" } else { "#5a3a22" },
        };
        ctx.set_fill_style_str("#161b22");
        ctx.fill_rect(x, y, 1.0, 1.0);
        match kind {
            TileKind::Floor => {}
            TileKind::Wall => {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(x, y, 1.0, 1.0);
            }
            _ => {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(x + margin, y + margin, 1.0 - 2.0 * margin, 1.0 - 2.0 * margin);
            }
        }
    }

    if let Some(trap) = s.player.trap {
        ctx.set_stroke_style_str("#8b949e");
        ctx.set_line_width(0.08);
        ctx.stroke_rect(trap.x as f64 + 0.25, trap.y as f64 + 0.25, 0.5, 0.5);
    }

    for e in &s.enemies {
        let stunned = now < e.stunned_until;
        ctx.set_fill_style_str(if stunned { "#6e7681" } else { enemy_color(e.kind) });
        ctx.begin_path();
        let _ = ctx.arc(e.pos.x as f64 + 0.5, e.pos.y as f64 + 0.5, 0.32, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }

    let p = &s.player;
    let flicker = now < p.grace_until && (now / 100) % 2 == 0;
    if !flicker {
        ctx.set_fill_style_str("#58a6ff");
        ctx.begin_path();
        let _ = ctx.arc(p.pos.x as f64 + 0.5, p.pos.y as f64 + 0.5, 0.36, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }
    if p.blocking {
        ctx.set_stroke_style_str("#79c0ff");
        ctx.set_line_width(0.08);
        ctx.begin_path();
        let _ = ctx.arc(p.pos.x as f64 + 0.5, p.pos.y as f64 + 0.5, 0.46, 0.0, std::f64::consts::TAU);
        ctx.stroke();
    }

    if room.dark {
        let radius = if p.flashlight { 5 } else { 2 };
        ctx.set_fill_style_str("rgba(0,0,0,0.92)");
        for c in room.positions() {
            if c.manhattan(p.pos) > radius {
                ctx.fill_rect(c.x as f64, c.y as f64, 1.0, 1.0);
            }
        }
    }
}

use echo_maze::endless::{PurchaseRejection, UpgradeKey};
use yew::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeRow {
    pub key: UpgradeKey,
    pub level: u32,
    pub next_cost: Result<u64, PurchaseRejection>,
}

#[derive(Properties, PartialEq, Clone)]
pub struct UpgradesViewProps {
    pub points: u64,
    pub rows: Vec<UpgradeRow>,
    pub upgrades_enabled: bool,
    pub feedback: Option<String>,
    pub purchase: Callback<UpgradeKey>,
    pub reset: Callback<()>,
    pub toggle_enabled: Callback<bool>,
    pub back: Callback<()>,
}

#[function_component(UpgradesView)]
pub fn upgrades_view(props: &UpgradesViewProps) -> Html {
    let show_reset_confirm = use_state(|| false);

    let open_reset = {
        let s = show_reset_confirm.clone();
        Callback::from(move |_| s.set(true))
    };
    let cancel_reset = {
        let s = show_reset_confirm.clone();
        Callback::from(move |_| s.set(false))
    };
    let confirm_reset = {
        let s = show_reset_confirm.clone();
        let cb = props.reset.clone();
        Callback::from(move |_| {
            cb.emit(());
            s.set(false);
        })
    };
    let toggle_enabled = {
        let cb = props.toggle_enabled.clone();
        let on = props.upgrades_enabled;
        Callback::from(move |_| cb.emit(!on))
    };
    let back = {
        let cb = props.back.clone();
        Callback::from(move |_| cb.emit(()))
    };

    let cards = props.rows.iter().map(|row| {
        let def = row.key.def();
        let bar = row.level as f64 / def.max_level.max(1) as f64 * 100.0;
        let (label, affordable) = match row.next_cost {
            Ok(cost) => (format!("Buy ({cost})"), cost <= props.points),
            Err(reason) => (reason.to_string(), false),
        };
        let buy = {
            let cb = props.purchase.clone();
            let key = row.key;
            Callback::from(move |_| cb.emit(key))
        };
        html! {
            <div style="position:relative; width:220px; height:150px;">
                <div style="position:absolute; inset:0; border:2px solid #374151; border-radius:14px; padding:8px 10px 42px 10px; background:#111821;">
                    <div style="font-weight:700; font-size:14px; letter-spacing:.5px;">{ def.name }</div>
                    <div style="font-size:12px; line-height:1.2; opacity:0.85; white-space:pre-line;">{ def.description }</div>
                    <div style="font-size:11px; opacity:0.7;">{ format!("{}/{}", row.level, def.max_level) }</div>
                    <button
                        onclick={buy}
                        disabled={!affordable}
                        style="position:absolute; left:10px; right:10px; bottom:10px; height:26px; font-size:12px; border-radius:8px; border:1px solid #30363d; background:#1c2128; color:#fff;"
                    >
                        { label }
                    </button>
                    <div style="position:absolute; left:0; bottom:0; height:6px; width:100%; background:#161b22; border-radius:0 0 14px 14px; overflow:hidden;">
                        <div style={format!("height:100%; width:{:.1}%; background:#3fb950;", bar)}></div>
                    </div>
                </div>
            </div>
        }
    });

    html! {
        <div style="position:relative; width:100vw; height:100vh; padding:12px; box-sizing:border-box;">
            <div style="display:flex; align-items:center; gap:16px;">
                <h2 style="margin:0;">{"Upgrades"}</h2>
                <span style="color:#d4af37; font-weight:600;">{ format!("🪙 {}", props.points) }</span>
                <label style="display:flex; align-items:center; gap:6px; cursor:pointer;">
                    <input type="checkbox" checked={props.upgrades_enabled} onclick={toggle_enabled} />
                    <span>{"Apply upgrades to runs"}</span>
                </label>
                <button onclick={open_reset}>{"Refund All"}</button>
                <button onclick={back}>{"Back"}</button>
            </div>
            { if let Some(msg) = &props.feedback { html!{ <div style="margin-top:8px; font-size:12px; opacity:0.8;">{ msg.clone() }</div> } } else { html!{} } }
            <div style="display:flex; flex-wrap:wrap; gap:14px; margin-top:16px;">
                { for cards }
            </div>
            { if *show_reset_confirm { html! {
                <div style="position:absolute; inset:0; background:rgba(0,0,0,0.55); backdrop-filter:blur(2px); display:flex; align-items:center; justify-content:center; z-index:200;">
                    <div style="width:360px; max-width:90%; background:#161b22; border:1px solid #30363d; border-radius:12px; padding:18px 20px 16px 20px; display:flex; flex-direction:column; gap:14px;">
                        <div style="font-size:16px; font-weight:600;">{"Refund Upgrades"}</div>
                        <div style="font-size:13px; line-height:1.4; opacity:0.85;">
                            {"Every upgrade is removed and its full cost returned to your points."}
                        </div>
                        <div style="display:flex; gap:10px; justify-content:flex-end;">
                            <button onclick={cancel_reset} style="min-width:90px;">{"Cancel"}</button>
                            <button onclick={confirm_reset} style="min-width:110px; background:#b62324; border:1px solid #da3633;">{"Confirm Refund"}</button>
                        </div>
                    </div>
                </div>
            } } else { html!{} } }
        </div>
    }
}

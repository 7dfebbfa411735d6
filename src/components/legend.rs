use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct LegendRowProps {
    pub color: &'static str,
    pub label: &'static str,
}

#[function_component(LegendRow)]
pub fn legend_row(props: &LegendRowProps) -> Html {
    html! { <div style="display:flex; align-items:center; gap:8px; margin:3px 0;"> <span style={format!("display:inline-block; width:12px; height:12px; background:{}; border:1px solid #30363d; border-radius:2px;", props.color)}></span> <span>{ props.label }</span> </div> }
}

#[derive(Properties, PartialEq, Clone)]
pub struct LegendProps {
    pub dark: bool,
    pub has_terminal: bool,
}

#[function_component(Legend)]
pub fn legend(props: &LegendProps) -> Html {
    html! {
        <div style="position:absolute; right:12px; bottom:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:8px; min-width:160px;">
            <div style="font-weight:600; margin-bottom:6px;">{"Legend"}</div>
            <LegendRow color="#58a6ff" label="You" />
            <LegendRow color="#d29922" label="Generator" />
            <LegendRow color="#2ea043" label="Repaired" />
            <LegendRow color="#f0883e" label="Exit" />
            <LegendRow color="#f85149" label="Enemy" />
            { if props.has_terminal { html!{ <LegendRow color="#a371f7" label="Terminal" /> } } else { html!{} } }
            { if props.dark { html!{ <LegendRow color="#e3b341" label="Battery" /> } } else { html!{} } }
        </div>
    }
}

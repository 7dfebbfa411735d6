pub mod achievements_view;
pub mod controls_panel;
pub mod game_over_overlay;
pub mod intro_overlay;
pub mod legend;
pub mod popups;
pub mod run_view;
pub mod settings_modal;
pub mod stats_panel;
pub mod upgrades_view;

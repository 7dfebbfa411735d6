//! EchoMaze game core. Everything here runs without a browser; the yew
//! front-end in `main.rs` drives a [`model::GameSession`].

pub mod abilities;
pub mod achievements;
pub mod endless;
pub mod input;
pub mod maze;
pub mod model;
pub mod settings;
pub mod storage;
pub mod timers;

pub use model::GameSession;

mod app;
mod message;
mod screens;
mod state;
mod widgets;

pub use app::{AgriRoboApp, run};
pub use message::Message;
pub use state::AppState;
pub use widgets::Panel;

pub mod ai;
pub mod interaction_log;
pub mod server;
pub mod settings;

pub use interaction_log::InteractionLog;
pub use server::{router, serve, AppState};
pub use settings::Settings;

mod config;
mod error;
mod playback_routes;
mod server;
mod session;
mod state;
mod user_routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{make_app, run_server};
pub use session::Session;
pub use state::ServerState;

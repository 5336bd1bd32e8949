pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod realtime;
pub mod server;
pub mod state;

pub use config::{AppConfig, load_config};
pub use server::{RollcallServer, ServerBuilder, build_app};
pub use state::AppState;

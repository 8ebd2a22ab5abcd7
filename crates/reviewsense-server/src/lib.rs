//! ReviewSense Server
//!
//! Serves sentiment predictions from a trained artifact set alongside a
//! small review store and per-sentiment counters.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;

pub use cli::Cli;
pub use config::ServerConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;

//! CropCheck Server
//!
//! HTTP boundary for the plant disease advisor: accepts leaf images,
//! runs the shared classifier through its dispatcher, and returns disease
//! information, treatment guidance and optional pesticide dosage.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Cli, CorsConfig, ServerConfig};
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;

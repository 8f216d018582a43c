//! # agora-common
//!
//! Shared utilities including configuration, error handling, token
//! authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, TokenService};
pub use config::{AppConfig, AppSettings, ChatConfig, ConfigError, Environment, ServerConfig, TokenConfig};
pub use error::{AppError, AppResult};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};

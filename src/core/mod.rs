//! Core utilities, configuration, and common functionality

pub mod config;
pub mod logging;
pub mod process;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use logging::{init_logger, log_delivery_configuration};

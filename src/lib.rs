//! Tubedrop - Telegram bot that downloads videos and sends them back
//!
//! The interesting part is getting an arbitrarily large file to a chat that
//! rejects payloads over a fixed ceiling: the file is sent directly when it
//! fits, re-encoded to a bitrate computed from the size budget when it does
//! not, and uploaded to an external file host as a last resort.
//!
//! # Module Structure
//!
//! - `core`: configuration, logging, process helpers, validation
//! - `download`: fetch, probe, transcode, upload and the delivery state machine
//! - `telegram`: bot creation, dispatcher schema, Telegram transport

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use download::{DeliveryConfig, DeliveryError, DeliveryOutcome, DeliveryStrategy, DownloadPipeline};

//! Fetching media and delivering it within the chat transport's size limit
//!
//! - `fetch`: yt-dlp download of the best streams, muxed to mp4
//! - `probe`, `transcode`: duration probing and budget-driven re-encoding
//! - `upload`: external file host fallback
//! - `send`: media/document sending order
//! - `delivery`: the direct → compressed → hosted state machine
//! - `pipeline`: the per-request entry point used by the bot

pub mod artifact;
pub mod budget;
pub mod delivery;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod probe;
pub mod send;
pub mod transcode;
pub mod upload;

pub use budget::{DeliveryConfig, SizeBudget, TranscodeSettings};
pub use delivery::{DeliveryOutcome, DeliveryStrategy};
pub use error::DeliveryError;
pub use pipeline::DownloadPipeline;
pub use send::{ChatTransport, SendMethod};

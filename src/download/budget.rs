//! Size budget and encoding parameters for a delivery.
//!
//! Values come from `core::config` and are passed explicitly into the
//! orchestrator and the transcoder, so tests can run with their own budgets.

use crate::core::config;

/// Hard payload ceiling of the chat transport and the headroom subtracted
/// from it before a transcode target is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBudget {
    /// Files at or below this size are sent as-is
    pub ceiling_bytes: u64,
    /// Absorbs encoder overshoot; the transcode target is `ceiling - headroom`
    pub reserved_headroom_bytes: u64,
}

impl SizeBudget {
    /// Byte target handed to the transcoder.
    pub fn compress_target(&self) -> u64 {
        self.ceiling_bytes.saturating_sub(self.reserved_headroom_bytes)
    }

    pub fn fits(&self, size: u64) -> bool {
        size <= self.ceiling_bytes
    }
}

/// Knobs of the bitrate allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscodeSettings {
    /// Share of the target bits held back (0.05 keeps 95%)
    pub safety_margin: f64,
    /// Fixed audio bitrate of the re-encode
    pub audio_bitrate_kbps: u32,
    /// Allocations below this video bitrate are refused
    pub video_floor_bps: u64,
    /// Lowest video bitrate passed to the encoder
    pub min_video_kbps: u64,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            safety_margin: config::delivery::SAFETY_MARGIN,
            audio_bitrate_kbps: config::delivery::AUDIO_BITRATE_KBPS,
            video_floor_bps: config::delivery::VIDEO_BITRATE_FLOOR_BPS,
            min_video_kbps: config::delivery::MIN_VIDEO_BITRATE_KBPS,
        }
    }
}

/// Everything the delivery strategy needs to know about sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryConfig {
    pub budget: SizeBudget,
    pub transcode: TranscodeSettings,
}

impl DeliveryConfig {
    /// Snapshot of the process configuration.
    pub fn from_env() -> Self {
        Self {
            budget: SizeBudget {
                ceiling_bytes: *config::delivery::MAX_SEND_SIZE_BYTES,
                reserved_headroom_bytes: config::delivery::RESERVED_HEADROOM_BYTES,
            },
            transcode: TranscodeSettings::default(),
        }
    }
}

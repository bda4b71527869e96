use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Download folder path
/// Read from DOWNLOAD_FOLDER environment variable
/// Supports tilde (~) expansion for home directory
/// Default: downloads (relative to the working directory)
pub static DOWNLOAD_FOLDER: Lazy<String> = Lazy::new(|| {
    let raw = env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "downloads".to_string());
    shellexpand::tilde(&raw).into_owned()
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// ffmpeg binary path (FFMPEG_BIN, default "ffmpeg")
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// ffprobe binary path (FFPROBE_BIN, default "ffprobe")
pub static FFPROBE_BIN: Lazy<String> =
    Lazy::new(|| env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string()));

/// Delivery size budget and transcoding parameters
pub mod delivery {
    use super::{env, Lazy};

    const MIB: u64 = 1024 * 1024;

    /// Default Bot API upload ceiling in megabytes
    pub const DEFAULT_MAX_SEND_SIZE_MB: u64 = 50;

    /// Largest payload the chat transport accepts, in bytes.
    /// Read from MAX_SEND_SIZE_MB (useful with a local Bot API server, which allows 2000 MB)
    pub static MAX_SEND_SIZE_BYTES: Lazy<u64> =
        Lazy::new(|| ceiling_bytes(env::var("MAX_SEND_SIZE_MB").ok().as_deref()));

    /// Converts a MAX_SEND_SIZE_MB value to bytes. Unparseable, zero or
    /// overflowing values fall back to the default.
    pub fn ceiling_bytes(raw_mb: Option<&str>) -> u64 {
        raw_mb
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|mb| *mb > 0)
            .and_then(|mb| mb.checked_mul(MIB))
            .unwrap_or(DEFAULT_MAX_SEND_SIZE_MB * MIB)
    }

    /// Subtracted from the ceiling before computing a transcode target (1 MiB)
    pub const RESERVED_HEADROOM_BYTES: u64 = MIB;

    /// Share of the target bits held back to absorb encoder overshoot
    pub const SAFETY_MARGIN: f64 = 0.05;

    /// Audio bitrate used for re-encoded files
    pub const AUDIO_BITRATE_KBPS: u32 = 128;

    /// Below this video bitrate the output is unwatchable; transcoding is refused
    pub const VIDEO_BITRATE_FLOOR_BPS: u64 = 80_000;

    /// Lowest video bitrate ever passed to the encoder
    pub const MIN_VIDEO_BITRATE_KBPS: u64 = 100;
}

/// External file host used when the file cannot be sent directly
pub mod upload {
    use super::{env, Duration, Lazy};

    /// Object-store endpoint; files are PUT to `<endpoint>/<basename>`
    /// Read from UPLOAD_ENDPOINT environment variable
    pub static ENDPOINT: Lazy<String> =
        Lazy::new(|| env::var("UPLOAD_ENDPOINT").unwrap_or_else(|_| "https://transfer.sh".to_string()));

    /// Timeout for the whole upload request (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Upload request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for yt-dlp commands (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 1800;

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    /// Large enough for a 50 MB video upload on a slow link
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headroom_is_one_mebibyte() {
        assert_eq!(delivery::RESERVED_HEADROOM_BYTES, 1_048_576);
    }

    #[test]
    fn test_ceiling_bytes() {
        assert_eq!(delivery::ceiling_bytes(None), 50 * 1_048_576);
        assert_eq!(delivery::ceiling_bytes(Some("2000")), 2000 * 1_048_576);
        assert_eq!(delivery::ceiling_bytes(Some("0")), 50 * 1_048_576);
        assert_eq!(delivery::ceiling_bytes(Some("lots")), 50 * 1_048_576);
    }

    #[test]
    fn test_ceiling_bytes_overflow_falls_back() {
        assert_eq!(delivery::ceiling_bytes(Some("18446744073709551615")), 50 * 1_048_576);
        assert_eq!(delivery::ceiling_bytes(Some("17592186044416")), 50 * 1_048_576);
    }

    #[test]
    fn test_upload_timeout() {
        assert_eq!(upload::timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_ytdlp_timeout() {
        assert_eq!(download::ytdlp_timeout().as_secs(), download::YTDLP_TIMEOUT_SECS);
    }
}

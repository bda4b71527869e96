//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the delivery configuration

use anyhow::Result;
use fs_err::File;
use simplelog::*;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the log file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the delivery configuration at application startup
pub fn log_delivery_configuration() {
    let ceiling_mb = *config::delivery::MAX_SEND_SIZE_BYTES / (1024 * 1024);
    log::info!("Download folder: {}", config::DOWNLOAD_FOLDER.as_str());
    log::info!(
        "Send ceiling: {} MB (headroom {} bytes, margin {:.0}%)",
        ceiling_mb,
        config::delivery::RESERVED_HEADROOM_BYTES,
        config::delivery::SAFETY_MARGIN * 100.0
    );
    log::info!(
        "Tools: yt-dlp={}, ffmpeg={}, ffprobe={}",
        config::YTDL_BIN.as_str(),
        config::FFMPEG_BIN.as_str(),
        config::FFPROBE_BIN.as_str()
    );
    log::info!("Host fallback endpoint: {}", config::upload::ENDPOINT.as_str());
}

//! Media duration probing via ffprobe.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::{last_line, run_with_timeout, FFPROBE_TIMEOUT};
use crate::download::error::DeliveryError;

/// Reports the duration of a local media file.
///
/// `None` means the duration is unavailable (missing file, tool failure,
/// unparseable output); callers must treat it as "no bitrate can be computed".
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration(&self, path: &Path) -> Option<f64>;
}

/// `DurationProbe` backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    bin: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(config::FFPROBE_BIN.as_str())
    }
}

impl FfprobeProbe {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> Option<f64> {
        if !path.is_file() {
            log::warn!("ffprobe skipped, file not found: {}", path.display());
            return None;
        }

        let mut cmd = Command::new(&self.bin);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path);

        let output = match run_with_timeout(&mut cmd, FFPROBE_TIMEOUT).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("ffprobe failed to run for {}: {}", path.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            log::warn!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                path.display(),
                last_line(&output.stderr)
            );
            return None;
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Duration of `path`, or `ProbeUnavailable` for callers that need an error.
///
/// The transcoder does not use this: for it an unknown duration means no
/// bitrate can be computed, which it reports as `EncodeInfeasible`.
pub async fn require_duration(probe: &dyn DurationProbe, path: &Path) -> Result<f64, DeliveryError> {
    probe
        .duration(path)
        .await
        .ok_or_else(|| DeliveryError::ProbeUnavailable(path.display().to_string()))
}

/// Parses ffprobe's `format=duration` output (seconds, e.g. `212.480000`).
/// `N/A`, negative and non-finite values are rejected.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("212.480000\n"), Some(212.48));
        assert_eq!(parse_duration("\n60\n"), Some(60.0));
        assert_eq!(parse_duration("0.000000"), Some(0.0));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("-3.5"), None);
        assert_eq!(parse_duration("inf"), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let probe = FfprobeProbe::default();
        assert_eq!(probe.duration(Path::new("/nonexistent/clip.mp4")).await, None);
    }

    #[tokio::test]
    async fn test_require_duration_reports_probe_unavailable() {
        let probe = FfprobeProbe::default();
        assert_eq!(
            require_duration(&probe, Path::new("/nonexistent/clip.mp4")).await,
            Err(DeliveryError::ProbeUnavailable("/nonexistent/clip.mp4".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let probe = FfprobeProbe::new("definitely-not-ffprobe-xyz");
        assert_eq!(probe.duration(file.path()).await, None);
    }
}

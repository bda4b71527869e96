//! Media fetch collaborator: URL in, local muxed mp4 out.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::core::config;
use crate::core::process::{last_line, run_with_timeout};
use crate::download::error::DeliveryError;

/// Retrieves the media behind a URL into a local file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<PathBuf, DeliveryError>;
}

/// Best mp4 video + best m4a audio, falling back to the best single file.
const FORMAT_SELECTOR: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b";

static NEXT_STAGING_ID: AtomicU64 = AtomicU64::new(0);

/// Per-request directory for yt-dlp's `.part` and per-format files.
/// Removed with everything in it when dropped, whether the fetch finished,
/// failed or timed out.
#[derive(Debug)]
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    async fn create(parent: &Path) -> io::Result<Self> {
        let id = NEXT_STAGING_ID.fetch_add(1, Ordering::Relaxed);
        let path = parent.join(format!(".staging-{}-{}", std::process::id(), id));
        fs_err::tokio::create_dir_all(&path).await?;
        Ok(Self { path })
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        match fs_err::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove download leftovers: {}", e),
        }
    }
}

/// `MediaFetcher` backed by yt-dlp.
///
/// Files are named after the video title with spaces replaced by underscores
/// (`--restrict-filenames`), so two concurrent requests for the same title
/// write to the same path. Intermediate files live in a per-request staging
/// directory; only the merged file lands in `output_dir`.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    bin: String,
    output_dir: PathBuf,
    timeout: Duration,
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new(
            config::YTDL_BIN.as_str(),
            config::DOWNLOAD_FOLDER.as_str(),
            config::download::ytdlp_timeout(),
        )
    }
}

impl YtDlpFetcher {
    pub fn new(bin: impl Into<String>, output_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// yt-dlp arguments; the final path is printed on stdout after the merge.
    pub fn build_args(&self, url: &Url, staging_dir: &Path) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--restrict-filenames".to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            FORMAT_SELECTOR.to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "-P".to_string(),
            self.output_dir.to_string_lossy().into_owned(),
            "-P".to_string(),
            format!("temp:{}", staging_dir.to_string_lossy()),
            "-o".to_string(),
            "%(title)s.%(ext)s".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &Url) -> Result<PathBuf, DeliveryError> {
        let staging = StagingDir::create(&self.output_dir).await.map_err(|e| {
            log::error!("Cannot prepare download folder: {}", e);
            DeliveryError::FetchFailed("the download folder is not writable".to_string())
        })?;

        log::info!("Fetching {} into {}", url, self.output_dir.display());

        let mut cmd = Command::new(&self.bin);
        cmd.args(self.build_args(url, &staging.path));
        let output = run_with_timeout(&mut cmd, self.timeout).await.map_err(|e| {
            log::error!("{} did not finish for {}: {}", self.bin, url, e);
            DeliveryError::FetchFailed("the downloader did not finish in time".to_string())
        })?;

        if !output.status.success() {
            let reason = last_line(&output.stderr);
            log::error!("yt-dlp failed for {}: {}", url, reason);
            return Err(DeliveryError::FetchFailed(user_facing_reason(&reason)));
        }

        let printed = last_line(&output.stdout);
        if printed.is_empty() {
            return Err(DeliveryError::FetchFailed("yt-dlp did not report an output file".to_string()));
        }

        let path = PathBuf::from(printed);
        log::info!("Fetched {} -> {}", url, path.display());
        Ok(path)
    }
}

/// Strips the `ERROR: [extractor] id:` prefix yt-dlp puts on its messages.
fn user_facing_reason(stderr_line: &str) -> String {
    let message = stderr_line.strip_prefix("ERROR:").unwrap_or(stderr_line).trim();
    let message = match message.strip_prefix('[') {
        Some(rest) => rest
            .split_once(']')
            .map(|(_, tail)| tail)
            .unwrap_or(rest)
            .trim(),
        None => message,
    };
    let message = match message.split_once(": ") {
        Some((id, tail)) if !id.contains(' ') => tail,
        _ => message,
    };

    if message.is_empty() {
        "the video could not be downloaded".to_string()
    } else {
        message.to_string()
    }
}

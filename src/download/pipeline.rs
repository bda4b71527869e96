//! Download request pipeline.
//!
//! `handle_download_request` is the single entry point the chat front-end
//! calls for a URL:
//!   validate URL → status message → fetch → delivery strategy → terminal message
//!
//! The user sees status updates along the way and exactly one terminal
//! message: the media itself (sent by the strategy), a hosted link, or an
//! error description.

use std::sync::Arc;

use crate::core::validation::validate_source_url;
use crate::download::artifact::{remove_artifact, MediaArtifact};
use crate::download::budget::DeliveryConfig;
use crate::download::delivery::{DeliveryOutcome, DeliveryStrategy};
use crate::download::error::DeliveryError;
use crate::download::fetch::{MediaFetcher, YtDlpFetcher};
use crate::download::send::ChatTransport;
use crate::download::transcode::Transcoder;
use crate::download::upload::ObjectStoreUploader;

pub const STATUS_DOWNLOADING: &str = "Downloading the video, please wait...";

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct DownloadPipeline {
    fetcher: Arc<dyn MediaFetcher>,
    strategy: DeliveryStrategy,
}

impl DownloadPipeline {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, strategy: DeliveryStrategy) -> Self {
        Self { fetcher, strategy }
    }

    /// yt-dlp, ffprobe/ffmpeg and the configured file host.
    pub fn from_env() -> Result<Self, DeliveryError> {
        let config = DeliveryConfig::from_env();
        let strategy = DeliveryStrategy::new(
            Arc::new(Transcoder::ffmpeg(config.transcode)),
            Arc::new(ObjectStoreUploader::from_env()?),
            config,
        );
        Ok(Self::new(Arc::new(YtDlpFetcher::default()), strategy))
    }

    /// Runs one request start to finish. Steps are strictly sequential.
    pub async fn handle_download_request(&self, transport: &dyn ChatTransport, url: &str) -> DeliveryOutcome {
        let outcome = self.fetch_and_deliver(transport, url).await;

        if let Some(text) = terminal_message(&outcome) {
            if let Err(e) = transport.send_text(&text).await {
                log::error!("Failed to send final message for {}: {}", url, e);
            }
        }

        match &outcome {
            DeliveryOutcome::Failed(e) => log::warn!("Request for {} failed ({}): {}", url, e.kind(), e),
            other => log::info!("Request for {} completed: {}", url, other.kind()),
        }
        outcome
    }

    async fn fetch_and_deliver(&self, transport: &dyn ChatTransport, url: &str) -> DeliveryOutcome {
        let url = match validate_source_url(url) {
            Ok(url) => url,
            Err(e) => {
                log::info!("Rejected link {:?}: {}", url, e);
                return DeliveryOutcome::Failed(DeliveryError::FetchFailed(
                    "that does not look like a video link".to_string(),
                ));
            }
        };

        if let Err(e) = transport.send_text(STATUS_DOWNLOADING).await {
            log::warn!("Failed to send status message: {}", e);
        }

        let path = match self.fetcher.fetch(&url).await {
            Ok(path) => path,
            Err(e) => return DeliveryOutcome::Failed(e),
        };

        if !MediaArtifact::new(&path).exists() {
            remove_artifact(&path);
            return DeliveryOutcome::Failed(DeliveryError::FileMissing(
                "the downloaded file disappeared before it could be sent".to_string(),
            ));
        }

        self.strategy.deliver(&path, transport).await
    }
}

/// Text that ends the conversation for a request, if the strategy has not
/// already delivered a media message.
pub fn terminal_message(outcome: &DeliveryOutcome) -> Option<String> {
    match outcome {
        DeliveryOutcome::SentDirect | DeliveryOutcome::SentCompressed => None,
        DeliveryOutcome::Hosted(url) => Some(format!("🔗 Here is your download link: {}", url)),
        DeliveryOutcome::Failed(reason) => Some(format!("❌ Sorry, {}", failure_text(reason))),
    }
}

fn failure_text(reason: &DeliveryError) -> String {
    match reason {
        DeliveryError::FetchFailed(msg) => format!("I could not download the video: {}", msg),
        DeliveryError::FileMissing(_) => "the downloaded file could not be found.".to_string(),
        DeliveryError::TransportRejected(_) => "Telegram did not accept the file.".to_string(),
        DeliveryError::UploadFailed(_) => {
            "the file is too large to send and the external file host did not return a link.".to_string()
        }
        DeliveryError::InvalidHostedUrl(_) => {
            "the file is too large to send and the external file host returned an invalid link.".to_string()
        }
        DeliveryError::ProbeUnavailable(_) | DeliveryError::EncodeInfeasible(_) | DeliveryError::EncodeFailed(_) => {
            "the file is too large to send and could not be compressed.".to_string()
        }
    }
}

//! Delivery strategy: gets a local file to the user within the transport ceiling.
//!
//! Small state machine with three tiers, tried in order:
//!
//! ```text
//! Evaluate ──fits──> DirectSend ─────────────> SentDirect | Failed
//!    │
//!    └─too big─> CompressAttempt ──ok──> CompressedSend ──> SentCompressed
//!                      │                       │
//!                      └──infeasible/failed──> HostFallback <──rejected
//!                                                  │
//!                                                  └──> Hosted(url) | Failed
//! ```
//!
//! The source file and every intermediate file are owned by the run and are
//! removed before `deliver` returns, whatever the outcome.

use std::path::Path;
use std::sync::Arc;
use url::Url;

use crate::core::utils::format_megabytes;
use crate::core::validation::validate_hosted_url;
use crate::download::artifact::{remove_artifact, ArtifactGuard, MediaArtifact};
use crate::download::budget::DeliveryConfig;
use crate::download::error::DeliveryError;
use crate::download::send::{send_with_fallback, ChatTransport};
use crate::download::transcode::Compressor;
use crate::download::upload::HostUploader;

pub const CAPTION_DIRECT: &str = "Done!";
pub const CAPTION_COMPRESSED: &str = "Done! The video was compressed to fit the size limit.";

/// Terminal result of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Original file sent as-is
    SentDirect,
    /// Re-encoded copy sent
    SentCompressed,
    /// Uploaded to the external host; the link still has to be shown to the user
    Hosted(Url),
    /// Every strategy failed; carries the last concrete reason
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed(_))
    }

    /// Label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryOutcome::SentDirect => "sent_direct",
            DeliveryOutcome::SentCompressed => "sent_compressed",
            DeliveryOutcome::Hosted(_) => "hosted",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
enum Stage {
    Evaluate,
    DirectSend,
    CompressAttempt { size: u64 },
    CompressedSend { compressed: MediaArtifact },
    HostFallback { reason: DeliveryError },
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Evaluate => "evaluate",
            Stage::DirectSend => "direct_send",
            Stage::CompressAttempt { .. } => "compress_attempt",
            Stage::CompressedSend { .. } => "compressed_send",
            Stage::HostFallback { .. } => "host_fallback",
        }
    }
}

#[derive(Debug)]
enum Transition {
    Next(Stage),
    Done(DeliveryOutcome),
}

/// Per-invocation state: the source file, the transport and the cleanup guard.
struct DeliveryRun<'a> {
    source: MediaArtifact,
    transport: &'a dyn ChatTransport,
    artifacts: ArtifactGuard,
}

/// Orchestrates direct send, compression and host fallback.
#[derive(Clone)]
pub struct DeliveryStrategy {
    compressor: Arc<dyn Compressor>,
    uploader: Arc<dyn HostUploader>,
    config: DeliveryConfig,
}

impl DeliveryStrategy {
    pub fn new(compressor: Arc<dyn Compressor>, uploader: Arc<dyn HostUploader>, config: DeliveryConfig) -> Self {
        Self {
            compressor,
            uploader,
            config,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Delivers `source` through `transport` and removes it afterwards.
    pub async fn deliver(&self, source: &Path, transport: &dyn ChatTransport) -> DeliveryOutcome {
        let mut run = DeliveryRun {
            source: MediaArtifact::new(source),
            transport,
            artifacts: ArtifactGuard::new(),
        };
        run.artifacts.track(source);

        let mut stage = Stage::Evaluate;
        let outcome = loop {
            let name = stage.name();
            match self.step(&mut run, stage).await {
                Transition::Next(next) => {
                    log::info!("Delivery of {}: {} -> {}", source.display(), name, next.name());
                    stage = next;
                }
                Transition::Done(outcome) => {
                    log::info!(
                        "Delivery of {} finished in {}: {}",
                        source.display(),
                        name,
                        outcome.kind()
                    );
                    break outcome;
                }
            }
        };

        run.artifacts.cleanup();
        outcome
    }

    async fn step(&self, run: &mut DeliveryRun<'_>, stage: Stage) -> Transition {
        match stage {
            Stage::Evaluate => self.evaluate(run).await,
            Stage::DirectSend => Self::direct_send(run).await,
            Stage::CompressAttempt { size } => self.compress_attempt(run, size).await,
            Stage::CompressedSend { compressed } => Self::compressed_send(run, compressed).await,
            Stage::HostFallback { reason } => self.host_fallback(run, reason).await,
        }
    }

    async fn evaluate(&self, run: &mut DeliveryRun<'_>) -> Transition {
        match run.source.size().await {
            Ok(size) if self.config.budget.fits(size) => Transition::Next(Stage::DirectSend),
            Ok(size) => Transition::Next(Stage::CompressAttempt { size }),
            Err(e) => Transition::Done(DeliveryOutcome::Failed(e)),
        }
    }

    async fn direct_send(run: &mut DeliveryRun<'_>) -> Transition {
        match send_with_fallback(run.transport, run.source.path(), CAPTION_DIRECT).await {
            Ok(_) => Transition::Done(DeliveryOutcome::SentDirect),
            Err(e) => Transition::Done(DeliveryOutcome::Failed(e)),
        }
    }

    async fn compress_attempt(&self, run: &mut DeliveryRun<'_>, size: u64) -> Transition {
        let budget = self.config.budget;
        notify(
            run.transport,
            &format!(
                "The video is {}, over the {} limit. Compressing it, this can take a while...",
                format_megabytes(size),
                format_megabytes(budget.ceiling_bytes)
            ),
        )
        .await;

        let compressed = MediaArtifact::new(run.source.compressed_path());
        run.artifacts.track(compressed.path());

        match self
            .compressor
            .compress(run.source.path(), compressed.path(), budget.compress_target())
            .await
        {
            Ok(()) => Transition::Next(Stage::CompressedSend { compressed }),
            Err(reason) => {
                log::warn!("Compression of {} failed ({}): {}", run.source.path().display(), reason.kind(), reason);
                Transition::Next(Stage::HostFallback { reason })
            }
        }
    }

    async fn compressed_send(run: &mut DeliveryRun<'_>, compressed: MediaArtifact) -> Transition {
        match send_with_fallback(run.transport, compressed.path(), CAPTION_COMPRESSED).await {
            Ok(_) => Transition::Done(DeliveryOutcome::SentCompressed),
            Err(reason) => {
                remove_artifact(compressed.path());
                Transition::Next(Stage::HostFallback { reason })
            }
        }
    }

    async fn host_fallback(&self, run: &mut DeliveryRun<'_>, reason: DeliveryError) -> Transition {
        log::info!(
            "Falling back to file host for {} after {}",
            run.source.path().display(),
            reason.kind()
        );
        notify(
            run.transport,
            "The file is too large to send here. Uploading it to an external file host...",
        )
        .await;

        let outcome = match self.uploader.upload(run.source.path()).await {
            Ok(text) => match validate_hosted_url(&text) {
                Ok(url) => DeliveryOutcome::Hosted(url),
                Err(e) => {
                    log::warn!("File host returned an unusable link {:?}: {}", text, e);
                    DeliveryOutcome::Failed(DeliveryError::InvalidHostedUrl(e.to_string()))
                }
            },
            Err(e) => DeliveryOutcome::Failed(e),
        };
        Transition::Done(outcome)
    }
}

/// Status messages are best-effort; a failed one never changes the outcome.
async fn notify(transport: &dyn ChatTransport, text: &str) {
    if let Err(e) = transport.send_text(text).await {
        log::warn!("Failed to send status message: {}", e);
    }
}

//! Re-encoding a video to fit a byte budget.
//!
//! The transcoder derives a constant-bitrate allocation from the file duration
//! and the target size, refuses allocations below the quality floor, runs the
//! encoder, and then checks the real output size. Encoder bitrate targeting is
//! approximate, so the size check is what decides success.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::core::config;
use crate::core::process::last_line;
use crate::core::utils::format_megabytes;
use crate::download::artifact::{remove_artifact, MediaArtifact};
use crate::download::budget::TranscodeSettings;
use crate::download::error::DeliveryError;
use crate::download::probe::{DurationProbe, FfprobeProbe};

/// Video/audio bitrate split for one encode. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitrateAllocation {
    pub target_bits: f64,
    pub video_bps: f64,
    pub video_kbps: u64,
    pub audio_kbps: u32,
}

impl BitrateAllocation {
    /// `video_bps = target_bytes * 8 * (1 - margin) / duration - audio_bps`.
    ///
    /// Fails with `EncodeInfeasible` for a zero or invalid duration and when
    /// the video share drops below the floor.
    pub fn compute(duration_secs: f64, target_bytes: u64, settings: &TranscodeSettings) -> Result<Self, DeliveryError> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(DeliveryError::EncodeInfeasible(format!(
                "invalid duration {}s",
                duration_secs
            )));
        }

        let target_bits = target_bytes as f64 * 8.0 * (1.0 - settings.safety_margin);
        let audio_bps = f64::from(settings.audio_bitrate_kbps) * 1000.0;
        let video_bps = target_bits / duration_secs - audio_bps;

        if video_bps < settings.video_floor_bps as f64 {
            return Err(DeliveryError::EncodeInfeasible(format!(
                "{:.0} bps left for video over {:.0}s, floor is {} bps",
                video_bps, duration_secs, settings.video_floor_bps
            )));
        }

        let video_kbps = ((video_bps / 1000.0).floor() as u64).max(settings.min_video_kbps);

        Ok(Self {
            target_bits,
            video_bps,
            video_kbps,
            audio_kbps: settings.audio_bitrate_kbps,
        })
    }
}

/// One encoder invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub video_kbps: u64,
    pub audio_kbps: u32,
}

impl EncodeJob {
    /// ffmpeg arguments: CBR-style x264 (target = max rate, buffer 2x target),
    /// fixed-bitrate AAC, and a fast-start layout so playback can begin early.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let video = format!("{}k", self.video_kbps);
        let bufsize = format!("{}k", self.video_kbps * 2);
        let audio = format!("{}k", self.audio_kbps);

        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(
            [
                "-c:v",
                "libx264",
                "-preset",
                "fast",
                "-b:v",
                video.as_str(),
                "-maxrate",
                video.as_str(),
                "-bufsize",
                bufsize.as_str(),
                "-c:a",
                "aac",
                "-b:a",
                audio.as_str(),
                "-movflags",
                "+faststart",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Runs an external encoder for a prepared job.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> Result<(), DeliveryError>;
}

/// `Encoder` backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    bin: String,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(config::FFMPEG_BIN.as_str())
    }
}

impl FfmpegEncoder {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodeJob) -> Result<(), DeliveryError> {
        let output = Command::new(&self.bin)
            .args(job.ffmpeg_args())
            .output()
            .await
            .map_err(|e| DeliveryError::EncodeFailed(format!("failed to start {}: {}", self.bin, e)))?;

        if !output.status.success() {
            let stderr = last_line(&output.stderr);
            log::error!("FFmpeg compression error: {}", stderr);
            return Err(DeliveryError::EncodeFailed(format!("ffmpeg exited with {}", output.status)));
        }

        Ok(())
    }
}

/// Produces a copy of `input` at `output` no larger than `target_bytes`.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// On any error `output` is absent afterwards.
    async fn compress(&self, input: &Path, output: &Path, target_bytes: u64) -> Result<(), DeliveryError>;
}

/// Budget-driven transcoder over a duration probe and an encoder.
pub struct Transcoder<P = FfprobeProbe, E = FfmpegEncoder> {
    probe: P,
    encoder: E,
    settings: TranscodeSettings,
}

impl Transcoder {
    /// ffprobe + ffmpeg from the configured binary paths.
    pub fn ffmpeg(settings: TranscodeSettings) -> Self {
        Self::new(FfprobeProbe::default(), FfmpegEncoder::default(), settings)
    }
}

impl<P: DurationProbe, E: Encoder> Transcoder<P, E> {
    pub fn new(probe: P, encoder: E, settings: TranscodeSettings) -> Self {
        Self {
            probe,
            encoder,
            settings,
        }
    }

    /// Probes the input and computes the allocation without encoding.
    pub async fn plan(&self, input: &Path, target_bytes: u64) -> Result<BitrateAllocation, DeliveryError> {
        let duration = self.probe.duration(input).await.ok_or_else(|| {
            DeliveryError::EncodeInfeasible(format!("duration unavailable for {}", input.display()))
        })?;
        BitrateAllocation::compute(duration, target_bytes, &self.settings)
    }
}

#[async_trait]
impl<P: DurationProbe, E: Encoder> Compressor for Transcoder<P, E> {
    async fn compress(&self, input: &Path, output: &Path, target_bytes: u64) -> Result<(), DeliveryError> {
        let allocation = self.plan(input, target_bytes).await?;

        log::info!(
            "Compressing {} to {} (target {}): video {}k, audio {}k",
            input.display(),
            output.display(),
            format_megabytes(target_bytes),
            allocation.video_kbps,
            allocation.audio_kbps
        );

        let job = EncodeJob {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            video_kbps: allocation.video_kbps,
            audio_kbps: allocation.audio_kbps,
        };

        if let Err(e) = self.encoder.encode(&job).await {
            remove_artifact(output);
            return Err(e);
        }

        let artifact = MediaArtifact::new(output);
        match artifact.size().await {
            Ok(size) if size <= target_bytes => {
                log::info!("Compressed {} to {}", input.display(), format_megabytes(size));
                Ok(())
            }
            Ok(size) => {
                remove_artifact(output);
                Err(DeliveryError::EncodeFailed(format!(
                    "output is {} over a {} target",
                    format_megabytes(size),
                    format_megabytes(target_bytes)
                )))
            }
            Err(_) => Err(DeliveryError::EncodeFailed(
                "encoder finished without writing an output file".to_string(),
            )),
        }
    }
}

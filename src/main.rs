use anyhow::Result;
use dotenvy::dotenv;
use std::path::Path;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use tubedrop::cli::{Cli, Commands};
use tubedrop::core::utils::format_megabytes;
use tubedrop::core::validation::validate_hosted_url;
use tubedrop::core::{config, init_logger, log_delivery_configuration};
use tubedrop::download::probe::{require_duration, FfprobeProbe};
use tubedrop::download::transcode::{Compressor, Transcoder};
use tubedrop::download::upload::{HostUploader, ObjectStoreUploader};
use tubedrop::download::{DeliveryConfig, DownloadPipeline};
use tubedrop::telegram::{create_bot, schema, setup_bot_commands, State};

const MIB: u64 = 1024 * 1024;

/// Main entry point
///
/// Parses CLI arguments and dispatches to the subcommand; without one the bot runs.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation) or a CLI command fails.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Dispatcher handlers run on spawned tasks; log panics instead of losing them
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Probe { path }) => run_probe(&path).await,
        Some(Commands::Compress {
            input,
            output,
            target_mb,
        }) => run_compress(&input, &output, target_mb).await,
        Some(Commands::Upload { path }) => run_upload(&path).await,
    }
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_delivery_configuration();

    let bot = create_bot()?;

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}. Continuing anyway.", e);
    }

    let pipeline = DownloadPipeline::from_env().map_err(|e| anyhow::anyhow!("Failed to build pipeline: {}", e))?;

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![InMemStorage::<State>::new(), pipeline])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Bot stopped");
    Ok(())
}

async fn run_probe(path: &Path) -> Result<()> {
    let seconds = require_duration(&FfprobeProbe::default(), path).await?;
    println!("{:.3}", seconds);
    Ok(())
}

async fn run_compress(input: &Path, output: &Path, target_mb: u64) -> Result<()> {
    let target_bytes = target_mb
        .checked_mul(MIB)
        .filter(|bytes| *bytes > 0)
        .ok_or_else(|| anyhow::anyhow!("--target-mb must be between 1 and {}", u64::MAX / MIB))?;
    let transcoder = Transcoder::ffmpeg(DeliveryConfig::from_env().transcode);

    let allocation = transcoder.plan(input, target_bytes).await?;
    log::info!(
        "Compressing {} to {} (video {} kbps, audio {} kbps)",
        input.display(),
        format_megabytes(target_bytes),
        allocation.video_kbps,
        allocation.audio_kbps
    );

    transcoder.compress(input, output, target_bytes).await?;

    let size = fs_err::tokio::metadata(output).await?.len();
    println!("{} ({})", output.display(), format_megabytes(size));
    Ok(())
}

async fn run_upload(path: &Path) -> Result<()> {
    let uploader = ObjectStoreUploader::from_env()?;
    let body = uploader.upload(path).await?;
    let url = validate_hosted_url(&body)?;
    println!("{}", url);
    Ok(())
}

//! Dispatcher schema and handlers
//!
//! Three commands and one dialogue state
//! (`AwaitingUrl`) entered by `/download` without an argument. Each accepted
//! URL is handed to its own tokio task so the dispatcher keeps serving other
//! chats while a video is fetched, compressed or uploaded.

use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use crate::download::pipeline::DownloadPipeline;
use crate::telegram::bot::Command;
use crate::telegram::transport::TelegramTransport;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

/// Per-chat conversation state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    AwaitingUrl,
}

pub type DownloadDialogue = Dialogue<State, InMemStorage<State>>;

pub const WELCOME_TEXT: &str =
    "Welcome! Send /download and a video link, and I will send the video back to you. Use /help to see all commands.";
pub const ASK_URL_TEXT: &str = "Send me a link to the video:";
pub const NOT_TEXT_TEXT: &str = "Please send the link as a text message.";

/// Creates the dispatcher schema.
///
/// Expects `InMemStorage<State>` and a `DownloadPipeline` among the
/// dispatcher dependencies.
pub fn schema() -> UpdateHandler<HandlerError> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start_command))
        .branch(case![Command::Help].endpoint(help_command))
        .branch(case![Command::Download(arg)].endpoint(download_command));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![State::AwaitingUrl].endpoint(receive_url))
        .branch(dptree::endpoint(unrecognized_message));

    dialogue::enter::<Update, InMemStorage<State>, State, _>().branch(message_handler)
}

async fn start_command(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, WELCOME_TEXT).await?;
    Ok(())
}

async fn help_command(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
    Ok(())
}

async fn download_command(
    bot: Bot,
    dialogue: DownloadDialogue,
    msg: Message,
    arg: String,
    pipeline: DownloadPipeline,
) -> HandlerResult {
    let url = arg.trim();
    if url.is_empty() {
        bot.send_message(msg.chat.id, ASK_URL_TEXT).await?;
        dialogue.update(State::AwaitingUrl).await?;
        return Ok(());
    }

    dialogue.exit().await?;
    spawn_download(bot, msg.chat.id, pipeline, url.to_string());
    Ok(())
}

async fn receive_url(bot: Bot, dialogue: DownloadDialogue, msg: Message, pipeline: DownloadPipeline) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, NOT_TEXT_TEXT).await?;
        return Ok(());
    };

    dialogue.exit().await?;
    spawn_download(bot, msg.chat.id, pipeline, text.to_string());
    Ok(())
}

async fn unrecognized_message(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Use /download to send me a video link, or /help for all commands.")
        .await?;
    Ok(())
}

/// Runs the pipeline for one request on its own task.
fn spawn_download(bot: Bot, chat_id: ChatId, pipeline: DownloadPipeline, url: String) {
    log::info!("Accepted download request from chat {}: {}", chat_id, url);
    tokio::spawn(async move {
        let transport = TelegramTransport::new(bot, chat_id);
        let outcome = pipeline.handle_download_request(&transport, &url).await;
        log::info!("Download request from chat {} ended: {}", chat_id, outcome.kind());
    });
}

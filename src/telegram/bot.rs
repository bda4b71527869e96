//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command registration in the Telegram UI

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show this help message")]
    Help,
    #[command(description = "download a video by its link: /download <url>")]
    Download(String),
}

/// Creates a Bot instance with a client timeout long enough for video uploads
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Token missing or HTTP client could not be built
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN environment variable not set");
    }

    let client = reqwest::Client::builder().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(token, client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_with_url() {
        let cmd = Command::parse("/download https://youtu.be/dQw4w9WgXcQ", "tubedrop_bot").unwrap();
        assert_eq!(cmd, Command::Download("https://youtu.be/dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_parse_download_without_url() {
        let cmd = Command::parse("/download", "tubedrop_bot").unwrap();
        assert_eq!(cmd, Command::Download(String::new()));
    }

    #[test]
    fn test_parse_start_and_help() {
        assert_eq!(Command::parse("/start", "tubedrop_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "tubedrop_bot").unwrap(), Command::Help);
        assert!(Command::parse("/files", "tubedrop_bot").is_err());
    }

    #[test]
    fn test_help_text_lists_commands() {
        let help = Command::descriptions().to_string();
        assert!(help.contains("/start"));
        assert!(help.contains("/download"));
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tubedrop")]
#[command(author, version, about = "Telegram bot that downloads videos and delivers them within the size limit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the bot (default when no command is given)
    Run,

    /// Print the duration of a local media file
    Probe {
        /// Media file to inspect
        path: PathBuf,
    },

    /// Re-encode a file to fit a size budget, as the bot does for large videos
    Compress {
        /// Source video
        input: PathBuf,

        /// Where to write the re-encoded video
        output: PathBuf,

        /// Target size in megabytes (MiB)
        #[arg(short, long, default_value_t = 49)]
        target_mb: u64,
    },

    /// Upload a file to the configured file host and print the link
    Upload {
        /// File to upload (kept on disk)
        path: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_defaults_to_none() {
        let cli = Cli::try_parse_from(["tubedrop"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_compress_default_target() {
        let cli = Cli::try_parse_from(["tubedrop", "compress", "in.mp4", "out.mp4"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Compress {
                input: PathBuf::from("in.mp4"),
                output: PathBuf::from("out.mp4"),
                target_mb: 49,
            })
        );
    }

    #[test]
    fn test_compress_custom_target() {
        let cli = Cli::try_parse_from(["tubedrop", "compress", "in.mp4", "out.mp4", "--target-mb", "8"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Compress { target_mb: 8, .. })));
    }

    #[test]
    fn test_probe_requires_path() {
        assert!(Cli::try_parse_from(["tubedrop", "probe"]).is_err());
    }
}

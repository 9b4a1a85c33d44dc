// src/cli/mod.rs — CLI definition (clap derive)

pub mod report;
pub mod run;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taxres",
    about = "Telegram bot for the 183-day tax residency rule",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the Telegram bot (default)
    Run,
    /// Print the residency report for a periods JSON file
    Report {
        /// Path to a JSON file in the upload format
        file: String,
        /// Calculation date (DD.MM.YYYY); overrides "current" from the file
        #[arg(long)]
        date: Option<String>,
    },
    /// Check that the bot token is present and accepted by Telegram
    CheckToken,
    /// Show config, storage location and stored users
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::parse_from(["taxres"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_report_args() {
        let cli = Cli::parse_from(["taxres", "--config", "c.toml", "report", "trips.json", "--date", "31.12.2023"]);
        assert_eq!(cli.config.as_deref(), Some("c.toml"));
        assert_eq!(
            cli.command,
            Some(Commands::Report {
                file: "trips.json".into(),
                date: Some("31.12.2023".into()),
            })
        );
    }

    #[test]
    fn test_check_token() {
        let cli = Cli::parse_from(["taxres", "check-token"]);
        assert_eq!(cli.command, Some(Commands::CheckToken));
    }
}

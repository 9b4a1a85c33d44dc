// src/main.rs — taxres entry point

use clap::Parser;

use taxres::cli::{self, Cli, Commands};
use taxres::infra::config::Config;
use taxres::infra::errors::TaxResError;
use taxres::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Config first so its log level applies; RUST_LOG still wins.
    let config = match &cli.config {
        Some(path) => Config::load_from(std::path::Path::new(path)),
        None => Config::load(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            logger::init_logging("info");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    logger::init_logging(&config.logging.level);

    if let Err(e) = run(cli, config).await {
        eprintln!("error: {e}");
        if e
            .downcast_ref::<TaxResError>()
            .is_some_and(TaxResError::is_fatal_at_startup)
        {
            eprintln!("hint: `taxres status` shows where the config and token are looked up");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run::run_bot(&config).await,
        Commands::Report { file, date } => {
            let text = cli::report::run_report(std::path::Path::new(&file), date.as_deref())?;
            println!("{text}");
            Ok(())
        }
        Commands::CheckToken => cli::run::check_token(&config).await,
        Commands::Status => cli::status::show_status(&config),
    }
}

// src/cli/status.rs — Installation status display

use std::path::Path;

use crate::infra::config::Config;
use crate::infra::paths;
use crate::integrations::credentials::{BotCredentials, TOKEN_ENV};

/// Number of per-user session directories under `root`.
pub fn count_users(root: &Path) -> usize {
    std::fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_dir())
                .filter(|e| e.file_name().to_string_lossy().parse::<i64>().is_ok())
                .count()
        })
        .unwrap_or(0)
}

pub fn show_status(config: &Config) -> anyhow::Result<()> {
    println!("taxres v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config_path = paths::config_file_path();
    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }

    let data_dir = config.data_dir();
    println!(
        "  Data:       {} ({} users)",
        data_dir.display(),
        count_users(&data_dir)
    );

    match BotCredentials::load(Path::new(&config.telegram.token_file)) {
        Ok(creds) => println!("  Token:      found ({:?})", creds.source),
        Err(_) => println!(
            "  Token:      missing (set {TOKEN_ENV} or {})",
            config.telegram.token_file
        ),
    }
    println!("  Log level:  {}", config.logging.level);
    Ok(())
}

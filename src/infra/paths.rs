// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the TAXRES_HOME environment variable for isolation.
// When TAXRES_HOME is set, config and data live under that directory.
// When unset, config uses ~/.taxres/ and data uses XDG_DATA_HOME/taxres.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the TAXRES_HOME override, if set.
fn taxres_home() -> Option<PathBuf> {
    std::env::var_os("TAXRES_HOME").map(PathBuf::from)
}

/// Configuration directory: $TAXRES_HOME/ or ~/.taxres/
pub fn config_dir() -> PathBuf {
    if let Some(home) = taxres_home() {
        return home;
    }
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(".taxres"),
        None => PathBuf::from("."),
    }
}

/// Data directory: $TAXRES_HOME/data/ or ~/.local/share/taxres/.
/// Falls back to ./data when no home directory can be determined
/// (minimal containers).
pub fn data_dir() -> PathBuf {
    if let Some(home) = taxres_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "taxres")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Per-user session directories live here.
pub fn users_dir() -> PathBuf {
    data_dir().join("users")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

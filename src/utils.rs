//! Utility functions for directory management and artifact naming
//!
//! Configuration follows the XDG Base Directory specification:
//!
//! - User config: `~/.config/flowgen/config.json`
//! - System config: path baked in at build time via `FLOWGEN_SYSTEM_CONFIG`
//!
//! # Example
//!
//! ```
//! use flowgen::utils::artifact_stem;
//! use std::path::Path;
//!
//! assert_eq!(artifact_stem(Path::new("conf/test_rules.click")), "test_rules");
//! ```

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "flowgen", "flowgen").map(|pd| pd.config_dir().to_path_buf())
}

/// Default user config file, whether or not it exists.
pub fn user_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.json"))
}

/// System-wide config file chosen by the packager, if any.
pub fn system_config_path() -> Option<PathBuf> {
    option_env!("FLOWGEN_SYSTEM_CONFIG").map(PathBuf::from)
}

/// Stem used to name every artifact produced from `input`: the file name up
/// to its first `.`. Names whose only dot is leading (`.rules`) are kept whole.
pub fn artifact_stem(input: &Path) -> String {
    let name = input
        .file_name()
        .map_or_else(|| input.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned();
    match name.rfind('.') {
        Some(idx) if idx > 1 => name.split('.').next().unwrap_or(&name).to_string(),
        _ => name,
    }
}

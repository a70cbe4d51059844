//! Default locations for working data and configuration

use std::path::{Path, PathBuf};

/// Name of the config file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "hlspack.toml";

/// Path helpers
pub struct PathUtils;

impl PathUtils {
    /// Root under which job working directories are created
    pub fn default_work_root() -> PathBuf {
        std::env::temp_dir().join("hlspack")
    }

    /// Config file used when none is given explicitly, if it exists
    pub fn default_config_path() -> Option<PathBuf> {
        let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Final path component as UTF-8, for log and report output
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

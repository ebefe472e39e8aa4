//! Platform-specific directory utilities

use std::path::PathBuf;

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/save-system/logs`
/// - Linux: `~/.cache/save-system/logs` (or `$XDG_CACHE_HOME/save-system/logs`)
/// - Windows: `%LOCALAPPDATA%\save-system\logs`
/// - Fallback: `/tmp/save-system/logs`
pub fn log_dir() -> PathBuf {
    let base_dir = directories::ProjectDirs::from("", "", "save-system")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/save-system"));

    base_dir.join("logs")
}

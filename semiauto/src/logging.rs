use semiauto_core::config::APP_NAME;
use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "semiauto.log";

/// Rotated log files are capped at this many megabytes.
const LOG_FILE_MAX_MB: u64 = 10;
const LOG_FILES_KEPT: u32 = 10;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Directory the log file lives in. An empty `XDG_CACHE_HOME` counts as unset.
pub fn cache_dir() -> PathBuf {
    let xdg = std::env::var_os("XDG_CACHE_HOME").map(PathBuf::from);
    resolve_cache_dir(xdg.as_deref(), dirs::home_dir().as_deref())
}

fn resolve_cache_dir(xdg_cache_home: Option<&Path>, home: Option<&Path>) -> PathBuf {
    let base = match xdg_cache_home {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ if cfg!(windows) => dirs::cache_dir().unwrap_or_else(std::env::temp_dir),
        _ => home.map_or_else(std::env::temp_dir, |home| home.join(".cache")),
    };
    base.join(APP_NAME)
}

pub fn default_log_file() -> PathBuf {
    cache_dir().join(LOG_FILE_NAME)
}

/// Route `log` records into a rotating file under the cache directory.
/// The terminal belongs to the TUI, so nothing is written to stderr.
pub fn setup_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    let log_file = default_log_file();
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    simple_log::file(
        log_file.to_string_lossy().into_owned(),
        level,
        LOG_FILE_MAX_MB,
        LOG_FILES_KEPT,
    )
    .map_err(|e| anyhow::anyhow!(e))?;
    log::info!("{APP_NAME} {} logging at {level}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_prefers_xdg_cache_home() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom-cache");
        let result = resolve_cache_dir(Some(&custom), Some(Path::new("/home/operator")));
        assert_eq!(result, custom.join(APP_NAME));
    }

    #[cfg(unix)]
    #[test]
    fn cache_dir_ignores_empty_xdg() {
        let result = resolve_cache_dir(Some(Path::new("")), Some(Path::new("/home/operator")));
        assert_eq!(result, PathBuf::from("/home/operator/.cache/semiauto"));
    }

    #[cfg(unix)]
    #[test]
    fn cache_dir_without_home_falls_back_to_temp() {
        let result = resolve_cache_dir(None, None);
        assert_eq!(result, std::env::temp_dir().join(APP_NAME));
    }

    #[test]
    fn default_log_file_ends_with_log_filename() {
        let path = default_log_file();
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
        assert!(path.parent().unwrap().ends_with(APP_NAME));
    }
}

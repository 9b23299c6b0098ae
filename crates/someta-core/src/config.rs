//! Runtime configuration and data directory management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default chat endpoint: the companion API's message route on its dev port.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/chat";

/// Upstream API rejects request bodies above 16 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_INJECT_DELAY_MS: u64 = 100;

/// Paths to Someta data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Persisted widget settings (`data/settings.json`).
    pub settings_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            settings_file: root.join("settings.json"),
            root,
        })
    }
}

/// Top-level Someta configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SometaConfig {
    /// Local HTTP API port.
    pub port: u16,
    /// Chat endpoint that receives `{message, screenshot}`.
    pub backend_url: String,
    /// Chrome DevTools HTTP endpoint (e.g. `http://127.0.0.1:9222`).
    pub cdp_url: Option<String>,
    /// Upper bound on how long a relay caller waits for its reply.
    pub relay_timeout: Duration,
    /// Delay between injecting a page context and re-sending activation.
    pub inject_delay: Duration,
    /// Largest screenshot payload forwarded to the backend.
    pub max_body_bytes: usize,
    pub data_paths: DataPaths,
}

impl SometaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_parse("PORT").unwrap_or(3003);
        let backend_url = std::env::var("SOMETA_BACKEND_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let cdp_url = std::env::var("SOMETA_CDP_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());
        let relay_timeout = Duration::from_secs(
            env_parse("SOMETA_RELAY_TIMEOUT_SECS").unwrap_or(DEFAULT_RELAY_TIMEOUT_SECS),
        );
        let inject_delay = Duration::from_millis(
            env_parse("SOMETA_INJECT_DELAY_MS").unwrap_or(DEFAULT_INJECT_DELAY_MS),
        );

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            backend_url,
            cdp_url,
            relay_timeout,
            inject_delay,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            data_paths,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        let paths = DataPaths::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(paths.settings_file, root.join("settings.json"));
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("SOMETA_TEST_PARSE_GARBAGE", "not-a-number");
        assert_eq!(env_parse::<u64>("SOMETA_TEST_PARSE_GARBAGE"), None);
        std::env::set_var("SOMETA_TEST_PARSE_OK", " 42 ");
        assert_eq!(env_parse::<u64>("SOMETA_TEST_PARSE_OK"), Some(42));
    }
}

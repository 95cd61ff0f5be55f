use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::request::DEFAULT_MAX_PART_BYTES;

/// libcurl options (optional `[transport]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time_secs`. 0 disables.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    /// Maximum redirects followed per request.
    pub max_redirections: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 30,
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// Frame reader parameters (optional `[reader]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Frames queued for the consumer before new ones are dropped.
    pub queue_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { queue_depth: 4 }
    }
}

/// Global configuration loaded from `~/.config/mxget/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxConfig {
    /// Largest part (or single-shot body) buffered before the call fails.
    #[serde(default = "default_max_part_bytes")]
    pub max_part_bytes: usize,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
}

impl MxConfig {
    /// Pretty TOML, as written by [`load_or_init`].
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }
}

fn default_max_part_bytes() -> usize {
    DEFAULT_MAX_PART_BYTES
}

impl Default for MxConfig {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            transport: TransportConfig::default(),
            reader: ReaderConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mxget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MxConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<MxConfig> {
    if !path.exists() {
        let default_cfg = MxConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: MxConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MxConfig::default();
        assert_eq!(cfg.max_part_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.transport.connect_timeout_secs, 15);
        assert_eq!(cfg.transport.max_redirections, 10);
        assert_eq!(cfg.reader.queue_depth, 4);
        assert!(cfg.transport.user_agent.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MxConfig::default();
        let toml = cfg.to_toml().unwrap();
        let parsed: MxConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_sections() {
        let toml = r#"
            max_part_bytes = 1048576

            [transport]
            connect_timeout_secs = 5
            user_agent = "cam-poller/1.0"
        "#;
        let cfg: MxConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_part_bytes, 1_048_576);
        assert_eq!(cfg.transport.connect_timeout_secs, 5);
        assert_eq!(cfg.transport.low_speed_limit_bytes, 1024);
        assert_eq!(cfg.transport.user_agent.as_deref(), Some("cam-poller/1.0"));
        assert_eq!(cfg.reader, ReaderConfig::default());
    }

    #[test]
    fn config_toml_empty_is_default() {
        let cfg: MxConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, MxConfig::default());
    }

    #[test]
    fn load_or_init_at_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, MxConfig::default());

        fs::write(&path, "max_part_bytes = 2048\n[reader]\nqueue_depth = 1\n").unwrap();
        let loaded = load_or_init_at(&path).unwrap();
        assert_eq!(loaded.max_part_bytes, 2048);
        assert_eq!(loaded.reader.queue_depth, 1);
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_part_bytes = \"lots\"").unwrap();
        assert!(load_or_init_at(&path).is_err());
    }
}

//! Configuration management for tocmend.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cleaner;
use crate::field::TocFieldConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preferred configuration for the synthesized field.
    pub toc: TocFieldConfig,
    pub cleanup: CleanupConfig,
    pub server: ServerConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Leading-empty-paragraph ceiling for the pre-anchor cleanup pass. The
    /// larger bound absorbs blank paragraphs accumulated document-wide.
    pub pre_anchor_collapse_limit: usize,
    /// Smaller ceiling for the pass after TOC insertion.
    pub post_insert_collapse_limit: usize,
    /// Prefix scanned when the document has no anchor paragraph.
    pub no_anchor_scan_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Where request/response artifacts are written (and swept from).
    pub downloads_dir: PathBuf,
    /// Engine scratch root; reset at startup.
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Artifacts older than this are deleted by the background sweep.
    pub max_age_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toc: TocFieldConfig::preferred(),
            cleanup: CleanupConfig::default(),
            server: ServerConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            pre_anchor_collapse_limit: 50,
            post_insert_collapse_limit: 10,
            no_anchor_scan_chars: cleaner::NO_ANCHOR_SCAN_CHARS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
            downloads_dir: PathBuf::from("downloads"),
            scratch_dir: PathBuf::from("scratch"),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tocmend")
            .map(|proj_dirs| proj_dirs.config_dir().join("tocmend.toml"))
    }

    /// Load configuration from file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from a specific path (for testing)
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.toc, TocFieldConfig::preferred());
        assert_eq!(config.cleanup.pre_anchor_collapse_limit, 50);
        assert_eq!(config.cleanup.post_insert_collapse_limit, 10);
        assert_eq!(config.cleanup.no_anchor_scan_chars, 2000);
        assert_eq!(config.server.addr, "0.0.0.0:5000");
        assert_eq!(config.retention.max_age_secs, 300);
        assert_eq!(config.retention.sweep_interval_secs, 60);
    }

    #[test]
    fn test_load_missing_config() -> Result<()> {
        // Loading should return defaults when no file exists
        let config = Config::load()?;
        assert_eq!(config.cleanup.pre_anchor_collapse_limit, 50);
        Ok(())
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(
            b"[toc]\n\
min_level = 2\n\
max_level = 4\n\
show_page_numbers = false\n\
right_align_page_numbers = false\n\
\n\
[cleanup]\n\
pre_anchor_collapse_limit = 20\n\
post_insert_collapse_limit = 5\n\
no_anchor_scan_chars = 1000\n\
\n\
[server]\n\
addr = \"127.0.0.1:8080\"\n\
downloads_dir = \"/tmp/dl\"\n\
scratch_dir = \"/tmp/scratch\"\n\
\n\
[retention]\n\
max_age_secs = 120\n\
sweep_interval_secs = 30\n",
        )?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.toc.min_level, 2);
        assert_eq!(config.toc.max_level, 4);
        assert!(!config.toc.show_page_numbers);
        assert_eq!(config.cleanup.pre_anchor_collapse_limit, 20);
        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert_eq!(config.retention.max_age_secs, 120);

        Ok(())
    }

    #[test]
    fn test_load_partial_toml_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[cleanup]\nno_anchor_scan_chars = 512\n")?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.cleanup.no_anchor_scan_chars, 512);
        assert_eq!(config.cleanup.pre_anchor_collapse_limit, 50);
        assert_eq!(config.toc, TocFieldConfig::preferred());

        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml [[[syntax").unwrap();

        let result = Config::load_from(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        assert!(path.is_some());
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("tocmend"));
            assert!(p.to_string_lossy().ends_with("tocmend.toml"));
        }
    }

    #[test]
    fn test_round_trip_serialization() -> Result<()> {
        let config = Config::default();
        let toml_str = toml::to_string(&config)?;
        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed.toc, config.toc);
        assert_eq!(
            parsed.cleanup.no_anchor_scan_chars,
            config.cleanup.no_anchor_scan_chars
        );
        Ok(())
    }
}

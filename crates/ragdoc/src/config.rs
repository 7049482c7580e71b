//! Configuration handling for ragdoc.
//!
//! Settings come from a TOML file (explicit `--config` path or the platform
//! config directory), then `RAGDOC_*` environment variables override
//! individual values. A missing default config file means defaults.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use ragdoc_chunker::DEFAULT_ENCODING;
use ragdoc_core::{ChunkingConfig, ConfigError};
use ragdoc_index::IngestConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingSettings,

    /// Ingestion configuration
    #[serde(default)]
    pub ingest: IngestSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chunking-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    /// Target chunk size (tokens)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap carried into the next chunk (tokens)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Smallest trailing chunk kept (tokens)
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Hard ceiling per chunk (tokens)
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Tokenizer encoding name
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_chunk_size() -> usize {
    ChunkingConfig::default().chunk_size
}

fn default_chunk_overlap() -> usize {
    ChunkingConfig::default().chunk_overlap
}

fn default_min_chunk_size() -> usize {
    ChunkingConfig::default().min_chunk_size
}

fn default_max_chunk_size() -> usize {
    ChunkingConfig::default().max_chunk_size
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            encoding: default_encoding(),
        }
    }
}

impl ChunkingSettings {
    /// The validated-at-construction chunking parameters.
    #[must_use]
    pub fn chunking_config(&self) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            min_chunk_size: self.min_chunk_size,
            max_chunk_size: self.max_chunk_size,
        }
    }
}

/// Ingestion-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Corpus directory used when none is given on the command line
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// JSON Lines file receiving the chunk records
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Documents processed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-document time budget (seconds)
    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,

    /// Chunks per store upsert
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("documents")
}

fn default_output() -> PathBuf {
    PathBuf::from("chunks.jsonl")
}

fn default_concurrency() -> usize {
    4
}

fn default_document_timeout_secs() -> u64 {
    120
}

fn default_upsert_batch_size() -> usize {
    100
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            output: default_output(),
            concurrency: default_concurrency(),
            document_timeout_secs: default_document_timeout_secs(),
            upsert_batch_size: default_upsert_batch_size(),
        }
    }
}

impl IngestSettings {
    /// Driver configuration for a run.
    #[must_use]
    pub fn ingest_config(&self, clean: bool) -> IngestConfig {
        IngestConfig {
            concurrency: self.concurrency.max(1),
            document_timeout: Duration::from_secs(self.document_timeout_secs),
            upsert_batch_size: self.upsert_batch_size.max(1),
            clean,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level.
    pub fn tracing_level(&self) -> Result<Level> {
        Level::from_str(self.level.trim())
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", self.level))
    }
}

/// Sample configuration printed by `ragdoc config init`.
const SAMPLE_CONFIG: &str = r#"# ragdoc configuration

[chunking]
# Target chunk size in tokens (1..=8000)
chunk_size = 1000
# Tokens of the previous chunk repeated at the start of the next
chunk_overlap = 200
# Trailing chunks smaller than this are dropped (tokens)
min_chunk_size = 100
# No chunk ever exceeds this many tokens
max_chunk_size = 2000
# cl100k_base, o200k_base, p50k_base or r50k_base
encoding = "cl100k_base"

[ingest]
corpus_path = "documents"
output = "chunks.jsonl"
concurrency = 4
document_timeout_secs = 120
upsert_batch_size = 100

[logging]
level = "info"
"#;

impl Config {
    /// Load from the default config path, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default config path when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    /// Environment overrides are applied afterwards.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply `RAGDOC_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chunking = &mut self.chunking;
        override_parsed(&lookup, "RAGDOC_CHUNK_SIZE", &mut chunking.chunk_size)?;
        override_parsed(&lookup, "RAGDOC_CHUNK_OVERLAP", &mut chunking.chunk_overlap)?;
        override_parsed(&lookup, "RAGDOC_MIN_CHUNK_SIZE", &mut chunking.min_chunk_size)?;
        override_parsed(&lookup, "RAGDOC_MAX_CHUNK_SIZE", &mut chunking.max_chunk_size)?;
        if let Some(encoding) = lookup("RAGDOC_ENCODING") {
            chunking.encoding = encoding;
        }
        if let Some(corpus) = lookup("RAGDOC_CORPUS_PATH") {
            self.ingest.corpus_path = PathBuf::from(corpus);
        }
        if let Some(level) = lookup("RAGDOC_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Config file location.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Annotated sample configuration.
    #[must_use]
    pub fn sample_toml() -> &'static str {
        SAMPLE_CONFIG
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidSetting {
                key: key.to_string(),
                reason: format!("{raw:?}: {e}"),
            })?;
    }
    Ok(())
}

/// Get the config directory for ragdoc.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RAGDOC_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "ragdoc").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Reject a configuration that cannot drive a run.
pub fn check(config: &Config) -> Result<()> {
    config.chunking.chunking_config().validate()?;
    config.logging.tracing_level()?;
    if config.ingest.document_timeout_secs == 0 {
        bail!("ingest.document_timeout_secs must be greater than 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_chunking_defaults() {
        let config = Config::default();
        assert_eq!(config.chunking.chunking_config(), ChunkingConfig::default());
        assert_eq!(config.chunking.encoding, "cl100k_base");
        assert_eq!(config.logging.level, "info");
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_sample_parses_to_defaults() {
        let parsed: Config = toml::from_str(Config::sample_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 256\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 256);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.ingest, IngestSettings::default());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load_from(Some(dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking\nchunk_size = ").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("RAGDOC_CHUNK_SIZE", "512"),
                ("RAGDOC_CHUNK_OVERLAP", " 64 "),
                ("RAGDOC_MIN_CHUNK_SIZE", "32"),
                ("RAGDOC_MAX_CHUNK_SIZE", "1024"),
                ("RAGDOC_ENCODING", "o200k_base"),
                ("RAGDOC_CORPUS_PATH", "/data/docs"),
                ("RAGDOC_LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.chunking.chunk_size, 512);
        assert_eq!(config.chunking.chunk_overlap, 64);
        assert_eq!(config.chunking.min_chunk_size, 32);
        assert_eq!(config.chunking.max_chunk_size, 1024);
        assert_eq!(config.chunking.encoding, "o200k_base");
        assert_eq!(config.ingest.corpus_path, PathBuf::from("/data/docs"));
        assert_eq!(config.logging.tracing_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_env_override_not_a_number() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("RAGDOC_CHUNK_SIZE", "large")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting { ref key, .. } if key == "RAGDOC_CHUNK_SIZE"
        ));
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_check_rejects_invalid_chunking() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(check(&config).is_err());

        let mut config = Config::default();
        config.chunking.chunk_size = 9000;
        config.chunking.max_chunk_size = 10_000;
        assert!(check(&config).is_err());
    }

    #[test]
    fn test_check_rejects_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "chatty".to_string();
        assert!(check(&config).is_err());
    }

    #[test]
    fn test_ingest_config_conversion() {
        let settings = IngestSettings {
            concurrency: 0,
            document_timeout_secs: 5,
            upsert_batch_size: 0,
            ..IngestSettings::default()
        };
        let config = settings.ingest_config(true);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.upsert_batch_size, 1);
        assert_eq!(config.document_timeout, Duration::from_secs(5));
        assert!(config.clean);
    }
}

//! Workspace configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use paes_core::cache::CachedExamProvider;
use paes_core::session::SessionService;
use paes_core::traits::StoreSet;
use paes_core::{ScoringConfig, ScoringEngine};

use crate::error::StoreError;
use crate::file::FileStore;
use crate::memory::MemoryStore;

/// Which backend holds sessions, results, exams and study time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Keep everything in process memory. Nothing survives the process.
    Memory,
    /// One JSON file per record under `data_dir`.
    File {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./paes-data")
}

/// Top-level `paes.toml` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaesConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Thresholds and factors used by the scoring engine.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Max sessions finished concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// How long fetched exams are cached. 0 disables the cache.
    #[serde(default = "default_cache_ttl")]
    pub exam_cache_ttl_secs: u64,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_cache_ttl() -> u64 {
    300
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./paes-results")
}

impl Default for PaesConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            scoring: ScoringConfig::default(),
            parallelism: default_parallelism(),
            exam_cache_ttl_secs: default_cache_ttl(),
            output_dir: default_output_dir(),
        }
    }
}

impl PaesConfig {
    /// Reject settings no backend can work with.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.parallelism == 0 {
            return Err(StoreError::Config("parallelism must be at least 1".into()));
        }
        if let StoreConfig::File { data_dir } = &self.store {
            if data_dir.as_os_str().is_empty() {
                return Err(StoreError::Config("store.data_dir is empty".into()));
            }
        }
        let scoring = &self.scoring;
        if scoring.critical_threshold > scoring.weak_threshold {
            return Err(StoreError::Config(format!(
                "scoring.critical_threshold ({}) is above scoring.weak_threshold ({})",
                scoring.critical_threshold, scoring.weak_threshold
            )));
        }
        let positive = |factor: f64| factor > 0.0 && factor.is_finite();
        if !positive(scoring.rush_factor) || !positive(scoring.slow_factor) {
            return Err(StoreError::Config(
                "scoring.rush_factor and scoring.slow_factor must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `paes.toml` in the current directory
/// 2. `~/.config/paes/config.toml`
///
/// Environment variable overrides: `PAES_DATA_DIR`, `PAES_PARALLELISM`.
pub fn load_config() -> Result<PaesConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PaesConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("paes.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            toml::from_str::<PaesConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PaesConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

/// Apply `PAES_*` overrides and expand `${VAR}` in the data directory.
fn apply_env_overrides(
    mut config: PaesConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PaesConfig {
    if let Some(dir) = lookup("PAES_DATA_DIR") {
        config.store = StoreConfig::File {
            data_dir: PathBuf::from(dir),
        };
    }

    if let Some(raw) = lookup("PAES_PARALLELISM") {
        match raw.trim().parse::<usize>() {
            Ok(n) => config.parallelism = n,
            Err(_) => tracing::warn!("ignoring invalid PAES_PARALLELISM value {raw:?}"),
        }
    }

    if let StoreConfig::File { data_dir } = &mut config.store {
        if let Some(raw) = data_dir.to_str() {
            *data_dir = PathBuf::from(resolve_env_vars(raw));
        }
    }

    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("paes"))
}

/// Build the collaborator set described by the configuration.
pub fn create_stores(config: &PaesConfig) -> Result<StoreSet> {
    config.validate()?;
    let stores = match &config.store {
        StoreConfig::Memory => StoreSet::from_backend(Arc::new(MemoryStore::new())),
        StoreConfig::File { data_dir } => {
            tracing::debug!(data_dir = %data_dir.display(), "using file store");
            StoreSet::from_backend(Arc::new(FileStore::new(data_dir)))
        }
    };

    if config.exam_cache_ttl_secs == 0 {
        return Ok(stores);
    }
    let cached = CachedExamProvider::new(
        Arc::clone(&stores.exams),
        Duration::from_secs(config.exam_cache_ttl_secs),
    );
    Ok(stores.with_exams(Arc::new(cached)))
}

/// Build a ready-to-use session service from the configuration.
pub fn create_service(config: &PaesConfig) -> Result<SessionService> {
    let stores = create_stores(config)?;
    let engine = ScoringEngine::new(config.scoring.clone());
    Ok(SessionService::new(stores, engine).with_parallelism(config.parallelism))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_PAES_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_PAES_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_PAES_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no_close_${"), "no_close_${");
        std::env::remove_var("_PAES_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = PaesConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.exam_cache_ttl_secs, 300);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
parallelism = 8
exam_cache_ttl_secs = 0
output_dir = "reports"

[store]
type = "memory"

[scoring]
weak_threshold = 70
rush_factor = 0.4
"#;
        let config: PaesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.scoring.weak_threshold, 70);
        assert_eq!(config.scoring.critical_threshold, 40);
        assert_eq!(config.scoring.rush_factor, 0.4);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn file_store_defaults_data_dir() {
        let config: PaesConfig = toml::from_str("[store]\ntype = \"file\"\n").unwrap();
        assert_eq!(
            config.store,
            StoreConfig::File {
                data_dir: PathBuf::from("./paes-data")
            }
        );
    }

    #[test]
    fn env_overrides_apply() {
        let config = apply_env_overrides(
            PaesConfig::default(),
            env(&[("PAES_DATA_DIR", "/srv/paes"), ("PAES_PARALLELISM", "2")]),
        );
        assert_eq!(
            config.store,
            StoreConfig::File {
                data_dir: PathBuf::from("/srv/paes")
            }
        );
        assert_eq!(config.parallelism, 2);
    }

    #[test]
    fn invalid_parallelism_override_is_ignored() {
        let config = apply_env_overrides(
            PaesConfig::default(),
            env(&[("PAES_PARALLELISM", "lots")]),
        );
        assert_eq!(config.parallelism, 4);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = PaesConfig {
            parallelism: 0,
            ..PaesConfig::default()
        };
        assert!(config.validate().is_err());

        config.parallelism = 1;
        config.scoring.critical_threshold = 80;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("critical_threshold"));
    }

    #[test]
    fn validate_rejects_non_finite_factors() {
        let toml_str = r#"
[scoring]
rush_factor = nan
"#;
        let config: PaesConfig = toml::from_str(toml_str).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rush_factor"));

        let mut config = PaesConfig::default();
        config.scoring.slow_factor = f64::INFINITY;
        assert!(config.validate().is_err());
        config.scoring.slow_factor = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paes.toml");
        std::fs::write(&path, "[store]\ntype = \"memory\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.exam_cache_ttl_secs, 300);
    }

    #[tokio::test]
    async fn memory_stores_share_one_backend() {
        let config = PaesConfig {
            store: StoreConfig::Memory,
            exam_cache_ttl_secs: 0,
            ..PaesConfig::default()
        };
        let stores = create_stores(&config).unwrap();
        assert!(stores.sessions.load("s1").await.unwrap().is_none());
        assert!(stores.exams.fetch("e1").await.unwrap().is_none());
    }
}

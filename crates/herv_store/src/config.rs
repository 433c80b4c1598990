use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use herv_core::validate::DEFAULT_PROBABILITY_TOLERANCE;
use herv_core::{HervError, HervResult, TextLimits};

const DEFAULT_CONFIG_NAME: &str = "herv.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_text_bytes: Option<usize>,
    pub max_sequence_bytes: Option<usize>,
}

impl LimitsConfig {
    pub fn with_defaults() -> Self {
        let defaults = TextLimits::default();
        Self {
            max_text_bytes: Some(defaults.max_text_bytes),
            max_sequence_bytes: Some(defaults.max_sequence_bytes),
        }
    }

    pub fn text_limits(&self) -> TextLimits {
        let defaults = TextLimits::default();
        TextLimits {
            max_text_bytes: self.max_text_bytes.unwrap_or(defaults.max_text_bytes),
            max_sequence_bytes: self
                .max_sequence_bytes
                .unwrap_or(defaults.max_sequence_bytes),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntegrityConfig {
    pub probability_tolerance: Option<f64>,
    pub enforce_ltr_containment: Option<bool>,
}

/// How soft checks (domain base count, LTR containment) are reported.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Off,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HervConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub limits: Option<LimitsConfig>,
    pub integrity: Option<IntegrityConfig>,
    pub validation_mode: Option<ValidationMode>,
    pub failpoints: Option<Vec<String>>,
}

impl HervConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            limits: Some(LimitsConfig::with_defaults()),
            integrity: Some(IntegrityConfig {
                probability_tolerance: Some(DEFAULT_PROBABILITY_TOLERANCE),
                enforce_ltr_containment: Some(true),
            }),
            validation_mode: Some(ValidationMode::Error),
            failpoints: None,
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> HervResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| HervError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| HervError::storage(format!("read config: {err}")))?;
            let config: HervConfig =
                serde_json::from_str(&raw).map_err(|err| HervError::config(err.to_string()))?;
            config.check()?;
            return Ok(config);
        }
        let default = HervConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| HervError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| HervError::storage(format!("write config: {err}")))?;
        Ok(default)
    }

    pub fn check(&self) -> HervResult<()> {
        let tolerance = self.probability_tolerance();
        if !tolerance.is_finite() || !(0.0..1.0).contains(&tolerance) {
            return Err(HervError::config(format!(
                "probability_tolerance {tolerance} must be in [0, 1)"
            )));
        }
        Ok(())
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> HervResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| "herv.sqlite".to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(HervError::config("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Some(url.as_str()),
        }
    }

    pub fn probability_tolerance(&self) -> f64 {
        self.integrity
            .as_ref()
            .and_then(|cfg| cfg.probability_tolerance)
            .unwrap_or(DEFAULT_PROBABILITY_TOLERANCE)
    }

    pub fn enforce_ltr_containment(&self) -> bool {
        self.integrity
            .as_ref()
            .and_then(|cfg| cfg.enforce_ltr_containment)
            .unwrap_or(true)
    }

    pub fn text_limits(&self) -> TextLimits {
        self.limits
            .as_ref()
            .map(LimitsConfig::text_limits)
            .unwrap_or_default()
    }
}

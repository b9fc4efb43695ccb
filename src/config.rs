use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::fcm::FcmParams;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// パーティション分割の方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionMode {
    #[default]
    ByYear,
    Single,
}

impl FromStr for PartitionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "by-year" | "by_year" | "year" => Ok(Self::ByYear),
            "single" | "all" => Ok(Self::Single),
            other => Err(anyhow::anyhow!("unknown partition mode: {other}")),
        }
    }
}

impl fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByYear => f.write_str("by-year"),
            Self::Single => f.write_str("single"),
        }
    }
}

/// Pipeline variant.
///
/// `Basic` emits membership degrees only. `Enriched` also collapses near-certain
/// memberships to one-hot vectors and carries exhibition titles and the fuzzy flag
/// in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineVariant {
    Basic,
    #[default]
    Enriched,
}

impl PipelineVariant {
    #[must_use]
    pub fn collapses_confident(self) -> bool {
        matches!(self, Self::Enriched)
    }

    #[must_use]
    pub fn writes_enriched_columns(self) -> bool {
        matches!(self, Self::Enriched)
    }
}

impl FromStr for PipelineVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "enriched" => Ok(Self::Enriched),
            other => Err(anyhow::anyhow!("unknown pipeline variant: {other}")),
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Enriched => f.write_str("enriched"),
        }
    }
}

/// パイプライン全段に渡す不変の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PipelineConfig {
    pub n_clusters: usize,
    #[serde(alias = "min_artists_per_year")]
    pub min_artists_per_partition: usize,
    pub fuzziness_exponent: f64,
    pub convergence_tolerance: f64,
    pub max_iterations: usize,
    pub max_components: usize,
    pub confidence_threshold: f64,
    pub partition_mode: PartitionMode,
    pub variant: PipelineVariant,
    pub seed: u64,
    pub keep_blank_artists: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_clusters: 4,
            min_artists_per_partition: 5,
            fuzziness_exponent: 2.0,
            convergence_tolerance: 0.005,
            max_iterations: 1000,
            max_components: 5,
            confidence_threshold: 0.95,
            partition_mode: PartitionMode::ByYear,
            variant: PipelineVariant::Enriched,
            seed: 42,
            keep_blank_artists: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl PipelineConfig {
    /// 既定値 → YAML（`EXHIBIT_CONFIG`）→ 環境変数の順に設定を読み込み、検証する。
    ///
    /// # Errors
    /// YAML の読み込み・パース、環境変数のパース、もしくは検証に失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match env::var("EXHIBIT_CONFIG") {
            Ok(raw) if !raw.trim().is_empty() => Self::load_from_path(Path::new(raw.trim()))?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// YAML ファイルから設定を読み込む。未指定の項目は既定値になる。
    ///
    /// # Errors
    /// ファイルの読み込みまたはパースに失敗した場合は [`ConfigError`] を返す。
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Deserialize {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `EXHIBIT_*` environment variables on top of `self`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a set variable does not parse.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            n_clusters: parse_usize("EXHIBIT_N_CLUSTERS", self.n_clusters)?,
            min_artists_per_partition: parse_usize(
                "EXHIBIT_MIN_ARTISTS_PER_YEAR",
                self.min_artists_per_partition,
            )?,
            fuzziness_exponent: parse_f64("EXHIBIT_FUZZINESS", self.fuzziness_exponent)?,
            convergence_tolerance: parse_f64("EXHIBIT_TOLERANCE", self.convergence_tolerance)?,
            max_iterations: parse_usize("EXHIBIT_MAX_ITERATIONS", self.max_iterations)?,
            max_components: parse_usize("EXHIBIT_MAX_COMPONENTS", self.max_components)?,
            confidence_threshold: parse_f64(
                "EXHIBIT_CONFIDENCE_THRESHOLD",
                self.confidence_threshold,
            )?,
            partition_mode: parse_from_str("EXHIBIT_PARTITION_MODE", self.partition_mode)?,
            variant: parse_from_str("EXHIBIT_VARIANT", self.variant)?,
            seed: parse_u64("EXHIBIT_SEED", self.seed)?,
            keep_blank_artists: parse_bool("EXHIBIT_KEEP_BLANK_ARTISTS", self.keep_blank_artists)?,
        })
    }

    /// 値域を検証する。
    ///
    /// # Errors
    /// 範囲外の値があれば [`ConfigError::Invalid`] を返す。
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.n_clusters >= 1, "n_clusters", "must be at least 1")?;
        ensure(
            self.fuzziness_exponent.is_finite() && self.fuzziness_exponent > 1.0,
            "fuzziness_exponent",
            "must be greater than 1",
        )?;
        ensure(
            self.convergence_tolerance.is_finite() && self.convergence_tolerance > 0.0,
            "convergence_tolerance",
            "must be greater than 0",
        )?;
        ensure(self.max_iterations >= 1, "max_iterations", "must be at least 1")?;
        ensure(self.max_components >= 1, "max_components", "must be at least 1")?;
        ensure(
            self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0,
            "confidence_threshold",
            "must be in (0, 1]",
        )?;
        Ok(())
    }

    #[must_use]
    pub fn fcm_params(&self) -> FcmParams {
        FcmParams {
            clusters: self.n_clusters,
            fuzziness: self.fuzziness_exponent,
            tolerance: self.convergence_tolerance,
            max_iterations: self.max_iterations,
            seed: self.seed,
        }
    }

    /// Threshold for confidence collapse, or `None` when the variant keeps every fuzzy vector.
    #[must_use]
    pub fn collapse_threshold(&self) -> Option<f64> {
        self.variant
            .collapses_confident()
            .then_some(self.confidence_threshold)
    }
}

fn ensure(condition: bool, name: &'static str, message: &'static str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!(message),
        })
    }
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}

fn parse_from_str<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = anyhow::Error>,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|source| ConfigError::Invalid { name, source }),
        Err(_) => Ok(default),
    }
}

use crate::pipeline::{ScoreProfile, ScoreWeights};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineConfig,
    pub remote: Option<RemoteProcessorConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pipeline: PipelineConfig::from_env()?,
            remote: RemoteProcessorConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scoring table and placeholder behaviour for the CSV pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub score_profile: ScoreProfile,
    /// Resolved table: the weights file when configured, else the profile's.
    pub weights: ScoreWeights,
    pub weights_path: Option<PathBuf>,
    pub placeholder_seed: Option<u64>,
    pub sample_on_empty: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_profile: ScoreProfile::default(),
            weights: ScoreProfile::default().weights(),
            weights_path: None,
            placeholder_seed: None,
            sample_on_empty: false,
        }
    }
}

impl PipelineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let score_profile = match non_empty_var("APP_SCORE_PROFILE") {
            Some(raw) => raw
                .parse::<ScoreProfile>()
                .map_err(|value| ConfigError::UnknownScoreProfile { value })?,
            None => ScoreProfile::default(),
        };

        let weights_path = non_empty_var("APP_SCORE_WEIGHTS_PATH").map(PathBuf::from);
        let weights = match &weights_path {
            Some(path) => load_weights(path)?,
            None => score_profile.weights(),
        };

        let placeholder_seed = non_empty_var("APP_PLACEHOLDER_SEED")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed { value: raw })
            })
            .transpose()?;

        let sample_on_empty = non_empty_var("APP_SAMPLE_ON_EMPTY")
            .map(|raw| parse_bool(&raw))
            .unwrap_or(false);

        Ok(Self {
            score_profile,
            weights,
            weights_path,
            placeholder_seed,
            sample_on_empty,
        })
    }
}

/// Primary remote processor tried before the local pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProcessorConfig {
    pub url: String,
    pub timeout: Duration,
}

impl RemoteProcessorConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(url) = non_empty_var("APP_REMOTE_PROCESSOR_URL") else {
            return Ok(None);
        };

        let timeout_secs = match non_empty_var("APP_REMOTE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Some(Self {
            url,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn load_weights(path: &Path) -> Result<ScoreWeights, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::WeightsUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    ScoreWeights::from_json(&raw).map_err(|source| ConfigError::WeightsInvalid {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidSeed {
        value: String,
    },
    InvalidTimeout {
        value: String,
    },
    UnknownScoreProfile {
        value: String,
    },
    WeightsUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    WeightsInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeed { value } => {
                write!(f, "APP_PLACEHOLDER_SEED must be a u64, got '{value}'")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "APP_REMOTE_TIMEOUT_SECS must be a positive number of seconds, got '{value}'"
            ),
            ConfigError::UnknownScoreProfile { value } => write!(
                f,
                "APP_SCORE_PROFILE '{value}' is not one of completion_tat, feedback"
            ),
            ConfigError::WeightsUnreadable { path, .. } => {
                write!(f, "unable to read score weights from {}", path.display())
            }
            ConfigError::WeightsInvalid { path, .. } => {
                write!(f, "score weights in {} are not valid", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::WeightsUnreadable { source, .. } => Some(source),
            ConfigError::WeightsInvalid { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSeed { .. }
            | ConfigError::InvalidTimeout { .. }
            | ConfigError::UnknownScoreProfile { .. } => None,
        }
    }
}

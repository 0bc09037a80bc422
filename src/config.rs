//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_JUDGE_QUEUE_STREAM, DEFAULT_JUDGE_RESULT_GROUP,
    DEFAULT_JUDGE_RESULT_STREAM, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_SIMULATION_MAX_DELAY_MS, DEFAULT_SIMULATION_MIN_DELAY_MS,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub judge: JudgeConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` runs the service on the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// JWT verification configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// How judging jobs leave this service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Publish to the judge queue stream
    Queue,
    /// Synthesize results in-process
    Simulate,
}

impl FromStr for DispatchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "simulate" => Ok(Self::Simulate),
            _ => Err(ConfigError::InvalidValue("JUDGE_DISPATCH_MODE".to_string())),
        }
    }
}

/// What a failed queue publish does to the submit that triggered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchFailurePolicy {
    /// Fail the submit and roll the submission back
    Reject,
    /// Judge the submission locally instead
    Simulate,
}

impl FromStr for DispatchFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "simulate" => Ok(Self::Simulate),
            _ => Err(ConfigError::InvalidValue("DISPATCH_FAILURE_POLICY".to_string())),
        }
    }
}

/// Judging pipeline configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub dispatch_mode: DispatchMode,
    pub failure_policy: DispatchFailurePolicy,
    /// Stream judge jobs are published to
    pub queue_stream: String,
    /// Stream judge results are consumed from
    pub result_stream: String,
    pub result_group: String,
    pub consumer_name: String,
    pub simulation_min_delay_ms: u64,
    pub simulation_max_delay_ms: u64,
    /// Seconds before a PENDING submission is forced to SYSTEM_ERROR; 0 disables
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
        })
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            dispatch_mode: parse_var("JUDGE_DISPATCH_MODE", DispatchMode::Queue)?,
            failure_policy: parse_var("DISPATCH_FAILURE_POLICY", DispatchFailurePolicy::Reject)?,
            queue_stream: env::var("JUDGE_QUEUE_STREAM")
                .unwrap_or_else(|_| DEFAULT_JUDGE_QUEUE_STREAM.to_string()),
            result_stream: env::var("JUDGE_RESULT_STREAM")
                .unwrap_or_else(|_| DEFAULT_JUDGE_RESULT_STREAM.to_string()),
            result_group: env::var("JUDGE_RESULT_GROUP")
                .unwrap_or_else(|_| DEFAULT_JUDGE_RESULT_GROUP.to_string()),
            consumer_name: env::var("JUDGE_CONSUMER_NAME")
                .unwrap_or_else(|_| format!("applier-{}", std::process::id())),
            simulation_min_delay_ms: parse_var(
                "SIMULATION_MIN_DELAY_MS",
                DEFAULT_SIMULATION_MIN_DELAY_MS,
            )?,
            simulation_max_delay_ms: parse_var(
                "SIMULATION_MAX_DELAY_MS",
                DEFAULT_SIMULATION_MAX_DELAY_MS,
            )?,
            timeout_secs: parse_var("JUDGE_TIMEOUT_SECS", 0)?,
        };

        if config.simulation_min_delay_ms > config.simulation_max_delay_ms {
            return Err(ConfigError::InvalidValue(
                "SIMULATION_MIN_DELAY_MS must not exceed SIMULATION_MAX_DELAY_MS".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::Queue,
            failure_policy: DispatchFailurePolicy::Reject,
            queue_stream: DEFAULT_JUDGE_QUEUE_STREAM.to_string(),
            result_stream: DEFAULT_JUDGE_RESULT_STREAM.to_string(),
            result_group: DEFAULT_JUDGE_RESULT_GROUP.to_string(),
            consumer_name: "applier-0".to_string(),
            simulation_min_delay_ms: DEFAULT_SIMULATION_MIN_DELAY_MS,
            simulation_max_delay_ms: DEFAULT_SIMULATION_MAX_DELAY_MS,
            timeout_secs: 0,
        }
    }
}

/// Read an environment variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_mode_parsing() {
        assert_eq!("queue".parse::<DispatchMode>().unwrap(), DispatchMode::Queue);
        assert_eq!("SIMULATE".parse::<DispatchMode>().unwrap(), DispatchMode::Simulate);
        assert!("both".parse::<DispatchMode>().is_err());
    }

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!(
            "reject".parse::<DispatchFailurePolicy>().unwrap(),
            DispatchFailurePolicy::Reject
        );
        assert_eq!(
            "simulate".parse::<DispatchFailurePolicy>().unwrap(),
            DispatchFailurePolicy::Simulate
        );
        assert!("retry".parse::<DispatchFailurePolicy>().is_err());
    }

    #[test]
    fn test_judge_defaults() {
        let judge = JudgeConfig::default();
        assert_eq!(judge.queue_stream, "submission-topic");
        assert_eq!(judge.timeout_secs, 0);
        assert!(judge.simulation_min_delay_ms <= judge.simulation_max_delay_ms);
    }
}

use std::env;
use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};

use crate::emi::LoanPolicy;
use crate::portal::lifecycle::LifecyclePolicy;

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

/// Top-level configuration for the portal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub loan: LoanPolicy,
    pub lifecycle: LifecyclePolicy,
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

        let defaults = LoanPolicy::default();
        let loan = LoanPolicy {
            min_amount: env_amount("EMI_MIN_AMOUNT", defaults.min_amount)?,
            max_amount: env_amount("EMI_MAX_AMOUNT", defaults.max_amount)?,
            annual_rate_percent: env_rate("EMI_ANNUAL_RATE", defaults.annual_rate_percent)?,
        };
        if loan.min_amount > loan.max_amount {
            return Err(ConfigError::InvertedAmountBounds {
                min: loan.min_amount,
                max: loan.max_amount,
            });
        }

        let lifecycle = LifecyclePolicy {
            require_note_on_status_change: env_flag("EMI_REQUIRE_STATUS_NOTE", false),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            loan,
            lifecycle,
        })
    }
}

fn env_amount(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or(ConfigError::InvalidAmount { key }),
        Err(_) => Ok(default),
    }
}

fn env_rate(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or(ConfigError::InvalidRate { key }),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &'static str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: AddrParseError },
    InvalidAmount { key: &'static str },
    InvalidRate { key: &'static str },
    InvertedAmountBounds { min: f64, max: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be an IP address or 'localhost'")
            }
            ConfigError::InvalidAmount { key } => {
                write!(f, "{key} must be a non-negative number")
            }
            ConfigError::InvalidRate { key } => {
                write!(f, "{key} must be a non-negative percentage")
            }
            ConfigError::InvertedAmountBounds { min, max } => {
                write!(
                    f,
                    "EMI_MIN_AMOUNT ({min}) must not exceed EMI_MAX_AMOUNT ({max})"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("EMI_MIN_AMOUNT");
        env::remove_var("EMI_MAX_AMOUNT");
        env::remove_var("EMI_ANNUAL_RATE");
        env::remove_var("EMI_REQUIRE_STATUS_NOTE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.loan.min_amount, 5_000.0);
        assert_eq!(config.loan.max_amount, 500_000.0);
        assert_eq!(config.loan.annual_rate_percent, 0.0);
        assert!(!config.lifecycle.require_note_on_status_change);
    }

    #[test]
    fn load_reads_loan_policy_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMI_MIN_AMOUNT", "10000");
        env::set_var("EMI_ANNUAL_RATE", "15");
        env::set_var("EMI_REQUIRE_STATUS_NOTE", "true");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.loan.min_amount, 10_000.0);
        assert_eq!(config.loan.annual_rate_percent, 15.0);
        assert!(config.lifecycle.require_note_on_status_change);
        reset_env();
    }

    #[test]
    fn rejects_inverted_amount_bounds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMI_MIN_AMOUNT", "600000");
        env::set_var("EMI_MAX_AMOUNT", "500000");
        let result = AppConfig::load();
        assert!(matches!(
            result,
            Err(ConfigError::InvertedAmountBounds { .. })
        ));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }
}

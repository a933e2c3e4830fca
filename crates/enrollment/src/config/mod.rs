use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::registration::{ProgramCatalog, ProgramId};

const DEFAULT_PROGRAM: &str = "Summer Camp 2025";

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
    pub enrollment: EnrollmentConfig,
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
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => {
                LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat { value: raw })?
            }
            Err(_) if environment == AppEnvironment::Production => LogFormat::Json,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            enrollment: EnrollmentConfig::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Output layout for log lines. Production defaults to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Program catalogue, seat capacities, and optional ledger snapshot location.
#[derive(Debug, Clone)]
pub struct EnrollmentConfig {
    pub catalog: ProgramCatalog,
    pub ledger_path: Option<PathBuf>,
}

impl EnrollmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_capacity = match env::var("ENROLL_DEFAULT_CAPACITY") {
            Ok(raw) => parse_capacity(&raw)
                .ok_or(ConfigError::InvalidCapacity { entry: raw.clone() })?,
            Err(_) => NonZeroU32::MIN,
        };

        let programs = env::var("ENROLL_PROGRAMS").unwrap_or_else(|_| DEFAULT_PROGRAM.to_string());
        let catalog = parse_catalog(&programs, default_capacity)?;

        let ledger_path = env::var("ENROLL_LEDGER_PATH")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            catalog,
            ledger_path,
        })
    }
}

fn parse_capacity(raw: &str) -> Option<NonZeroU32> {
    raw.trim().parse::<NonZeroU32>().ok()
}

/// Parses `name=capacity` or bare `name` entries separated by commas.
fn parse_catalog(raw: &str, default_capacity: NonZeroU32) -> Result<ProgramCatalog, ConfigError> {
    let mut catalog = ProgramCatalog::new(default_capacity);

    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (name, capacity) = match entry.rsplit_once('=') {
            Some((name, capacity)) => {
                let capacity = parse_capacity(capacity).ok_or_else(|| {
                    ConfigError::InvalidCapacity {
                        entry: entry.to_string(),
                    }
                })?;
                (name.trim(), capacity)
            }
            None => (entry, default_capacity),
        };

        if name.is_empty() {
            return Err(ConfigError::InvalidProgram {
                entry: entry.to_string(),
            });
        }

        catalog = catalog.with_program(ProgramId::new(name), capacity);
    }

    Ok(catalog)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCapacity { entry: String },
    InvalidProgram { entry: String },
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCapacity { entry } => {
                write!(f, "program capacity must be a positive integer (found '{entry}')")
            }
            ConfigError::InvalidProgram { entry } => {
                write!(f, "ENROLL_PROGRAMS entry '{entry}' is missing a program name")
            }
            ConfigError::InvalidLogFormat { value } => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json' (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCapacity { .. }
            | ConfigError::InvalidProgram { .. }
            | ConfigError::InvalidLogFormat { .. } => None,
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
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("ENROLL_DEFAULT_CAPACITY");
        env::remove_var("ENROLL_PROGRAMS");
        env::remove_var("ENROLL_LEDGER_PATH");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);

        let catalog = &config.enrollment.catalog;
        let camp = ProgramId::new(DEFAULT_PROGRAM);
        assert!(catalog.offers(&camp));
        assert_eq!(catalog.capacity_for(&camp).get(), 1);
        assert!(config.enrollment.ledger_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn parses_program_capacities() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ENROLL_DEFAULT_CAPACITY", "4");
        env::set_var("ENROLL_PROGRAMS", "Robotics = 12, Chess Club ,Art=2");
        env::set_var("ENROLL_LEDGER_PATH", "/tmp/ledger.json");

        let config = AppConfig::load().expect("config loads");
        let catalog = &config.enrollment.catalog;
        assert_eq!(catalog.capacity_for(&ProgramId::new("Robotics")).get(), 12);
        assert_eq!(catalog.capacity_for(&ProgramId::new("Chess Club")).get(), 4);
        assert_eq!(catalog.capacity_for(&ProgramId::new("Art")).get(), 2);
        assert!(!catalog.offers(&ProgramId::new(DEFAULT_PROGRAM)));
        assert_eq!(
            config.enrollment.ledger_path,
            Some(PathBuf::from("/tmp/ledger.json"))
        );
        reset_env();
    }

    #[test]
    fn production_logs_as_json_unless_overridden() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.telemetry.format, LogFormat::Json);

        env::set_var("APP_LOG_FORMAT", "compact");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.telemetry.format, LogFormat::Compact);

        env::set_var("APP_LOG_FORMAT", "xml");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidLogFormat { .. })
        ));
        reset_env();
    }

    #[test]
    fn rejects_zero_capacity() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ENROLL_PROGRAMS", "Camp=0");

        match AppConfig::load() {
            Err(ConfigError::InvalidCapacity { entry }) => assert_eq!(entry, "Camp=0"),
            other => panic!("expected capacity error, got {other:?}"),
        }
        reset_env();
    }
}

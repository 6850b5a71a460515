use crate::workflows::onboarding::access::{AccessScope, OperatorCredential};
use crate::workflows::onboarding::archive::ArchivePolicy;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_HOLIDAYS: &str = "2025-05-17,2025-05-19";
const DEFAULT_ROWS_PER_PAGE: usize = 40;

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
    pub store: StoreConfig,
    pub calendar: CalendarConfig,
    pub archive: ArchiveConfig,
    pub access: AccessConfig,
    pub report: ReportConfig,
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

        let store_path = env::var("APP_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("semaforo_guardado.csv"));

        let holidays = parse_holidays(
            &env::var("APP_HOLIDAYS").unwrap_or_else(|_| DEFAULT_HOLIDAYS.to_string()),
        )?;

        let archive_dir = env::var("APP_ARCHIVE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("archive"));
        let archive_unrouted = match env::var("APP_ARCHIVE_UNROUTED") {
            Ok(raw) => parse_flag("APP_ARCHIVE_UNROUTED", &raw)?,
            Err(_) => false,
        };

        let operators = match env::var("APP_OPERATORS") {
            Ok(raw) => parse_operators(&raw)?,
            Err(_) => Vec::new(),
        };

        let rows_per_page = match env::var("APP_REPORT_ROWS_PER_PAGE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|rows| *rows > 0)
                .ok_or(ConfigError::InvalidPageSize)?,
            Err(_) => DEFAULT_ROWS_PER_PAGE,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig { path: store_path },
            calendar: CalendarConfig { holidays },
            archive: ArchiveConfig {
                directory: archive_dir,
                policy: ArchivePolicy { archive_unrouted },
            },
            access: AccessConfig { operators },
            report: ReportConfig { rows_per_page },
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

/// Location of the flat customer table.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

/// Holidays excluded from business-day counting.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub holidays: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub directory: PathBuf,
    pub policy: ArchivePolicy,
}

#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    pub operators: Vec<OperatorCredential>,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub rows_per_page: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

pub(crate) fn parse_holidays(raw: &str) -> Result<BTreeSet<NaiveDate>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ConfigError::InvalidHoliday {
                value: value.to_string(),
            })
        })
        .collect()
}

/// Parses `user:secret:scope` entries separated by `;`. A scope of `*` grants all access.
pub(crate) fn parse_operators(raw: &str) -> Result<Vec<OperatorCredential>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':').map(str::trim);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(user), Some(secret), Some(scope))
                    if !user.is_empty() && !secret.is_empty() && !scope.is_empty() =>
                {
                    let scope = if scope == "*" {
                        AccessScope::AllAccess
                    } else {
                        AccessScope::CallCenter(scope.to_string())
                    };
                    Ok(OperatorCredential::new(user, secret, scope))
                }
                _ => Err(ConfigError::InvalidOperator {
                    entry: user_part(entry),
                }),
            }
        })
        .collect()
}

// Never echo secrets back in error messages.
fn user_part(entry: &str) -> String {
    entry.split(':').next().unwrap_or_default().trim().to_string()
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidHoliday { value: String },
    InvalidOperator { entry: String },
    InvalidFlag { name: &'static str, value: String },
    InvalidPageSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidHoliday { value } => {
                write!(f, "APP_HOLIDAYS entry '{value}' is not a YYYY-MM-DD date")
            }
            ConfigError::InvalidOperator { entry } => write!(
                f,
                "APP_OPERATORS entry for '{entry}' must look like user:secret:scope"
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag, got '{value}'")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "APP_REPORT_ROWS_PER_PAGE must be a positive integer")
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

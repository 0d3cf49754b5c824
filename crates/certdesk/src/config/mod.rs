use crate::certificates::CertificateKind;
use crate::ingest::{FieldRoles, MissingKeyPolicy};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub datasets: DatasetConfig,
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

        let connection_string = env::var("STORE_CONNECTION_STRING")
            .unwrap_or_else(|_| "sqlite://certdesk.sqlite".to_string());
        if connection_string.trim().is_empty() {
            return Err(ConfigError::MissingConnectionString);
        }

        let missing_key_policy = match env::var("INGEST_MISSING_KEY") {
            Ok(value) => MissingKeyPolicy::parse(&value)
                .ok_or(ConfigError::InvalidMissingKeyPolicy(value))?,
            Err(_) => MissingKeyPolicy::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig { connection_string },
            datasets: DatasetConfig {
                training: DatasetSettings::from_env("TRAINING", CertificateKind::Training),
                internship: DatasetSettings::from_env("INTERNSHIP", CertificateKind::Internship),
                missing_key_policy,
            },
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
}

/// Document store endpoint, read once at process start.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub connection_string: String,
}

/// Per-dataset normalization and ingestion settings.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub training: DatasetSettings,
    pub internship: DatasetSettings,
    pub missing_key_policy: MissingKeyPolicy,
}

impl DatasetConfig {
    pub fn for_kind(&self, kind: CertificateKind) -> &DatasetSettings {
        match kind {
            CertificateKind::Training => &self.training,
            CertificateKind::Internship => &self.internship,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSettings {
    /// Where the normalizer writes, and the ingestor reads, the JSON array.
    pub output_path: PathBuf,
    pub roles: FieldRoles,
}

impl DatasetSettings {
    pub fn defaults(kind: CertificateKind) -> Self {
        match kind {
            CertificateKind::Training => Self {
                output_path: PathBuf::from("Training Program Data/training_info.json"),
                roles: FieldRoles::new(["Name"], std::iter::empty::<&str>()),
            },
            CertificateKind::Internship => Self {
                output_path: PathBuf::from("Internship Data/internship_info.json"),
                roles: FieldRoles::new(
                    ["Name", "Project Name", "Mentor Name"],
                    ["Email Id", "Internship Id"],
                ),
            },
        }
    }

    fn from_env(prefix: &str, kind: CertificateKind) -> Self {
        let defaults = Self::defaults(kind);

        let output_path = env::var(format!("{prefix}_OUTPUT_PATH"))
            .map(PathBuf::from)
            .unwrap_or(defaults.output_path);
        let name_fields = env::var(format!("{prefix}_NAME_FIELDS"))
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.roles.name_fields);
        let id_fields = env::var(format!("{prefix}_ID_FIELDS"))
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.roles.id_fields);

        Self {
            output_path,
            roles: FieldRoles {
                name_fields,
                id_fields,
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingConnectionString,
    InvalidMissingKeyPolicy(String),
    UnknownDataset(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingConnectionString => {
                write!(f, "STORE_CONNECTION_STRING must not be empty")
            }
            ConfigError::InvalidMissingKeyPolicy(value) => write!(
                f,
                "INGEST_MISSING_KEY must be 'reject' or 'skip' (got '{}')",
                value
            ),
            ConfigError::UnknownDataset(value) => write!(
                f,
                "unknown dataset '{}': expected 'training' or 'internship'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingConnectionString
            | ConfigError::InvalidMissingKeyPolicy(_)
            | ConfigError::UnknownDataset(_) => None,
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
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "STORE_CONNECTION_STRING",
            "INGEST_MISSING_KEY",
            "TRAINING_OUTPUT_PATH",
            "TRAINING_NAME_FIELDS",
            "TRAINING_ID_FIELDS",
            "INTERNSHIP_OUTPUT_PATH",
            "INTERNSHIP_NAME_FIELDS",
            "INTERNSHIP_ID_FIELDS",
        ] {
            env::remove_var(key);
        }
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
        assert_eq!(config.store.connection_string, "sqlite://certdesk.sqlite");
        assert_eq!(config.datasets.missing_key_policy, MissingKeyPolicy::Reject);
        assert_eq!(
            config.datasets.for_kind(CertificateKind::Internship),
            &DatasetSettings::defaults(CertificateKind::Internship)
        );
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
    fn dataset_roles_and_paths_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TRAINING_NAME_FIELDS", "Name, Program ,");
        env::set_var("TRAINING_ID_FIELDS", "Student Id");
        env::set_var("TRAINING_OUTPUT_PATH", "out/training.json");
        env::set_var("INGEST_MISSING_KEY", "skip");

        let config = AppConfig::load().expect("config loads");
        let training = config.datasets.for_kind(CertificateKind::Training);
        assert_eq!(training.roles.name_fields, vec!["Name", "Program"]);
        assert_eq!(training.roles.id_fields, vec!["Student Id"]);
        assert_eq!(training.output_path, PathBuf::from("out/training.json"));
        assert_eq!(config.datasets.missing_key_policy, MissingKeyPolicy::Skip);
        reset_env();
    }

    #[test]
    fn rejects_unknown_missing_key_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("INGEST_MISSING_KEY", "ignore");
        let error = AppConfig::load().expect_err("policy rejected");
        assert!(matches!(error, ConfigError::InvalidMissingKeyPolicy(ref value) if value == "ignore"));
        reset_env();
    }
}

//! Configuration for stagegated

use serde::{Deserialize, Serialize};
use stagegate_core::{StagePlan, StorageConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Minimum session secret length accepted in production.
pub const MIN_SECRET_LEN: usize = 32;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Stage paths, form endpoints and exit URL
    #[serde(default)]
    pub stages: StagePlan,

    #[serde(default)]
    pub passphrase: PassphraseConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,

    /// Production mode: secure cookies and a mandatory session secret
    #[serde(default)]
    pub production: bool,

    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            production: false,
            static_dir: default_static_dir(),
            static_prefix: default_static_prefix(),
        }
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for cookie signatures. Generated per process when unset.
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Idle time after which a session is forgotten
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            cookie_name: default_cookie_name(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Passphrase generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassphraseConfig {
    #[serde(default = "default_passphrase_timeout")]
    pub timeout_ms: u64,

    /// One word per line; the bundled list is used when unset
    #[serde(default)]
    pub word_list: Option<PathBuf>,
}

impl Default for PassphraseConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_passphrase_timeout(),
            word_list: None,
        }
    }
}

impl PassphraseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Stage content configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// JSON catalog used by the memory backend; built-in content when unset
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            cache: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("crates/stagegate-service/static")
}

fn default_static_prefix() -> String {
    "/static".to_string()
}

fn default_cookie_name() -> String {
    "stagegate".to_string()
}

fn default_idle_timeout() -> u64 {
    4 * 60 * 60
}

fn default_passphrase_timeout() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "stagegate_service=info,stagegate_core=info,tower_http=info".to_string()
}

impl ServiceConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `STAGEGATE__`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // e.g. STAGEGATE__SERVER__LISTEN_ADDR=0.0.0.0:3000
        builder = builder.add_source(
            config::Environment::with_prefix("STAGEGATE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.stages.validate()?;

        if !self.server.static_prefix.starts_with('/') || self.server.static_prefix.len() < 2 {
            return Err(format!(
                "static_prefix must be a non-root absolute path, got '{}'",
                self.server.static_prefix
            ));
        }

        if self.server.production {
            match self.session.secret.as_deref() {
                Some(secret) if secret.len() >= MIN_SECRET_LEN => {}
                _ => {
                    return Err(format!(
                        "production mode requires session.secret of at least {MIN_SECRET_LEN} bytes"
                    ))
                }
            }
        }

        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!(
                "invalid session cookie name '{}'",
                self.session.cookie_name
            ));
        }

        Ok(())
    }
}

//! Configuration management
//!
//! Settings are layered: an optional TOML file first, then environment
//! variables (section and key joined with `__`, e.g. `RADIUS__SHARED_SECRET`,
//! `OMADA__CONTROLLER_IP`). Environment values win over the file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Omada controller settings
    #[serde(default)]
    pub omada: OmadaConfig,

    /// RADIUS server settings
    #[serde(default)]
    pub radius: RadiusConfig,

    /// Alternate vendor settings (route is stubbed, kept for parity)
    #[serde(default)]
    pub aruba: ArubaConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Port the portal API listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served as the portal's static login page
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Destination used when the login form carries no redirect URL
    #[serde(default = "default_fallback_redirect")]
    pub fallback_redirect: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            fallback_redirect: default_fallback_redirect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OmadaConfig {
    /// Controller host or IP
    #[serde(default = "default_controller_ip")]
    pub controller_ip: String,

    /// Controller HTTPS port
    #[serde(default = "default_controller_port")]
    pub controller_port: u16,

    /// Controller identifier path segment (empty for controllers without one)
    #[serde(default)]
    pub controller_id: String,

    /// Hotspot operator credentials
    #[serde(default)]
    pub operator_username: String,
    #[serde(default)]
    pub operator_password: String,

    /// Set false to accept the controller's self-signed certificate
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Bounded wait on controller HTTP calls, in seconds
    #[serde(default = "default_omada_timeout")]
    pub timeout_secs: u64,

    /// How long an authorized client stays whitelisted, in seconds
    #[serde(default = "default_auth_duration")]
    pub auth_duration_secs: u32,
}

impl Default for OmadaConfig {
    fn default() -> Self {
        Self {
            controller_ip: default_controller_ip(),
            controller_port: default_controller_port(),
            controller_id: String::new(),
            operator_username: String::new(),
            operator_password: String::new(),
            verify_tls: default_verify_tls(),
            timeout_secs: default_omada_timeout(),
            auth_duration_secs: default_auth_duration(),
        }
    }
}

impl OmadaConfig {
    /// Base URL for controller API calls, including the optional
    /// controller-id path segment.
    pub fn base_url(&self) -> String {
        let id_path = if self.controller_id.is_empty() {
            String::new()
        } else {
            format!("/{}", self.controller_id)
        };
        format!(
            "https://{}:{}{}",
            self.controller_ip, self.controller_port, id_path
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RadiusConfig {
    /// RADIUS server IP
    #[serde(default = "default_radius_ip")]
    pub server_ip: String,

    /// RADIUS authentication port
    #[serde(default = "default_radius_port")]
    pub server_port: u16,

    /// Shared secret between this portal and the RADIUS server
    #[serde(default)]
    pub shared_secret: String,

    /// How long to wait for an Access-Accept/Reject, in milliseconds
    #[serde(default = "default_radius_timeout")]
    pub timeout_ms: u64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            server_ip: default_radius_ip(),
            server_port: default_radius_port(),
            shared_secret: String::new(),
            timeout_ms: default_radius_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArubaConfig {
    #[serde(default)]
    pub api_endpoint: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_fallback_redirect() -> String {
    "https://www.google.com".to_string()
}

fn default_controller_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_controller_port() -> u16 {
    8043
}

fn default_verify_tls() -> bool {
    true
}

fn default_omada_timeout() -> u64 {
    10
}

fn default_auth_duration() -> u32 {
    3600
}

fn default_radius_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_radius_port() -> u16 {
    1812
}

fn default_radius_timeout() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration: the explicit `--config` path if given, otherwise
    /// the first candidate file that exists, with environment variables
    /// layered on top either way.
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        let file = match explicit_path {
            Some(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    bail!("config file not found: {}", path.display());
                }
                Some(path)
            }
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        };

        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Config = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(cfg)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("config.toml"),
            PathBuf::from("/etc/radgate/config.toml"),
            dirs::home_dir()
                .map(|h| h.join(".config/radgate/config.toml"))
                .unwrap_or_default(),
        ]
    }

    /// Reject configurations that would fail on the first login attempt.
    pub fn validate(&self) -> Result<()> {
        if self.radius.shared_secret.is_empty() {
            bail!("radius.shared_secret is not set (RADIUS__SHARED_SECRET)");
        }
        if self.omada.operator_username.is_empty() || self.omada.operator_password.is_empty() {
            bail!(
                "omada operator credentials are not set \
                 (OMADA__OPERATOR_USERNAME / OMADA__OPERATOR_PASSWORD)"
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            omada: OmadaConfig::default(),
            radius: RadiusConfig::default(),
            aruba: ArubaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

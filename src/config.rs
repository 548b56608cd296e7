//! Environment-derived configuration

use crate::compose::scanner::{DEFAULT_EXCLUDES, DEFAULT_MAX_DEPTH};
use crate::error::{DeckError, Result};
use std::path::PathBuf;

/// Default root scanned when SCAN_DIRECTORIES is not set
pub const DEFAULT_SCAN_ROOT: &str = "/srv";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8091;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Roots to scan for compose files
    pub scan_directories: Vec<PathBuf>,
    /// Directory names never descended into
    pub scan_excludes: Vec<String>,
    /// Maximum recursion depth below each root
    pub scan_max_depth: usize,
    /// Prefix compose invocations with sudo
    pub use_sudo: bool,
    /// Use the legacy hyphenated docker-compose binary
    pub compose_legacy: bool,
    /// HTTP listen port
    pub port: u16,
    /// Admin login name
    pub admin_username: String,
    /// Admin password (hashed at startup, never kept in the clear)
    pub admin_password: String,
    /// Token signing secret
    pub jwt_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_directories: vec![PathBuf::from(DEFAULT_SCAN_ROOT)],
            scan_excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            scan_max_depth: DEFAULT_MAX_DEPTH,
            use_sudo: false,
            compose_legacy: false,
            port: DEFAULT_PORT,
            admin_username: "admin".to_string(),
            admin_password: String::new(),
            jwt_secret: String::new(),
        }
    }
}

impl Config {
    /// Build configuration from the process environment.
    ///
    /// Recognized variables: SCAN_DIRECTORIES, SCAN_EXCLUDE,
    /// SCAN_MAX_DEPTH, USE_SUDO, COMPOSE_LEGACY, PORT, ADMIN_USERNAME,
    /// ADMIN_PASSWORD, JWT_SECRET.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(dirs) = std::env::var("SCAN_DIRECTORIES") {
            let roots: Vec<PathBuf> = dirs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
            if !roots.is_empty() {
                config.scan_directories = roots;
            }
        }

        if let Ok(excludes) = std::env::var("SCAN_EXCLUDE") {
            config.scan_excludes = excludes
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(depth) = std::env::var("SCAN_MAX_DEPTH") {
            config.scan_max_depth = depth.parse().map_err(|_| {
                DeckError::InvalidConfig(format!("SCAN_MAX_DEPTH is not a number: {}", depth))
            })?;
        }

        config.use_sudo = env_flag("USE_SUDO");
        config.compose_legacy = env_flag("COMPOSE_LEGACY");

        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|_| {
                DeckError::InvalidConfig(format!("PORT is not a valid port: {}", port))
            })?;
        }

        if let Ok(username) = std::env::var("ADMIN_USERNAME") {
            config.admin_username = username;
        }
        config.admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_default();
        config.jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();

        Ok(config)
    }

    /// Validate the parts the server cannot run without
    pub fn validate_for_serve(&self) -> Result<()> {
        if self.admin_password.is_empty() {
            return Err(DeckError::InvalidConfig(
                "ADMIN_PASSWORD must be set".to_string(),
            ));
        }
        if self.jwt_secret.is_empty() {
            return Err(DeckError::InvalidConfig(
                "JWT_SECRET must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Truthy environment flag: "1", "true", "yes" (case-insensitive)
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| {
            let v = v.trim().to_lowercase();
            v == "1" || v == "true" || v == "yes"
        })
        .unwrap_or(false)
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Credentials;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 5;

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub host_ip: Option<String>,
    pub port: Option<u16>,
    pub localhost: Option<bool>,
    pub trust_proxy: Option<bool>,
    pub require_login: Option<bool>,
    pub username: Option<String>,
    /// bcrypt hash of the login password (`jukebox --hash-password <PW>`).
    pub password_hash: Option<String>,
    /// Mark the session cookie `Secure` (TLS-terminating proxy in front).
    pub secure_cookie: Option<bool>,
    pub public_dir: Option<PathBuf>,
    /// Base URL of a self-hosted media library reachable through `/api/library`.
    pub library_url: Option<String>,
    pub enrichment_timeout_secs: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    /// As configured: an address literal or a hostname, resolved at startup.
    pub host_ip: String,
    pub port: u16,
    pub localhost: bool,
    pub trust_proxy: bool,
    /// `Some` when login is required.
    pub credentials: Option<Credentials>,
    pub secure_cookie: bool,
    pub public_dir: PathBuf,
    pub library_url: Option<String>,
    pub enrichment_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no host address configured (set host_ip in the config file or pass --host-ip)")]
    MissingHost,
    #[error("require_login is set but username or password_hash is missing")]
    MissingCredentials,
}

impl Config {
    /// Merge CLI over file over defaults. Fails when the host is unknown, since
    /// without it nobody could be told apart from the host.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let host_ip = args
            .host_ip
            .clone()
            .or(file.host_ip)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingHost)?;

        let credentials = if file.require_login.unwrap_or(false) {
            match (file.username, file.password_hash) {
                (Some(username), Some(password_hash))
                    if !username.is_empty() && !password_hash.is_empty() =>
                {
                    Some(Credentials { username, password_hash })
                }
                _ => return Err(ConfigError::MissingCredentials),
            }
        } else {
            None
        };

        Ok(Config {
            host_ip,
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            localhost: args.localhost || file.localhost.unwrap_or(false),
            trust_proxy: args.trust_proxy || file.trust_proxy.unwrap_or(false),
            credentials,
            secure_cookie: file.secure_cookie.unwrap_or(false),
            public_dir: args
                .public_dir
                .clone()
                .or(file.public_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR)),
            library_url: file
                .library_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            enrichment_timeout: Duration::from_secs(
                file.enrichment_timeout_secs
                    .unwrap_or(DEFAULT_ENRICHMENT_TIMEOUT_SECS),
            ),
        })
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("jukebox.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("jukebox").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}

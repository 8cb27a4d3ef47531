// crates/server/src/config.rs
//! Runtime configuration read from the environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_YTDLP: &str = "yt-dlp";
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    #[error("Invalid host address '{0}'")]
    InvalidHost(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub download_dir: PathBuf,
    pub ytdlp_binary: PathBuf,
    pub ffmpeg_location: Option<PathBuf>,
    /// Frontend assets; `None` runs API-only.
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    ///
    /// Port priority: `MEDIADROP_PORT`, then `PORT`, then 5000.
    /// Static dir priority: `STATIC_DIR`, then `./static` if it exists.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("MEDIADROP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip: IpAddr = host.parse().map_err(|_| ConfigError::InvalidHost(host.clone()))?;

        let port = match get("MEDIADROP_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let static_dir = get("STATIC_DIR").map(PathBuf::from).or_else(|| {
            let dir = PathBuf::from(DEFAULT_STATIC_DIR);
            dir.is_dir().then_some(dir)
        });

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            download_dir: get("MEDIADROP_DOWNLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string())
                .into(),
            ytdlp_binary: get("MEDIADROP_YTDLP").unwrap_or_else(|| DEFAULT_YTDLP.to_string()).into(),
            ffmpeg_location: get("MEDIADROP_FFMPEG_DIR").map(PathBuf::from),
            static_dir,
        })
    }
}

use crate::errors::{Error, Result};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_BASE_URL: &str = "https://aranet.cloud";

/// Settings read once at startup and handed to whoever needs them.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub aranet_base_url: String,
    pub aranet_api_key: String,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| Error::InvalidConfig {
                key: "PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let aranet_base_url = lookup("ARANET_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let aranet_api_key = lookup("ARANET_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingConfig("ARANET_API_KEY"))?;

        Ok(Self {
            port,
            aranet_base_url,
            aranet_api_key,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("aranet_base_url", &self.aranet_base_url)
            .field("aranet_api_key", &"***")
            .finish()
    }
}

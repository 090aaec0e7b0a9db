use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub pool_size: u32,
    /// Header an authenticating proxy sets to the logged-in username.
    pub remote_user_header: String,
    /// Where unauthenticated visitors of protected pages are sent.
    pub login_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            database_url: String::from("polls.sqlite3"),
            pool_size: 8,
            remote_user_header: String::from("x-remote-user"),
            login_url: String::from("/accounts/login/"),
        }
    }
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Config, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!("Ignoring unreadable .env file: {err}");
            }
        }
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            host: parse_or(&lookup, "POLLS_HOST", defaults.host)?,
            port: parse_or(&lookup, "POLLS_PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            pool_size: parse_or(&lookup, "POLLS_POOL_SIZE", defaults.pool_size)?,
            remote_user_header: lookup("POLLS_REMOTE_USER_HEADER")
                .map(|h| h.trim().to_ascii_lowercase())
                .unwrap_or(defaults.remote_user_header),
            login_url: lookup("POLLS_LOGIN_URL").unwrap_or(defaults.login_url),
        })
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => {
            debug!("{key} not set, using default: {default:?}");
            Ok(default)
        }
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
            value,
        }),
    }
}

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v21.0";
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Process configuration, read once at start-up and shared by reference.
#[derive(Clone)]
pub struct Config {
    pub page_access_token: String,
    pub verify_token: String,
    pub bind_addr: SocketAddr,
    pub graph_api_url: String,
    pub send_timeout: Duration,
    pub register_commands: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("page_access_token", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("graph_api_url", &self.graph_api_url)
            .field("send_timeout", &self.send_timeout)
            .field("register_commands", &self.register_commands)
            .finish()
    }
}

impl Config {
    /// Build from the process environment. Call `dotenv` first if a `.env`
    /// file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let page_access_token = required(&lookup, "PAGE_ACCESS_TOKEN")?;
        let verify_token = required(&lookup, "VERIFY_TOKEN")?;

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: "expected host:port",
        })?;

        let graph_api_url = lookup("GRAPH_API_URL")
            .unwrap_or_else(|| DEFAULT_GRAPH_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let send_timeout = match lookup("SEND_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SEND_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds",
                    });
                }
            },
        };

        let register_commands = match lookup("REGISTER_COMMANDS") {
            None => true,
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                name: "REGISTER_COMMANDS",
                value: raw,
                reason: "expected true/false",
            })?,
        };

        Ok(Config {
            page_access_token,
            verify_token,
            bind_addr,
            graph_api_url,
            send_timeout,
            register_commands,
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

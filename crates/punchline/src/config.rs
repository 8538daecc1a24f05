//! Server configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use punchline_game::GameConfig;

use crate::PunchlineError;

/// Process-level settings for the server binary.
///
/// | variable            | default       |
/// |---------------------|---------------|
/// | `BIND_ADDRESS`      | `0.0.0.0`     |
/// | `BIND_PORT`         | `3001`        |
/// | `PROMPT_FILE`       | `prompts.txt` |
/// | `REQUEST_IDLE_SECS` | `120`         |
///
/// Game rules are not read from the environment; they use
/// [`GameConfig::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub bind_port: u16,
    pub prompt_file: PathBuf,
    /// How long a connection may stay silent before it is closed.
    pub idle_timeout: Duration,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 3001,
            prompt_file: PathBuf::from("prompts.txt"),
            idle_timeout: Duration::from_secs(120),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    /// [`PunchlineError::Config`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, PunchlineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PunchlineError> {
        let mut config = Self::default();

        if let Some(address) = lookup("BIND_ADDRESS") {
            config.bind_address = address;
        }
        if let Some(port) = lookup("BIND_PORT") {
            config.bind_port = parse("BIND_PORT", &port)?;
        }
        if let Some(path) = lookup("PROMPT_FILE") {
            config.prompt_file = PathBuf::from(path);
        }
        if let Some(secs) = lookup("REQUEST_IDLE_SECS") {
            config.idle_timeout = Duration::from_secs(parse("REQUEST_IDLE_SECS", &secs)?);
        }

        Ok(config)
    }

    /// `address:port` to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, PunchlineError> {
    value
        .trim()
        .parse()
        .map_err(|_| PunchlineError::Config(format!("{key}={value:?} is not a valid number")))
}

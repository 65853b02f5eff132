//! Exporter configuration.
//!
//! All settings come from environment variables and are read once at startup.
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::{Error, Result};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9675";
const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_INSPECT_CONCURRENCY: usize = 8;

/// Runtime configuration of the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `DEBUG=1` switches the default log level from `info` to `debug`.
    pub debug: bool,
    /// Docker daemon address from `DOCKER_HOST`, as read by the Docker client.
    /// `None` selects the local default socket.
    pub docker_host: Option<String>,
    /// Address the HTTP server binds to (`LISTEN_ADDR`).
    pub listen_addr: SocketAddr,
    /// Upper bound for a single scrape (`SCRAPE_TIMEOUT_SECS`).
    pub scrape_timeout: Duration,
    /// Maximum number of concurrent container inspect calls (`INSPECT_CONCURRENCY`).
    pub inspect_concurrency: usize,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if a variable is set to a value that
    /// cannot be parsed or is out of range.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let debug = lookup("DEBUG").is_some_and(|v| v.trim() == "1");
        let docker_host = lookup("DOCKER_HOST")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => parse("LISTEN_ADDR", &raw)?,
            None => parse("LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?,
        };

        let scrape_timeout = match lookup("SCRAPE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("SCRAPE_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_SCRAPE_TIMEOUT,
        };

        let inspect_concurrency = match lookup("INSPECT_CONCURRENCY") {
            Some(raw) => parse_positive("INSPECT_CONCURRENCY", &raw)?,
            None => DEFAULT_INSPECT_CONCURRENCY,
        };

        Ok(Self {
            debug,
            docker_host,
            listen_addr,
            scrape_timeout,
            inspect_concurrency,
        })
    }

    /// Default log level implied by the `DEBUG` toggle.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| Error::InvalidValue {
        var,
        value: raw.to_owned(),
        reason: err.to_string(),
    })
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let value: T = parse(var, raw)?;
    if value == T::default() {
        return Err(Error::InvalidValue {
            var,
            value: raw.to_owned(),
            reason: "must be greater than zero".to_owned(),
        });
    }
    Ok(value)
}

use std::{str::FromStr, time::Duration};

use anyhow::{bail, Context};

pub const BIND_ADDR: &str = "MURMUR_BIND_ADDR";
pub const OUTBOUND_CAPACITY: &str = "MURMUR_OUTBOUND_CAPACITY";
pub const SEND_TIMEOUT_MS: &str = "MURMUR_SEND_TIMEOUT_MS";
pub const REQUIRE_REGISTRATION: &str = "MURMUR_REQUIRE_REGISTRATION";

/// Runtime knobs, read from the process environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// Bound of each connection's outbound queue.
    pub outbound_capacity: usize,
    /// How long a fan-out waits on one recipient's full queue before giving up on it.
    pub send_timeout: Duration,
    pub require_registration: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_owned(),
            outbound_capacity: 64,
            send_timeout: Duration::from_millis(2000),
            require_registration: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Settings::default();

        let outbound_capacity = parse_or(&lookup, OUTBOUND_CAPACITY, defaults.outbound_capacity)?;
        if outbound_capacity == 0 {
            bail!("{OUTBOUND_CAPACITY} must be greater than zero");
        }

        Ok(Settings {
            bind_addr: lookup(BIND_ADDR).unwrap_or(defaults.bind_addr),
            outbound_capacity,
            send_timeout: Duration::from_millis(parse_or(
                &lookup,
                SEND_TIMEOUT_MS,
                defaults.send_timeout.as_millis() as u64,
            )?),
            require_registration: parse_or(&lookup, REQUIRE_REGISTRATION, defaults.require_registration)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

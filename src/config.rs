use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{config_error, Error};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAPS_API_BASE: &str = "maps.googleapis.com";
const DEFAULT_GEO_TIMEOUT_MS: u64 = 5000;
const DEFAULT_HOME_COUNTY: &str = "Franklin";

#[derive(Clone, Debug)]
pub struct GoogleMapsConfig {
    pub api_base: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    /// `None` when no API key is set; fares are then always estimated.
    pub google_maps: Option<GoogleMapsConfig>,
    pub geo_timeout: Duration,
    pub home_county: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| config_error("DATABASE_URL"))?;

        let google_maps = lookup("GOOGLE_MAPS_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| GoogleMapsConfig {
                api_base: lookup("GOOGLE_MAPS_API_BASE")
                    .unwrap_or_else(|| DEFAULT_MAPS_API_BASE.into()),
                api_key,
            });

        let geo_timeout_ms: u64 = parse_or(&lookup, "GEO_TIMEOUT_MS", DEFAULT_GEO_TIMEOUT_MS)?;

        Ok(Self {
            database_url,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            listen_addr: parse_or(
                &lookup,
                "LISTEN_ADDR",
                SocketAddr::from(([127, 0, 0, 1], 3000)),
            )?,
            google_maps,
            geo_timeout: Duration::from_millis(geo_timeout_ms),
            home_county: lookup("HOME_COUNTY").unwrap_or_else(|| DEFAULT_HOME_COUNTY.into()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| config_error(key)),
        None => Ok(default),
    }
}

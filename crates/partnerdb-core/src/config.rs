use crate::app_config::{AppConfig, Environment};
use crate::locator::LocateMode;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("PARTNERDB_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_or(&lookup, "PARTNERDB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PARTNERDB_LOG_LEVEL", "info");
    let partners_path = PathBuf::from(or_default(
        "PARTNERDB_PARTNERS_PATH",
        "./config/partners.yaml",
    ));

    let db_max_connections: u32 =
        parse_or(&lookup, "PARTNERDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections: u32 = parse_or(&lookup, "PARTNERDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs: u64 =
        parse_or(&lookup, "PARTNERDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let default_locate_mode: LocateMode =
        parse_or(&lookup, "PARTNERDB_DEFAULT_LOCATE_MODE", "nearest")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        partners_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        default_locate_mode,
    })
}

/// Read `var` (falling back to `default`) and parse it as `T`.
fn parse_or<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARTNERDB_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

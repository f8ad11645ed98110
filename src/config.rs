use crate::error::ConfigError;
use sqlx::postgres::PgConnectOptions;
use std::env;

/// Server maintenance database, CREATE DATABASE has to run from here.
const MAINTENANCE_DB: &str = "postgres";

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) database: String,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) admin_user: String,
}

impl Config {
    /// Resolves all connection parameters from the process environment.
    /// Fails on the first missing/empty variable, nothing gets defaulted.
    pub fn from_env() -> Result<Config, ConfigError> {
        let host = require("DB_HOST")?;
        let port_raw = require("DB_PORT")?;
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port_raw))?;
        let database = require("DB_NAME")?;
        let user = require("DB_USER")?;
        let password = require("DB_PASS")?;
        let admin_user = require("DB_ADMIN_USER")?;

        Ok(Config {
            host,
            port,
            database,
            user,
            password,
            admin_user,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Options for the maintenance database, authenticated as the admin role.
    pub fn admin_connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(MAINTENANCE_DB)
            .username(&self.admin_user)
            .password(&self.password)
    }

    /// Options for the target database, authenticated as the application role.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ConfigError::MissingVar(key.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // single test as env mutation would race between parallel tests
    #[test]
    fn resolve_config_from_env() {
        let vars = [
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "project"),
            ("DB_USER", "plant_app"),
            ("DB_PASS", "1234"),
            ("DB_ADMIN_USER", "postgres"),
        ];
        for (key, val) in vars.iter() {
            env::set_var(key, val);
        }

        let config = Config::from_env().unwrap();
        assert_eq!("project", config.database());
        assert_eq!("plant_app", config.user());
        assert_eq!(5432, config.port);

        env::set_var("DB_PORT", "54x2");
        assert!(Config::from_env().is_err());
        env::set_var("DB_PORT", "5432");

        env::set_var("DB_PASS", " ");
        assert!(Config::from_env().is_err());
        env::remove_var("DB_PASS");
        assert!(Config::from_env().is_err());
        env::set_var("DB_PASS", "1234");

        Config::from_env().unwrap();
    }
}

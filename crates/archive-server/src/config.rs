//! Upstream credentials, sourced from the environment.
//!
//! The env names predate this server and match the deployed secret
//! bindings, so they stay as-is. A missing value does not stop the
//! process: the server comes up and every data route answers with a
//! structured 500 until the credentials appear on a restart.

use std::env;

pub const API_KEY_VAR: &str = "AIRTABLE_API_KEY";
pub const BASE_ID_VAR: &str = "AIRTABLE_BASE_ID";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("missing upstream credential: {0} is not set")]
  MissingVar(&'static str),
}

/// Credentials for the upstream tabular source.
#[derive(Debug, Clone)]
pub struct Config {
  pub api_key: String,
  pub base_id: String,
}

impl Config {
  pub fn from_env() -> Result<Config, ConfigError> {
    Ok(Config { api_key: required(API_KEY_VAR)?, base_id: required(BASE_ID_VAR)? })
  }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
  match env::var(name) {
    Ok(value) if !value.trim().is_empty() => Ok(value),
    _ => Err(ConfigError::MissingVar(name)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn test_from_env_reads_both_vars() {
    env::set_var(API_KEY_VAR, "key-123");
    env::set_var(BASE_ID_VAR, "appXYZ");

    let config = Config::from_env().unwrap();
    assert_eq!(config.api_key, "key-123");
    assert_eq!(config.base_id, "appXYZ");
  }

  #[test]
  #[serial]
  fn test_missing_api_key_is_reported() {
    env::remove_var(API_KEY_VAR);
    env::set_var(BASE_ID_VAR, "appXYZ");

    assert_eq!(Config::from_env().unwrap_err(), ConfigError::MissingVar(API_KEY_VAR));
  }

  #[test]
  #[serial]
  fn test_blank_base_id_counts_as_missing() {
    env::set_var(API_KEY_VAR, "key-123");
    env::set_var(BASE_ID_VAR, "  ");

    assert_eq!(Config::from_env().unwrap_err(), ConfigError::MissingVar(BASE_ID_VAR));
  }
}

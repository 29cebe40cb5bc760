//! Pipeline configuration.
//!
//! Defaults mirror the project's `data/` layout. Values can be overridden
//! from the environment (or a `.env` file) and then from CLI flags.
//!
//! | Variable                  | Field           | Default                               |
//! |---------------------------|-----------------|---------------------------------------|
//! | `ORDERJOIN_USERS_PATH`    | `users_path`    | `data/raw/users.csv`                  |
//! | `ORDERJOIN_ORDERS_PATH`   | `orders_path`   | `data/raw/orders.csv`                 |
//! | `ORDERJOIN_DESTINATION`   | `destination`   | `data/processed/analytics_v2.sqlite`  |
//! | `ORDERJOIN_TABLE`         | `table_name`    | `user_orders`                         |
//! | `ORDERJOIN_AMOUNT_COLUMN` | `amount_column` | `amount`                              |
//! | `ORDERJOIN_DELIMITER`     | `delimiter`     | auto-detect                           |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::parser::ReadOptions;

pub const DEFAULT_USERS_PATH: &str = "data/raw/users.csv";
pub const DEFAULT_ORDERS_PATH: &str = "data/raw/orders.csv";
pub const DEFAULT_DESTINATION: &str = "data/processed/analytics_v2.sqlite";
pub const DEFAULT_TABLE_NAME: &str = "user_orders";
pub const DEFAULT_AMOUNT_COLUMN: &str = "amount";

const ENV_USERS_PATH: &str = "ORDERJOIN_USERS_PATH";
const ENV_ORDERS_PATH: &str = "ORDERJOIN_ORDERS_PATH";
const ENV_DESTINATION: &str = "ORDERJOIN_DESTINATION";
const ENV_TABLE_NAME: &str = "ORDERJOIN_TABLE";
const ENV_AMOUNT_COLUMN: &str = "ORDERJOIN_AMOUNT_COLUMN";
const ENV_DELIMITER: &str = "ORDERJOIN_DELIMITER";

/// Source and destination settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Users CSV
    pub users_path: PathBuf,

    /// Orders CSV
    pub orders_path: PathBuf,

    /// SQLite file to write
    pub destination: PathBuf,

    /// Destination table, replaced on every run
    pub table_name: String,

    /// Numeric orders column used for `order_category`
    pub amount_column: String,

    /// Delimiter for both inputs; auto-detected when `None`
    pub delimiter: Option<char>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            users_path: PathBuf::from(DEFAULT_USERS_PATH),
            orders_path: PathBuf::from(DEFAULT_ORDERS_PATH),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            amount_column: DEFAULT_AMOUNT_COLUMN.to_string(),
            delimiter: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `ORDERJOIN_*` variables, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_USERS_PATH) {
            config.users_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_ORDERS_PATH) {
            config.orders_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_DESTINATION) {
            config.destination = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_TABLE_NAME) {
            config.table_name = v.trim().to_string();
        }
        if let Some(v) = get(ENV_AMOUNT_COLUMN) {
            config.amount_column = v.trim().to_string();
        }
        // not filtered: a tab delimiter is all whitespace
        if let Some(v) = lookup(ENV_DELIMITER).filter(|v| !v.is_empty()) {
            config.delimiter = Some(parse_delimiter(ENV_DELIMITER, &v)?);
        }

        Ok(config)
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            delimiter: self.delimiter,
        }
    }
}

/// Parse a delimiter setting. Accepts one ASCII character or `\t`.
pub fn parse_delimiter(key: &str, value: &str) -> Result<char, ConfigError> {
    if value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a single ASCII character, got '{}'", value),
        }),
    }
}

//! Table-wide defaults.
//!
//! One immutable value handed to table construction. Columns and filters take
//! any presentation setting they leave unset from here.

use crate::error::ConfigError;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefaults {
    #[serde(default = "default_per_page_options")]
    pub per_page_options: Vec<u32>,
    #[serde(default)]
    pub sticky_header: bool,
    #[serde(default)]
    pub sticky_pagination: bool,
    #[serde(default)]
    pub resizable: bool,
    #[serde(default = "default_true_label")]
    pub true_label: String,
    #[serde(default = "default_false_label")]
    pub false_label: String,
    /// chrono format string applied by date columns.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_icon: Option<String>,
}

fn default_per_page_options() -> Vec<u32> {
    vec![10, 25, 50, 100, 250, 500]
}

fn default_true_label() -> String {
    "True".to_string()
}

fn default_false_label() -> String {
    "False".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            per_page_options: default_per_page_options(),
            sticky_header: false,
            sticky_pagination: false,
            resizable: false,
            true_label: default_true_label(),
            false_label: default_false_label(),
            date_format: default_date_format(),
            true_icon: None,
            false_icon: None,
        }
    }
}

impl TableDefaults {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let defaults: TableDefaults = serde_yaml::from_str(&contents)?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_per_page_options(&self.per_page_options)?;
        validate_date_format(&self.date_format)
    }
}

pub(crate) fn validate_per_page_options(options: &[u32]) -> Result<(), ConfigError> {
    if options.is_empty() {
        return Err(ConfigError::InvalidDefaults(
            "per_page_options must not be empty".to_string(),
        ));
    }
    if options.contains(&0) {
        return Err(ConfigError::InvalidDefaults(
            "per_page_options entries must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidOptionValue {
            option: "date_format".to_string(),
            expected: "a valid chrono format string",
        });
    }
    Ok(())
}

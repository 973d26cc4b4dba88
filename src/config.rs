use anyhow::Context;
use config::{Config, Environment};
use rusoto_core::Region;
use serde::Deserialize;
use std::str::FromStr;

use crate::error::MonitorError;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Tag key an instance must carry to be reported
    #[serde(default = "default_tag_key")]
    pub tag_key: String,

    /// Required value of `tag_key`
    #[serde(default = "default_tag_value")]
    pub tag_value: String,

    /// Bucket holding the daily reports
    pub report_bucket: String,

    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,

    #[serde(default = "default_report_file_name")]
    pub report_file_name: String,

    /// AWS region name; the default provider chain is used when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tag_key() -> String {
    "adhoc".to_string()
}

fn default_tag_value() -> String {
    "true".to_string()
}

fn default_report_prefix() -> String {
    "reports".to_string()
}

fn default_report_file_name() -> String {
    "instances.csv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, MonitorError> {
        let config: MonitorConfig = Config::builder()
            .add_source(Environment::with_prefix("MONITOR"))
            .build()?
            .try_deserialize()?;
        if config.report_bucket.trim().is_empty() {
            return Err(MonitorError::Config(config::ConfigError::Message(
                "report_bucket must not be empty".to_string(),
            )));
        }
        Ok(config)
    }

    pub fn region(&self) -> anyhow::Result<Region> {
        match self.region.as_deref() {
            Some(name) => Region::from_str(name)
                .with_context(|| format!("unknown AWS region {:?}", name)),
            None => Ok(Region::default()),
        }
    }
}

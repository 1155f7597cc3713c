//! Client options, from code, serde, or environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use canvas::consts::DEFAULT_MIN_SCALE;
use frames::Compression;
use serde::Deserialize;

pub const DEFAULT_TOPIC: &str = "/map";

/// Error returned by [`ClientOptions::from_env`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Options recognized by [`crate::OccupancyGridClient`].
///
/// The bridge connection and the host container are passed to the
/// constructor directly; everything else lives here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Occupancy grid topic to listen to.
    pub topic: String,
    /// Keep the subscription open after the first map (e.g. for SLAM).
    pub continuous: bool,
    /// Compression requested from the bridge.
    pub compression: Compression,
    /// Smallest scale a wheel zoom may shrink the scene to.
    pub min_scale: f64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_owned(),
            continuous: false,
            compression: Compression::None,
            min_scale: DEFAULT_MIN_SCALE,
        }
    }
}

impl ClientOptions {
    /// Build options from environment variables, defaulting anything unset.
    ///
    /// - `MAP_TOPIC`: topic name (default `/map`)
    /// - `MAP_CONTINUOUS`: `true`/`false`/`1`/`0` (default `false`)
    /// - `MAP_COMPRESSION`: `none` or `png` (default `none`)
    /// - `MAP_MIN_SCALE`: positive number (default `0.001`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let topic = env_value("MAP_TOPIC").unwrap_or(defaults.topic);
        let continuous = match env_value("MAP_CONTINUOUS") {
            Some(raw) => parse_bool("MAP_CONTINUOUS", &raw)?,
            None => defaults.continuous,
        };
        let compression = match env_value("MAP_COMPRESSION") {
            Some(raw) => Compression::from_name(&raw)
                .ok_or(ConfigError::Invalid { var: "MAP_COMPRESSION", value: raw })?,
            None => defaults.compression,
        };
        let min_scale = match env_value("MAP_MIN_SCALE") {
            Some(raw) => parse_positive("MAP_MIN_SCALE", &raw)?,
            None => defaults.min_scale,
        };
        Ok(Self { topic, continuous, compression, min_scale })
    }

    /// Set the topic name.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set continuous mode.
    #[must_use]
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Set the requested compression.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_owned()),
        _ => None,
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConfigError::Invalid { var, value: other.to_owned() }),
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConfigError::Invalid { var, value: raw.to_owned() }),
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How authoritatively a piece of metadata was configured.
///
/// Variants are declared from least to most authoritative so the derived
/// `Ord` is the precedence order: `Convention < DataAnnotation < Explicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationSource {
    /// Inferred by a convention
    Convention,
    /// Declared through an attribute on the type
    DataAnnotation,
    /// Set by user configuration code
    Explicit,
}

impl ConfigurationSource {
    /// Whether a decision made with `self` may replace one made with `other`.
    /// Nothing configured (`None`) can always be overridden.
    pub fn overrides(self, other: Option<ConfigurationSource>) -> bool {
        other.is_none_or(|other| self >= other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationSource::Convention => "convention",
            ConfigurationSource::DataAnnotation => "data_annotation",
            ConfigurationSource::Explicit => "explicit",
        }
    }
}

impl Default for ConfigurationSource {
    fn default() -> Self {
        ConfigurationSource::Explicit
    }
}

impl fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown configuration source '{0}' (expected convention, data_annotation or explicit)")]
pub struct ParseConfigurationSourceError(pub String);

impl FromStr for ConfigurationSource {
    type Err = ParseConfigurationSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "convention" => Ok(ConfigurationSource::Convention),
            "data_annotation" | "dataannotation" => Ok(ConfigurationSource::DataAnnotation),
            "explicit" => Ok(ConfigurationSource::Explicit),
            _ => Err(ParseConfigurationSourceError(s.to_string())),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::metadata::configuration_source::ConfigurationSource;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Settings applied while turning a model definition into a [`Model`](crate::metadata::Model)
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelBuildConfig {
    /// Source recorded for entity types and ignores coming from a definition file
    pub default_configuration_source: ConfigurationSource,

    /// Store type given to spatial properties that do not declare one
    #[validate(custom(function = "validate_spatial_store_type"))]
    pub default_spatial_store_type: String,

    /// Whether finalizing requires a primary key on every root entity type
    pub validate_on_finalize: bool,

    /// Maximum nesting of owned types below a root entity type
    #[validate(range(
        min = 1,
        max = 64,
        message = "Max ownership depth must be between 1 and 64"
    ))]
    pub max_ownership_depth: u32,
}

impl Default for ModelBuildConfig {
    fn default() -> Self {
        Self {
            default_configuration_source: ConfigurationSource::Explicit,
            default_spatial_store_type: "geometry".to_string(),
            validate_on_finalize: true,
            max_ownership_depth: 8,
        }
    }
}

impl ModelBuildConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            default_configuration_source: parse_env_var("RELMODEL_DEFAULT_SOURCE", "explicit")?,
            default_spatial_store_type: env::var("RELMODEL_SPATIAL_STORE_TYPE")
                .unwrap_or_else(|_| "geometry".to_string()),
            validate_on_finalize: parse_env_var("RELMODEL_VALIDATE_ON_FINALIZE", "true")?,
            max_ownership_depth: parse_env_var("RELMODEL_MAX_OWNERSHIP_DEPTH", "8")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            default_configuration_source: cli.default_configuration_source,
            default_spatial_store_type: cli.default_spatial_store_type,
            validate_on_finalize: cli.validate_on_finalize,
            max_ownership_depth: cli.max_ownership_depth,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file. Missing keys take their defaults.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply(read_yaml_overlay(path)?);
        config.validate()?;
        Ok(config)
    }

    /// Apply the keys a YAML file sets on top of this configuration.
    /// Keys the file leaves out keep their current values.
    pub fn merge_yaml_file<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let mut merged = self.clone();
        merged.apply(read_yaml_overlay(path)?);
        merged.validate()?;
        *self = merged;
        Ok(())
    }

    /// Merge with another configuration (the other one wins)
    pub fn merge(&mut self, other: Self) {
        self.default_configuration_source = other.default_configuration_source;
        self.default_spatial_store_type = other.default_spatial_store_type;
        self.validate_on_finalize = other.validate_on_finalize;
        self.max_ownership_depth = other.max_ownership_depth;
    }

    fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(source) = overlay.default_configuration_source {
            self.default_configuration_source = source;
        }
        if let Some(store_type) = overlay.default_spatial_store_type {
            self.default_spatial_store_type = store_type;
        }
        if let Some(validate) = overlay.validate_on_finalize {
            self.validate_on_finalize = validate;
        }
        if let Some(depth) = overlay.max_ownership_depth {
            self.max_ownership_depth = depth;
        }
    }
}

/// The keys a build settings file actually sets
#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    default_configuration_source: Option<ConfigurationSource>,
    default_spatial_store_type: Option<String>,
    validate_on_finalize: Option<bool>,
    max_ownership_depth: Option<u32>,
}

fn read_yaml_overlay<P: AsRef<std::path::Path>>(path: P) -> Result<ConfigOverlay, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        field: "yaml_file".to_string(),
        value: "file read failed".to_string(),
        source: Box::new(e),
    })?;

    // An empty file sets nothing
    if content.trim().is_empty() {
        return Ok(ConfigOverlay::default());
    }

    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        field: "yaml_content".to_string(),
        value: content,
        source: Box::new(e),
    })
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub default_configuration_source: ConfigurationSource,
    pub default_spatial_store_type: String,
    pub validate_on_finalize: bool,
    pub max_ownership_depth: u32,
}

fn validate_spatial_store_type(store_type: &str) -> Result<(), ValidationError> {
    if store_type.eq_ignore_ascii_case("geometry") || store_type.eq_ignore_ascii_case("geography") {
        Ok(())
    } else {
        let mut error = ValidationError::new("spatial_store_type");
        error.message = Some("Spatial store type must be 'geometry' or 'geography'".into());
        Err(error)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_KEYS: [&str; 4] = [
        "RELMODEL_DEFAULT_SOURCE",
        "RELMODEL_SPATIAL_STORE_TYPE",
        "RELMODEL_VALIDATE_ON_FINALIZE",
        "RELMODEL_MAX_OWNERSHIP_DEPTH",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn test_default_config() {
        let config = ModelBuildConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_spatial_store_type, "geometry");
        assert_eq!(config.max_ownership_depth, 8);
        assert!(config.validate_on_finalize);
    }

    #[test]
    fn test_invalid_store_type() {
        let config = ModelBuildConfig {
            default_spatial_store_type: "varbinary".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_type_is_case_insensitive() {
        let config = ModelBuildConfig {
            default_spatial_store_type: "Geography".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_ownership_depth() {
        let config = ModelBuildConfig {
            max_ownership_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        unsafe {
            env::set_var("RELMODEL_DEFAULT_SOURCE", "convention");
            env::set_var("RELMODEL_SPATIAL_STORE_TYPE", "geography");
            env::set_var("RELMODEL_MAX_OWNERSHIP_DEPTH", "3");
        }

        let config = ModelBuildConfig::from_env().unwrap();
        assert_eq!(
            config.default_configuration_source,
            ConfigurationSource::Convention
        );
        assert_eq!(config.default_spatial_store_type, "geography");
        assert_eq!(config.max_ownership_depth, 3);
        assert!(config.validate_on_finalize);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_values() {
        clear_env();
        unsafe { env::set_var("RELMODEL_VALIDATE_ON_FINALIZE", "sometimes") };
        assert!(matches!(
            ModelBuildConfig::from_env(),
            Err(ConfigError::Parse { .. })
        ));

        clear_env();
        unsafe { env::set_var("RELMODEL_MAX_OWNERSHIP_DEPTH", "100") };
        assert!(matches!(
            ModelBuildConfig::from_env(),
            Err(ConfigError::Validation(_))
        ));

        clear_env();
    }

    #[test]
    fn test_from_yaml_file_with_partial_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_spatial_store_type: geography").unwrap();
        writeln!(file, "validate_on_finalize: false").unwrap();

        let config = ModelBuildConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.default_spatial_store_type, "geography");
        assert!(!config.validate_on_finalize);
        assert_eq!(config.max_ownership_depth, 8);
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let result = ModelBuildConfig::from_yaml_file("/nonexistent/relmodel.yaml");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    #[serial]
    fn test_merge_yaml_file_keeps_unset_keys() {
        clear_env();
        unsafe {
            env::set_var("RELMODEL_SPATIAL_STORE_TYPE", "geography");
            env::set_var("RELMODEL_MAX_OWNERSHIP_DEPTH", "3");
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "validate_on_finalize: false").unwrap();

        let mut config = ModelBuildConfig::from_env().unwrap();
        config.merge_yaml_file(file.path()).unwrap();
        assert_eq!(config.default_spatial_store_type, "geography");
        assert_eq!(config.max_ownership_depth, 3);
        assert!(!config.validate_on_finalize);

        clear_env();
    }

    #[test]
    fn test_merge_yaml_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_spatial_store_type: varbinary").unwrap();

        let mut config = ModelBuildConfig::default();
        assert!(matches!(
            config.merge_yaml_file(file.path()),
            Err(ConfigError::Validation(_))
        ));
        assert_eq!(config, ModelBuildConfig::default());
    }

    #[test]
    fn test_empty_yaml_file_sets_nothing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = ModelBuildConfig {
            max_ownership_depth: 5,
            ..Default::default()
        };
        config.merge_yaml_file(file.path()).unwrap();
        assert_eq!(config.max_ownership_depth, 5);
    }

    #[test]
    fn test_merge() {
        let mut config = ModelBuildConfig::default();
        config.merge(ModelBuildConfig {
            validate_on_finalize: false,
            ..Default::default()
        });
        assert!(!config.validate_on_finalize);
    }
}

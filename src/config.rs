use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value `{value}` for {field}: {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid graph config: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Schema graph configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Catalog schemas whose tables seed the alias namespace
    #[validate(
        length(min = 1, message = "At least one catalog schema is required"),
        custom(function = "validate_schema_names")
    )]
    pub schemas: Vec<String>,

    /// Deepest level whose foreign keys are still expanded
    #[validate(range(min = 1, max = 64, message = "Max depth must be between 1 and 64"))]
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Optional YAML catalog definition (used by the CLI)
    #[serde(default)]
    pub catalog_path: Option<String>,
}

fn default_max_depth() -> u32 {
    16
}

#[allow(clippy::ptr_arg)]
fn validate_schema_names(schemas: &Vec<String>) -> Result<(), ValidationError> {
    if schemas.iter().any(|s| s.trim().is_empty()) {
        let mut err = ValidationError::new("empty_schema");
        err.message = Some("Schema names cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            schemas: vec!["public".to_string()],
            max_depth: default_max_depth(),
            catalog_path: None,
        }
    }
}

impl GraphConfig {
    pub fn with_schemas<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemas: schemas.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let schemas = env::var("RELGRAPH_SCHEMAS").unwrap_or_else(|_| "public".to_string());
        let config = Self {
            schemas: split_list(&schemas),
            max_depth: env_or("RELGRAPH_MAX_DEPTH", default_max_depth())?,
            catalog_path: env::var("RELGRAPH_CATALOG").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: path,
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Split a comma separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `key` parsed as `T`, or `default` when the variable is unset
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    let value = raw.trim().to_string();
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

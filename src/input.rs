//! # Input Configuration Module
//!
//! This module provides configuration parsing and validation for subx2nc jobs.
//! A job names the forecast systems to fetch, the fields to fetch from each, and
//! where to write the results. Configuration files are JSON or YAML.
//!
//! ## Configuration Structure
//!
//! - **out_path**: Base directory for output files
//! - **fields**: Variables paired with their pressure-level labels
//! - **models**: Modeling groups paired with their model names
//! - **base_url** / **forecast_type**: Where the SubX catalog lives (optional)
//! - **fill_value**: Missing-data marker (optional, reserved)
//! - **metadata**: Strings copied into every output file (optional)
//!
//! ## Example Usage
//!
//! ```rust
//! use subx2nc::input::JobConfig;
//!
//! let json = r#"
//! {
//!   "out_path": "/data/subx",
//!   "fields": [{"variable": "ua", "plev": "850"}],
//!   "models": [{"group": "GMAO", "model": "GEOS_V2p1"}]
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! assert_eq!(config.forecast_type, "hindcast");
//! # Ok::<(), subx2nc::error::FetchError>(())
//! ```

use crate::catalog::{DEFAULT_BASE_URL, DEFAULT_FORECAST_TYPE};
use crate::error::{FetchError, FetchResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fill value declared for SubX output. Nothing writes it yet.
pub const DEFAULT_FILL_VALUE: f32 = -9.99e8;

/// Main configuration structure for subx2nc jobs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobConfig {
    /// Base directory for output files
    pub out_path: PathBuf,
    /// Fields to fetch from every model
    pub fields: Vec<FieldConfig>,
    /// Forecast systems to fetch
    pub models: Vec<ModelConfig>,
    /// Root of the SubX catalog
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Catalog branch, `hindcast` or `forecast`
    #[serde(default = "default_forecast_type")]
    pub forecast_type: String,
    /// Missing-data marker, reserved for masking
    #[serde(default = "default_fill_value")]
    pub fill_value: f32,
    /// Strings copied into the global attributes of every artifact
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// A variable and the pressure-level label it is fetched at.
///
/// The label is used verbatim in output paths (`"850"`, `"2m"`, `"sfc"`). It is
/// parsed as an integer only when the remote field has a pressure-level axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldConfig {
    pub variable: String,
    pub plev: String,
}

/// A modeling group and one of its models.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelConfig {
    pub group: String,
    pub model: String,
}

/// Global attribute strings written to every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub comments: String,
    pub source: String,
    /// Prefix of the `Institution` attribute; the source URL is appended.
    pub institution: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        MetadataConfig {
            comments: "Subseasonal Experiment (SubX) project http://cola.gmu.edu/subx/".to_string(),
            source: "subx2nc".to_string(),
            institution: "IRI".to_string(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_forecast_type() -> String {
    DEFAULT_FORECAST_TYPE.to_string()
}

fn default_fill_value() -> f32 {
    DEFAULT_FILL_VALUE
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file.
    ///
    /// Files ending in `.yaml` or `.yml` are read as YAML, anything else as JSON.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use subx2nc::input::JobConfig;
    ///
    /// let config = JobConfig::from_file("subx.yaml")?;
    /// println!("Fetching {} fields", config.fields.len());
    /// # Ok::<(), subx2nc::error::FetchError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> FetchResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FetchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Loads a job configuration from a JSON string.
    pub fn from_json(json_str: &str) -> FetchResult<Self> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    /// Loads a job configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> FetchResult<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    /// Checks that the job names at least one field and one model, and that no
    /// name is empty.
    pub fn validate(&self) -> FetchResult<()> {
        if self.out_path.as_os_str().is_empty() {
            return Err(FetchError::Config("out_path is empty".to_string()));
        }
        if self.fields.is_empty() {
            return Err(FetchError::Config("no fields configured".to_string()));
        }
        if self.models.is_empty() {
            return Err(FetchError::Config("no models configured".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(FetchError::Config("base_url is empty".to_string()));
        }
        if self.forecast_type.trim().is_empty() {
            return Err(FetchError::Config("forecast_type is empty".to_string()));
        }

        for (i, field) in self.fields.iter().enumerate() {
            if field.variable.trim().is_empty() {
                return Err(FetchError::Config(format!("field {} has an empty variable", i + 1)));
            }
            if field.plev.trim().is_empty() {
                return Err(FetchError::Config(format!(
                    "field {} ('{}') has an empty plev",
                    i + 1,
                    field.variable
                )));
            }
        }
        for (i, model) in self.models.iter().enumerate() {
            if model.group.trim().is_empty() || model.model.trim().is_empty() {
                return Err(FetchError::Config(format!(
                    "model {} needs both a group and a model name",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Number of (model, field) pairs the job visits.
    pub fn variable_count(&self) -> usize {
        self.models.len() * self.fields.len()
    }
}

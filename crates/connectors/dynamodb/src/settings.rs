//! Job configuration.
//!
//! Settings come from a TOML file, overridden by `IGLOO_DYNAMODB__*`
//! environment variables (`__` separates nested keys, e.g.
//! `IGLOO_DYNAMODB__RANGE_KEY__MAX`). Key values are written in their
//! configuration rendering, see [`TypedValue::parse`].

use serde::Deserialize;

use crate::split::numeric::{NumericSettings, DEFAULT_DIVISION_SCALE, MIN_POSITIVE_VALUE};
use crate::split::{KeyField, SplitRequest, SplitterSettings, DEFAULT_MAX_SPLITS};
use crate::types::{ComparisonOperator, KeyType, TypedValue};
use crate::writer::WriterSettings;
use crate::Result;
use igloo_common::Error;

pub const CONFIG_PATH_ENV: &str = "IGLOO_DYNAMODB_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "crates/igloo/config/default.toml";
const ENV_PREFIX: &str = "IGLOO_DYNAMODB";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub table_name: String,
    #[serde(default = "default_parallelism")]
    pub parallelism: i64,
    pub hash_key: HashKeySettings,
    #[serde(default)]
    pub range_key: Option<RangeKeySettings>,
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub writer: WriterSettings,
}

fn default_parallelism() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct HashKeySettings {
    pub name: String,
    #[serde(rename = "type", default)]
    pub key_type: KeyType,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeKeySettings {
    pub name: String,
    #[serde(rename = "type", default)]
    pub key_type: KeyType,
    #[serde(default)]
    pub operator: ComparisonOperator,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub interpolate: bool,
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub min_increment: String,
    pub division_scale: u32,
    pub max_splits: i64,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            min_increment: MIN_POSITIVE_VALUE.to_string(),
            division_scale: DEFAULT_DIVISION_SCALE,
            max_splits: DEFAULT_MAX_SPLITS,
        }
    }
}

impl Settings {
    /// Loads `path`, or the file named by `IGLOO_DYNAMODB_CONFIG_PATH`, or
    /// the default location, then applies environment overrides.
    pub fn new(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_string(),
            None => std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        };
        let s = config::Config::builder()
            .add_source(config::File::with_name(&path).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(config_error)?;
        s.try_deserialize().map_err(config_error)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let s = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .map_err(config_error)?;
        s.try_deserialize().map_err(config_error)
    }

    pub fn splitter_settings(&self) -> Result<SplitterSettings> {
        let min_increment = self.splitter.min_increment.parse()?;
        Ok(SplitterSettings {
            numeric: NumericSettings { min_increment, division_scale: self.splitter.division_scale },
            max_splits: self.splitter.max_splits,
        })
    }

    /// Builds the split request this configuration describes.
    pub fn split_request(&self) -> Result<SplitRequest> {
        let hash_key = KeyField::new(&self.hash_key.name, self.hash_key.key_type);
        let mut request = SplitRequest::new(hash_key).with_parallelism(self.parallelism);
        if let Some(value) = &self.hash_key.value {
            request = request.with_hash_key_value(TypedValue::parse(self.hash_key.key_type, value)?)?;
        }

        let Some(range) = &self.range_key else {
            return Ok(request);
        };
        request = request.with_range_key(KeyField::new(&range.name, range.key_type));
        let parse = |raw: &String| TypedValue::parse(range.key_type, raw);

        if range.interpolate {
            if !range.values.is_empty() {
                return Err(Error::Config(
                    "range_key.values cannot be combined with range_key.interpolate".to_string(),
                ));
            }
            let min = range.min.as_ref().map(parse).transpose()?;
            let max = range.max.as_ref().map(parse).transpose()?;
            request.with_interpolation(min, max)
        } else {
            let values = range.values.iter().map(parse).collect::<Result<Vec<_>>>()?;
            request.with_range_condition(range.operator, values)
        }
    }
}

fn config_error(e: config::ConfigError) -> Error {
    Error::Config(e.to_string())
}

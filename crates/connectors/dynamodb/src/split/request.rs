//! What to split: key attributes, hash key value, and the range condition.

use serde::{Deserialize, Serialize};

use crate::types::{ComparisonOperator, KeyType, TypedValue};
use crate::Result;
use igloo_common::Error;

/// A declared key attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub key_type: KeyType,
}

impl KeyField {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self { name: name.into(), key_type }
    }

    pub fn is_declared(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Which part of the range key a job covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// A fixed condition; no values means the whole partition.
    Explicit { operator: ComparisonOperator, values: Vec<TypedValue> },
    /// Cut `[min, max]` into parallel pieces.
    Interpolate { min: Option<TypedValue>, max: Option<TypedValue> },
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::Explicit { operator: ComparisonOperator::Eq, values: Vec::new() }
    }
}

/// Everything split generation needs to know about a job.
///
/// Values are checked against their declared key types as they are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    hash_key: KeyField,
    hash_key_value: Option<TypedValue>,
    range_key: KeyField,
    parallelism: i64,
    range: RangeSpec,
}

impl SplitRequest {
    pub fn new(hash_key: KeyField) -> Self {
        Self {
            hash_key,
            hash_key_value: None,
            range_key: KeyField::default(),
            parallelism: 1,
            range: RangeSpec::default(),
        }
    }

    pub fn with_hash_key_value(mut self, value: TypedValue) -> Result<Self> {
        value.expect_type(self.hash_key.key_type)?;
        self.hash_key_value = Some(value);
        Ok(self)
    }

    pub fn with_range_key(mut self, range_key: KeyField) -> Self {
        self.range_key = range_key;
        self
    }

    pub fn with_parallelism(mut self, parallelism: i64) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Uses a fixed range condition. Replaces any interpolation bounds.
    pub fn with_range_condition(
        mut self,
        operator: ComparisonOperator,
        values: Vec<TypedValue>,
    ) -> Result<Self> {
        if !values.is_empty() {
            self.require_range_key()?;
            operator.check_key_condition(&values)?;
            for value in &values {
                value.expect_type(self.range_key.key_type)?;
            }
        }
        self.range = RangeSpec::Explicit { operator, values };
        Ok(self)
    }

    /// Requests interpolation between `min` and `max`. Replaces any fixed
    /// condition. Absent bounds are allowed and degrade to a single split.
    pub fn with_interpolation(
        mut self,
        min: Option<TypedValue>,
        max: Option<TypedValue>,
    ) -> Result<Self> {
        self.require_range_key()?;
        for value in min.iter().chain(max.iter()) {
            value.expect_type(self.range_key.key_type)?;
        }
        self.range = RangeSpec::Interpolate { min, max };
        Ok(self)
    }

    fn require_range_key(&self) -> Result<()> {
        if self.range_key.is_declared() {
            Ok(())
        } else {
            Err(Error::Config("a range condition needs a named range key".to_string()))
        }
    }

    pub fn hash_key(&self) -> &KeyField {
        &self.hash_key
    }

    pub fn hash_key_value(&self) -> Option<&TypedValue> {
        self.hash_key_value.as_ref()
    }

    pub fn range_key(&self) -> &KeyField {
        &self.range_key
    }

    pub fn parallelism(&self) -> i64 {
        self.parallelism
    }

    pub fn range(&self) -> &RangeSpec {
        &self.range
    }
}

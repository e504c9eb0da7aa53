//! Units of parallel work and their byte encoding.
//!
//! Splits are plain values: built once by the splitter, shipped to a worker
//! as bytes, decoded and consumed once. The encoding is bincode with fixed
//! width integers, so enum tags travel as 32-bit ordinals and strings and
//! lists as length-prefixed runs, in field declaration order.

use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::split::request::KeyField;
use crate::store::KeyCondition;
use crate::types::{ComparisonOperator, KeyType, TypedValue};
use crate::Result;
use igloo_common::Error;

/// Upper bound on an encoded split.
const MAX_ENCODED_LEN: u64 = 1 << 20;

/// What the batch framework asks of every split.
pub trait InputSplit {
    /// Size in bytes, when known.
    fn length(&self) -> u64 {
        0
    }

    /// Hosts that would read this split locally.
    fn preferred_locations(&self) -> Vec<String> {
        Vec::new()
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ENCODED_LEN)
        .reject_trailing_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    codec().serialize(value).map_err(|e| Error::Decode(format!("failed to encode split: {e}")))
}

fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    codec().deserialize(bytes).map_err(|e| Error::Decode(format!("malformed split: {e}")))
}

/// A query against one hash key partition, optionally narrowed on the range key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySplit {
    hash_key_type: KeyType,
    hash_key_value: Option<TypedValue>,
    hash_key_name: String,
    range_key_type: KeyType,
    range_key_values: Vec<TypedValue>,
    range_key_name: String,
    range_key_operator: ComparisonOperator,
}

impl QuerySplit {
    pub fn new(
        hash_key: &KeyField,
        hash_key_value: Option<TypedValue>,
        range_key: &KeyField,
        operator: ComparisonOperator,
        values: Vec<TypedValue>,
    ) -> Self {
        Self {
            hash_key_type: hash_key.key_type,
            hash_key_value,
            hash_key_name: hash_key.name.clone(),
            range_key_type: range_key.key_type,
            range_key_values: values,
            range_key_name: range_key.name.clone(),
            range_key_operator: operator,
        }
    }

    /// The whole partition of `hash_key_value`, no range condition.
    pub fn partition(hash_key: &KeyField, hash_key_value: Option<TypedValue>, range_key: &KeyField) -> Self {
        Self::new(hash_key, hash_key_value, range_key, ComparisonOperator::Eq, Vec::new())
    }

    pub fn has_hash_key(&self) -> bool {
        self.hash_key_value.is_some()
    }

    pub fn has_range_key(&self) -> bool {
        !self.range_key_values.is_empty()
    }

    pub fn hash_key_type(&self) -> KeyType {
        self.hash_key_type
    }

    pub fn hash_key_value(&self) -> Option<&TypedValue> {
        self.hash_key_value.as_ref()
    }

    pub fn hash_key_name(&self) -> &str {
        &self.hash_key_name
    }

    pub fn range_key_type(&self) -> KeyType {
        self.range_key_type
    }

    pub fn range_key_values(&self) -> &[TypedValue] {
        &self.range_key_values
    }

    pub fn range_key_name(&self) -> &str {
        &self.range_key_name
    }

    pub fn range_key_operator(&self) -> ComparisonOperator {
        self.range_key_operator
    }

    /// Key conditions for a store query: hash key equality, then the range
    /// condition if there is one.
    pub fn key_conditions(&self) -> Vec<KeyCondition> {
        let mut conditions = Vec::with_capacity(2);
        if let Some(value) = &self.hash_key_value {
            conditions.push(KeyCondition::new(
                self.hash_key_name.clone(),
                ComparisonOperator::Eq,
                vec![value.clone()],
            ));
        }
        if self.has_range_key() {
            conditions.push(KeyCondition::new(
                self.range_key_name.clone(),
                self.range_key_operator,
                self.range_key_values.clone(),
            ));
        }
        conditions
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let split: Self = decode(bytes)?;
        split.validate()?;
        Ok(split)
    }

    fn validate(&self) -> Result<()> {
        if let Some(value) = &self.hash_key_value {
            if value.key_type() != self.hash_key_type {
                return Err(Error::Decode(format!(
                    "hash key value is {} but the key is declared {}",
                    value.key_type(),
                    self.hash_key_type
                )));
            }
        }
        if self.range_key_values.len() > 2 {
            return Err(Error::Decode(format!(
                "{} range key values, at most 2 allowed",
                self.range_key_values.len()
            )));
        }
        if let Some(value) = self.range_key_values.iter().find(|v| v.key_type() != self.range_key_type) {
            return Err(Error::Decode(format!(
                "range key value is {} but the key is declared {}",
                value.key_type(),
                self.range_key_type
            )));
        }
        Ok(())
    }
}

impl InputSplit for QuerySplit {}

impl fmt::Display for QuerySplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hash_key_value {
            Some(value) => write!(f, "{} = {value}", self.hash_key_name)?,
            None => write!(f, "{} = *", self.hash_key_name)?,
        }
        if self.has_range_key() {
            let values: Vec<String> = self.range_key_values.iter().map(ToString::to_string).collect();
            write!(f, " AND {} {} [{}]", self.range_key_name, self.range_key_operator, values.join(", "))?;
        }
        Ok(())
    }
}

/// One segment of a parallel full-table scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSplit {
    segment: u32,
    total_segments: u32,
}

impl ScanSplit {
    pub fn new(segment: u32, total_segments: u32) -> Result<Self> {
        let split = Self { segment, total_segments };
        split.validate()?;
        Ok(split)
    }

    pub fn segment(&self) -> u32 {
        self.segment
    }

    pub fn total_segments(&self) -> u32 {
        self.total_segments
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let split: Self = decode(bytes)?;
        split.validate().map_err(|e| Error::Decode(e.to_string()))?;
        Ok(split)
    }

    fn validate(&self) -> Result<()> {
        if self.segment < self.total_segments {
            Ok(())
        } else {
            Err(Error::InvalidRange(format!(
                "segment {} outside 0..{}",
                self.segment, self.total_segments
            )))
        }
    }
}

impl InputSplit for ScanSplit {}

impl fmt::Display for ScanSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment {}/{}", self.segment, self.total_segments)
    }
}

//! Key types, attribute values and comparison operators.
//!
//! The declaration order of [`KeyType`] and [`ComparisonOperator`] is part of
//! the split wire format: both are encoded as their ordinal.

use std::cmp::Ordering;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::decimal::KeyDecimal;
use crate::Result;
use igloo_common::Error;

/// Attribute type of a key or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    #[default]
    #[serde(alias = "S")]
    String,
    #[serde(alias = "N")]
    Number,
    #[serde(alias = "B")]
    Binary,
    #[serde(alias = "SS")]
    StringSet,
    #[serde(alias = "NS")]
    NumberSet,
    #[serde(alias = "BS")]
    BinarySet,
}

impl KeyType {
    /// Short store tag, e.g. `"N"`.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyType::String => "S",
            KeyType::Number => "N",
            KeyType::Binary => "B",
            KeyType::StringSet => "SS",
            KeyType::NumberSet => "NS",
            KeyType::BinarySet => "BS",
        }
    }

    /// Scalar types have a total order the store can range over.
    pub fn is_scalar(&self) -> bool {
        matches!(self, KeyType::String | KeyType::Number | KeyType::Binary)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single attribute value. The populated variant is its [`KeyType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypedValue {
    S(String),
    /// Numbers travel as their decimal string, exactly as the store does.
    N(String),
    B(Vec<u8>),
    SS(Vec<String>),
    NS(Vec<String>),
    BS(Vec<Vec<u8>>),
}

impl TypedValue {
    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::S(value.into())
    }

    /// Builds a number value, rejecting anything that is not a decimal literal.
    pub fn number(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        value.parse::<KeyDecimal>()?;
        Ok(TypedValue::N(value))
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        TypedValue::B(value.into())
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            TypedValue::S(_) => KeyType::String,
            TypedValue::N(_) => KeyType::Number,
            TypedValue::B(_) => KeyType::Binary,
            TypedValue::SS(_) => KeyType::StringSet,
            TypedValue::NS(_) => KeyType::NumberSet,
            TypedValue::BS(_) => KeyType::BinarySet,
        }
    }

    /// Fails unless this value carries the declared type.
    pub fn expect_type(&self, declared: KeyType) -> Result<()> {
        if self.key_type() == declared {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: declared.tag().to_string(),
                found: self.key_type().tag().to_string(),
            })
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&str> {
        match self {
            TypedValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::B(b) => Some(b),
            _ => None,
        }
    }

    /// Store ordering between two scalar values of the same type.
    ///
    /// Strings and binaries compare bytewise, numbers by magnitude. Returns
    /// `None` for sets, mixed types and unparsable numbers.
    pub fn key_cmp(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::S(a), TypedValue::S(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (TypedValue::B(a), TypedValue::B(b)) => Some(a.cmp(b)),
            (TypedValue::N(a), TypedValue::N(b)) => {
                let a = a.parse::<KeyDecimal>().ok()?;
                let b = b.parse::<KeyDecimal>().ok()?;
                Some(a.cmp(&b))
            }
            _ => None,
        }
    }

    /// `BEGINS_WITH` semantics; only strings and binaries have prefixes.
    pub fn begins_with(&self, prefix: &TypedValue) -> bool {
        match (self, prefix) {
            (TypedValue::S(a), TypedValue::S(p)) => a.starts_with(p.as_str()),
            (TypedValue::B(a), TypedValue::B(p)) => a.starts_with(p),
            _ => false,
        }
    }

    /// Parses a value from its configuration rendering.
    ///
    /// Strings and numbers are taken verbatim, binaries are standard base64
    /// and sets are JSON arrays of their members' renderings.
    pub fn parse(key_type: KeyType, encoded: &str) -> Result<Self> {
        match key_type {
            KeyType::String => Ok(TypedValue::S(encoded.to_string())),
            KeyType::Number => TypedValue::number(encoded),
            KeyType::Binary => Ok(TypedValue::B(decode_base64(encoded)?)),
            KeyType::StringSet => Ok(TypedValue::SS(parse_members(encoded)?)),
            KeyType::NumberSet => {
                let members = parse_members(encoded)?;
                for member in &members {
                    member.parse::<KeyDecimal>()?;
                }
                Ok(TypedValue::NS(members))
            }
            KeyType::BinarySet => {
                let members = parse_members(encoded)?;
                let decoded =
                    members.iter().map(|m| decode_base64(m)).collect::<Result<Vec<_>>>()?;
                Ok(TypedValue::BS(decoded))
            }
        }
    }

    /// Inverse of [`TypedValue::parse`].
    pub fn render(&self) -> String {
        match self {
            TypedValue::S(s) | TypedValue::N(s) => s.clone(),
            TypedValue::B(b) => STANDARD.encode(b),
            TypedValue::SS(members) | TypedValue::NS(members) => render_members(members),
            TypedValue::BS(members) => {
                let encoded: Vec<String> = members.iter().map(|m| STANDARD.encode(m)).collect();
                render_members(&encoded)
            }
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::S(s) => write!(f, "{s:?}"),
            _ => f.write_str(&self.render()),
        }
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::Parse(format!("invalid base64 value {encoded:?}: {e}")))
}

fn parse_members(encoded: &str) -> Result<Vec<String>> {
    serde_json::from_str(encoded)
        .map_err(|e| Error::Parse(format!("invalid set value {encoded:?}: {e}")))
}

fn render_members(members: &[String]) -> String {
    // Serializing a list of strings cannot fail.
    serde_json::to_string(members).unwrap_or_default()
}

/// Comparison operators understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    #[default]
    Eq,
    Ne,
    In,
    Le,
    Lt,
    Ge,
    Gt,
    Between,
    NotNull,
    Null,
    Contains,
    NotContains,
    BeginsWith,
}

impl ComparisonOperator {
    /// Number of values the operator takes inside a key condition, or `None`
    /// when the store does not accept it on a range key.
    pub fn key_condition_arity(&self) -> Option<usize> {
        match self {
            ComparisonOperator::Eq
            | ComparisonOperator::Le
            | ComparisonOperator::Lt
            | ComparisonOperator::Ge
            | ComparisonOperator::Gt
            | ComparisonOperator::BeginsWith => Some(1),
            ComparisonOperator::Between => Some(2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "EQ",
            ComparisonOperator::Ne => "NE",
            ComparisonOperator::In => "IN",
            ComparisonOperator::Le => "LE",
            ComparisonOperator::Lt => "LT",
            ComparisonOperator::Ge => "GE",
            ComparisonOperator::Gt => "GT",
            ComparisonOperator::Between => "BETWEEN",
            ComparisonOperator::NotNull => "NOT_NULL",
            ComparisonOperator::Null => "NULL",
            ComparisonOperator::Contains => "CONTAINS",
            ComparisonOperator::NotContains => "NOT_CONTAINS",
            ComparisonOperator::BeginsWith => "BEGINS_WITH",
        }
    }

    /// Validates a range-key condition's value list against the operator.
    pub fn check_key_condition(&self, values: &[TypedValue]) -> Result<()> {
        match self.key_condition_arity() {
            Some(arity) if arity == values.len() => Ok(()),
            Some(arity) => Err(Error::Config(format!(
                "{} expects {arity} range key value(s), got {}",
                self.as_str(),
                values.len()
            ))),
            None => Err(Error::Config(format!(
                "{} cannot be used in a range key condition",
                self.as_str()
            ))),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

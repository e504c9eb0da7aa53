//! Typed rows.

use crate::store::Item;
use crate::types::{KeyType, TypedValue};
use crate::Result;
use igloo_common::Error;

/// A row type that converts to and from a store [`Item`].
pub trait Record: Sized {
    fn from_item(item: &Item) -> Result<Self>;

    fn to_item(&self) -> Item;
}

/// Items read as-is.
impl Record for Item {
    fn from_item(item: &Item) -> Result<Self> {
        Ok(item.clone())
    }

    fn to_item(&self) -> Item {
        self.clone()
    }
}

/// Looks up a required attribute of the given type.
pub fn attribute<'a>(item: &'a Item, name: &str, key_type: KeyType) -> Result<&'a TypedValue> {
    let value = item
        .get(name)
        .ok_or_else(|| Error::Parse(format!("missing attribute {name:?}")))?;
    value.expect_type(key_type)?;
    Ok(value)
}

pub fn string_attribute(item: &Item, name: &str) -> Result<String> {
    let value = attribute(item, name, KeyType::String)?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

/// Parses a number attribute into any `FromStr` numeric type.
pub fn number_attribute<T: std::str::FromStr>(item: &Item, name: &str) -> Result<T> {
    let raw = attribute(item, name, KeyType::Number)?.as_number().unwrap_or_default();
    raw.parse()
        .map_err(|_| Error::Parse(format!("attribute {name:?} value {raw} is out of range")))
}

pub fn binary_attribute(item: &Item, name: &str) -> Result<Vec<u8>> {
    let value = attribute(item, name, KeyType::Binary)?;
    Ok(value.as_bytes().unwrap_or_default().to_vec())
}

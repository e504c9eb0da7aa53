//! The store's request/response surface.
//!
//! Network clients live outside this crate; [`crate::memory::MemoryStore`]
//! implements the trait for tests and local runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ComparisonOperator, TypedValue};
use crate::Result;

/// One stored row, attribute name to value.
pub type Item = BTreeMap<String, TypedValue>;

/// A condition on one key attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCondition {
    pub attribute: String,
    pub operator: ComparisonOperator,
    pub values: Vec<TypedValue>,
}

impl KeyCondition {
    pub fn new(attribute: impl Into<String>, operator: ComparisonOperator, values: Vec<TypedValue>) -> Self {
        Self { attribute: attribute.into(), operator, values }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub key_conditions: Vec<KeyCondition>,
    /// Cursor from the previous page.
    pub exclusive_start_key: Option<Item>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub table_name: String,
    pub exclusive_start_key: Option<Item>,
    /// `(segment, total_segments)` for a parallel scan.
    pub segment: Option<(u32, u32)>,
    /// Only items meeting every condition are returned.
    pub filter: Vec<KeyCondition>,
    pub limit: Option<usize>,
}

/// One page of results. No cursor means the last page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn query(&self, request: QueryRequest) -> Result<Page>;

    async fn scan(&self, request: ScanRequest) -> Result<Page>;

    /// Writes a batch of items and hands back those the store did not
    /// process. Unprocessed items should be resubmitted.
    async fn batch_write(&self, table_name: &str, items: Vec<Item>) -> Result<Vec<Item>>;

    async fn put_item(&self, table_name: &str, item: Item) -> Result<()>;
}

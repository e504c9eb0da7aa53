//! DynamoDB connector for Igloo.
//!
//! Partitions a table's key space into independent splits, reads each split
//! through the store's paginated query or scan, and writes records back in
//! retried batches.
//!
//! # Example
//! ```rust
//! use igloo_connector_dynamodb::{KeyField, KeyType, Splitter, SplitRequest, TypedValue};
//!
//! let request = SplitRequest::new(KeyField::new("tenant", KeyType::String))
//!     .with_hash_key_value(TypedValue::string("acme"))?
//!     .with_range_key(KeyField::new("created", KeyType::Number))
//!     .with_interpolation(Some(TypedValue::number("0")?), Some(TypedValue::number("1000")?))?
//!     .with_parallelism(4);
//! let splits = Splitter::default().split(&request)?;
//! assert_eq!(splits.len(), 4);
//! # Ok::<(), igloo_connector_dynamodb::Error>(())
//! ```

pub mod decimal;
pub mod input_split;
pub mod memory;
pub mod reader;
pub mod record;
pub mod settings;
pub mod split;
pub mod store;
pub mod types;
pub mod writer;

pub use igloo_common::{Error, Result};

pub use decimal::{KeyDecimal, Radix};
pub use input_split::{InputSplit, QuerySplit, ScanSplit};
pub use memory::{MemoryStore, TableSchema};
pub use reader::RecordReader;
pub use record::Record;
pub use settings::Settings;
pub use split::{KeyField, KeyRange, RangeSpec, ScanSplitter, SplitRequest, SplitStrategy, Splitter, SplitterSettings};
pub use store::{Item, KeyCondition, KeyValueStore, Page, QueryRequest, ScanRequest};
pub use types::{ComparisonOperator, KeyType, TypedValue};
pub use writer::{RecordWriter, WriterSettings};

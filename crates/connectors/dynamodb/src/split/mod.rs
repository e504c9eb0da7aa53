//! Split generation.
//!
//! [`Splitter`] turns a [`SplitRequest`] into the query splits for a job,
//! delegating range interpolation to the [`SplitStrategy`] picked by the
//! range key's type. [`ScanSplitter`] produces full-table scan segments.

pub mod binary;
pub mod numeric;
pub mod range;
pub mod request;
pub mod scan;
pub mod strategy;
pub mod text;

use tracing::{debug, error, warn};

pub use numeric::{split_points, NumericSettings};
pub use range::KeyRange;
pub use request::{KeyField, RangeSpec, SplitRequest};
pub use scan::ScanSplitter;
pub use strategy::SplitStrategy;

use crate::input_split::QuerySplit;
use crate::types::ComparisonOperator;
use crate::Result;

/// Hash key partitions per job. Jobs query a single hash key value.
const HASH_KEY_PARTITIONS: i64 = 1;

pub const DEFAULT_MAX_SPLITS: i64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitterSettings {
    pub numeric: NumericSettings,
    /// Ceiling on range splits per hash key.
    pub max_splits: i64,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self { numeric: NumericSettings::default(), max_splits: DEFAULT_MAX_SPLITS }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Splitter {
    settings: SplitterSettings,
}

impl Splitter {
    pub fn new(settings: SplitterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SplitterSettings {
        &self.settings
    }

    /// Range splits to ask for given the job's parallelism, at least one.
    pub fn num_range_splits(&self, parallelism: i64) -> i64 {
        let wanted = (parallelism / HASH_KEY_PARTITIONS).max(1);
        let limit = self.settings.max_splits.max(1);
        if wanted > limit {
            warn!(wanted, limit, "requested splits exceed max_splits, clamping");
            return limit;
        }
        wanted
    }

    /// Produces the splits for a job.
    ///
    /// Shortfalls degrade parallelism instead of failing: absent bounds or
    /// a key type without an order give one split, and interpolation
    /// without a hash key value gives none. Bounds that do not fit the
    /// range key's type are an error.
    pub fn split(&self, request: &SplitRequest) -> Result<Vec<QuerySplit>> {
        let hash_key = request.hash_key();
        let hash_value = request.hash_key_value().cloned();
        let range_key = request.range_key();
        let count = self.num_range_splits(request.parallelism());

        let (min, max) = match request.range() {
            RangeSpec::Explicit { operator, values } => {
                return Ok(vec![QuerySplit::new(
                    hash_key,
                    hash_value,
                    range_key,
                    *operator,
                    values.clone(),
                )]);
            }
            RangeSpec::Interpolate { .. } if count <= 1 => {
                debug!(parallelism = request.parallelism(), "single split requested, not interpolating");
                return Ok(vec![QuerySplit::partition(hash_key, hash_value, range_key)]);
            }
            RangeSpec::Interpolate { min: Some(min), max: Some(max) } => (min, max),
            RangeSpec::Interpolate { .. } => {
                warn!(
                    range_key = %range_key.name,
                    "interpolation requested without both bounds, using a single split"
                );
                return Ok(vec![QuerySplit::partition(hash_key, hash_value, range_key)]);
            }
        };

        if hash_value.is_none() {
            error!(
                hash_key = %hash_key.name,
                "range interpolation needs a hash key value, no splits generated"
            );
            return Ok(Vec::new());
        }

        let strategy = SplitStrategy::for_key_type(range_key.key_type);
        let ranges = match strategy.ranges(min, max, count, &self.settings.numeric)? {
            Some(ranges) => ranges,
            None => {
                warn!(
                    range_key = %range_key.name,
                    key_type = %range_key.key_type,
                    "range key type cannot be interpolated, using a single split"
                );
                return Ok(vec![QuerySplit::partition(hash_key, hash_value, range_key)]);
            }
        };

        if (ranges.len() as i64) < count {
            warn!(requested = count, produced = ranges.len(), "fewer splits than requested");
        }
        debug!(splits = ranges.len(), ?strategy, "generated range splits");

        Ok(ranges
            .into_iter()
            .map(|range| {
                QuerySplit::new(
                    hash_key,
                    hash_value.clone(),
                    range_key,
                    ComparisonOperator::Between,
                    range.into_values(),
                )
            })
            .collect())
    }
}

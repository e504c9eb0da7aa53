//! Streams the items of one split out of the store, page by page.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::{debug, trace};

use crate::input_split::{QuerySplit, ScanSplit};
use crate::record::Record;
use crate::store::{Item, KeyCondition, KeyValueStore, QueryRequest, ScanRequest};
use crate::Result;

#[derive(Debug, Clone)]
enum Source {
    Query(QuerySplit),
    Scan { segment: Option<ScanSplit>, filter: Vec<KeyCondition> },
}

/// Sequential reader over one split.
///
/// Fetches one page at a time and follows the store's cursor until it runs
/// out. Use [`RecordReader::query`] or [`RecordReader::scan`] to build one.
pub struct RecordReader {
    store: Arc<dyn KeyValueStore>,
    table_name: String,
    source: Source,
    page_limit: Option<usize>,
    buffer: VecDeque<Item>,
    cursor: Option<Item>,
    exhausted: bool,
    position: u64,
}

impl RecordReader {
    /// Reads a query split. A split without a hash key value cannot be
    /// queried; it is read as a full scan filtered on its range condition.
    pub fn query(store: Arc<dyn KeyValueStore>, table_name: impl Into<String>, split: QuerySplit) -> Self {
        let source = if split.has_hash_key() {
            Source::Query(split)
        } else {
            debug!(
                hash_key = split.hash_key_name(),
                filtered = split.has_range_key(),
                "no hash key value, scanning the table"
            );
            Source::Scan { segment: None, filter: split.key_conditions() }
        };
        Self::new(store, table_name.into(), source)
    }

    /// Reads one segment of a parallel scan, or the whole table.
    pub fn scan(store: Arc<dyn KeyValueStore>, table_name: impl Into<String>, split: Option<ScanSplit>) -> Self {
        Self::new(store, table_name.into(), Source::Scan { segment: split, filter: Vec::new() })
    }

    fn new(store: Arc<dyn KeyValueStore>, table_name: String, source: Source) -> Self {
        Self {
            store,
            table_name,
            source,
            page_limit: None,
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
            position: 0,
        }
    }

    /// Asks the store for at most `limit` items per page.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    /// Items handed out so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub async fn next_item(&mut self) -> Result<Option<Item>> {
        while self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        let item = self.buffer.pop_front();
        if item.is_some() {
            self.position += 1;
        }
        Ok(item)
    }

    pub async fn next_record<R: Record>(&mut self) -> Result<Option<R>> {
        match self.next_item().await? {
            Some(item) => R::from_item(&item).map(Some),
            None => Ok(None),
        }
    }

    /// Consumes the reader into a stream of items.
    pub fn into_stream(self) -> impl Stream<Item = Result<Item>> {
        stream::try_unfold(self, |mut reader| async move {
            Ok(reader.next_item().await?.map(|item| (item, reader)))
        })
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let start = self.cursor.take();
        let page = match &self.source {
            Source::Query(split) => {
                self.store
                    .query(QueryRequest {
                        table_name: self.table_name.clone(),
                        key_conditions: split.key_conditions(),
                        exclusive_start_key: start,
                        limit: self.page_limit,
                    })
                    .await?
            }
            Source::Scan { segment, filter } => {
                self.store
                    .scan(ScanRequest {
                        table_name: self.table_name.clone(),
                        exclusive_start_key: start,
                        segment: segment.map(|s| (s.segment(), s.total_segments())),
                        filter: filter.clone(),
                        limit: self.page_limit,
                    })
                    .await?
            }
        };
        trace!(
            table = %self.table_name,
            items = page.items.len(),
            more = page.last_evaluated_key.is_some(),
            "fetched page"
        );
        self.exhausted = page.last_evaluated_key.is_none();
        self.cursor = page.last_evaluated_key;
        self.buffer.extend(page.items);
        Ok(())
    }
}

//! Buffered batch writes with retry.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::future::retry;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::record::Record;
use crate::store::{Item, KeyValueStore};
use crate::Result;
use igloo_common::Error;

/// Most items the store accepts in one batch write.
pub const MAX_BATCH_ITEMS: usize = 25;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    pub batch_size: usize,
    /// Batch write attempts before unprocessed items are given up on.
    pub max_attempts: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_elapsed_ms: u64,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_ITEMS,
            max_attempts: 10,
            initial_backoff_ms: 50,
            max_backoff_ms: 5_000,
            max_elapsed_ms: 60_000,
        }
    }
}

impl WriterSettings {
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.max_backoff_ms))
            .with_max_elapsed_time(Some(Duration::from_millis(self.max_elapsed_ms)))
            .build()
    }

    fn batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_ITEMS)
    }
}

/// Writes records to one table in batches.
///
/// Records are buffered and sent once a full batch is ready. Items the
/// store leaves unprocessed are resent with exponential backoff; a batch
/// the store rejects is written item by item instead. Call
/// [`RecordWriter::close`] to send what is left.
pub struct RecordWriter {
    store: Arc<dyn KeyValueStore>,
    table_name: String,
    settings: WriterSettings,
    buffer: Vec<Item>,
    written: u64,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn KeyValueStore>, table_name: impl Into<String>, settings: WriterSettings) -> Self {
        let capacity = settings.batch_size();
        Self { store, table_name: table_name.into(), settings, buffer: Vec::with_capacity(capacity), written: 0 }
    }

    pub async fn write<R: Record>(&mut self, record: &R) -> Result<()> {
        self.write_item(record.to_item()).await
    }

    pub async fn write_item(&mut self, item: Item) -> Result<()> {
        self.buffer.push(item);
        if self.buffer.len() >= self.settings.batch_size() {
            self.flush().await?;
        }
        Ok(())
    }

    /// Items acknowledged by the store so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn flush(&mut self) -> Result<()> {
        while !self.buffer.is_empty() {
            let take = self.buffer.len().min(self.settings.batch_size());
            let batch: Vec<Item> = self.buffer.drain(..take).collect();
            self.write_batch(batch).await?;
        }
        Ok(())
    }

    /// Flushes and returns the number of items written.
    pub async fn close(mut self) -> Result<u64> {
        self.flush().await?;
        debug!(table = %self.table_name, written = self.written, "writer closed");
        Ok(self.written)
    }

    async fn write_batch(&mut self, batch: Vec<Item>) -> Result<()> {
        let mut backoff = self.settings.backoff();
        let mut pending = batch;
        let mut attempt = 1;
        loop {
            let unprocessed = match self.store.batch_write(&self.table_name, pending.clone()).await {
                Ok(unprocessed) => unprocessed,
                Err(e) => {
                    warn!(error = %e, items = pending.len(), "batch write failed, writing items one at a time");
                    return self.put_each(pending).await;
                }
            };
            self.written += (pending.len() - unprocessed.len().min(pending.len())) as u64;
            if unprocessed.is_empty() {
                return Ok(());
            }

            if attempt >= self.settings.max_attempts {
                return Err(Error::Store(format!(
                    "{} items still unprocessed after {attempt} batch writes",
                    unprocessed.len()
                )));
            }
            let delay = backoff.next_backoff().ok_or_else(|| {
                Error::Store(format!("{} items still unprocessed, retry time exhausted", unprocessed.len()))
            })?;
            debug!(unprocessed = unprocessed.len(), attempt, ?delay, "retrying unprocessed items");
            sleep(delay).await;
            attempt += 1;
            pending = unprocessed;
        }
    }

    async fn put_each(&mut self, items: Vec<Item>) -> Result<()> {
        let table = self.table_name.as_str();
        for item in items {
            let store = Arc::clone(&self.store);
            retry(self.settings.backoff(), || {
                let store = Arc::clone(&store);
                let item = item.clone();
                async move {
                    store.put_item(table, item).await.map_err(|e| {
                        if e.is_store() {
                            warn!(error = %e, "put failed, retrying");
                            backoff::Error::transient(e)
                        } else {
                            backoff::Error::permanent(e)
                        }
                    })
                }
            })
            .await?;
            self.written += 1;
        }
        Ok(())
    }
}

//! In-memory [`KeyValueStore`].

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::store::{Item, KeyCondition, KeyValueStore, Page, QueryRequest, ScanRequest};
use crate::types::{ComparisonOperator, TypedValue};
use crate::Result;
use igloo_common::Error;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Key attributes of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub hash_key: String,
    pub range_key: Option<String>,
}

impl TableSchema {
    pub fn new(hash_key: impl Into<String>, range_key: Option<&str>) -> Self {
        Self { hash_key: hash_key.into(), range_key: range_key.map(str::to_string) }
    }

    fn key_of(&self, item: &Item) -> Result<Item> {
        let mut key = Item::new();
        for name in std::iter::once(&self.hash_key).chain(self.range_key.iter()) {
            let value = item
                .get(name)
                .ok_or_else(|| Error::Store(format!("item is missing key attribute {name:?}")))?;
            key.insert(name.clone(), value.clone());
        }
        Ok(key)
    }

    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        std::iter::once(&self.hash_key)
            .chain(self.range_key.iter())
            .map(|name| match (a.get(name), b.get(name)) {
                (Some(x), Some(y)) => x.key_cmp(y).unwrap_or(Ordering::Equal),
                (x, y) => x.is_some().cmp(&y.is_some()),
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    /// Sorted by key.
    rows: Vec<Item>,
}

impl Table {
    fn upsert(&mut self, item: Item) -> Result<()> {
        self.schema.key_of(&item)?;
        match self.rows.binary_search_by(|row| self.schema.compare(row, &item)) {
            Ok(idx) => self.rows[idx] = item,
            Err(idx) => self.rows.insert(idx, item),
        }
        Ok(())
    }

    fn page<'a>(
        &self,
        rows: impl Iterator<Item = &'a Item>,
        start: Option<&Item>,
        limit: usize,
    ) -> Result<Page> {
        let mut rows = rows
            .skip_while(|row| start.is_some_and(|cursor| self.schema.compare(row, cursor).is_le()))
            .peekable();
        let items: Vec<Item> = rows.by_ref().take(limit.max(1)).cloned().collect();
        let last_evaluated_key = match (rows.peek(), items.last()) {
            (Some(_), Some(last)) => Some(self.schema.key_of(last)?),
            _ => None,
        };
        Ok(Page { items, last_evaluated_key })
    }
}

#[derive(Debug, Default)]
struct Faults {
    failing_batches: AtomicUsize,
    throttled_batches: AtomicUsize,
    batch_write_calls: AtomicUsize,
    put_item_calls: AtomicUsize,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Tables held in memory, with injectable write faults.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    page_size: usize,
    faults: Arc<Faults>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
            faults: Arc::new(Faults::default()),
        }
    }

    /// Caps every page at `page_size` items.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn create_table(&self, name: &str, schema: TableSchema) {
        let mut tables = self.tables.write().await;
        tables.insert(name.to_string(), Table { schema, rows: Vec::new() });
    }

    pub async fn items(&self, table_name: &str) -> Result<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(table(&tables, table_name)?.rows.clone())
    }

    /// The next `n` batch writes fail outright.
    pub fn fail_next_batch_writes(&self, n: usize) {
        self.faults.failing_batches.store(n, AtomicOrdering::SeqCst);
    }

    /// The next `n` batch writes store only their first item.
    pub fn throttle_next_batch_writes(&self, n: usize) {
        self.faults.throttled_batches.store(n, AtomicOrdering::SeqCst);
    }

    pub fn batch_write_calls(&self) -> usize {
        self.faults.batch_write_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn put_item_calls(&self) -> usize {
        self.faults.put_item_calls.load(AtomicOrdering::SeqCst)
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.page_size, |l| l.min(self.page_size))
    }
}

fn table<'a>(tables: &'a HashMap<String, Table>, name: &str) -> Result<&'a Table> {
    tables.get(name).ok_or_else(|| Error::Store(format!("table {name:?} not found")))
}

fn table_mut<'a>(tables: &'a mut HashMap<String, Table>, name: &str) -> Result<&'a mut Table> {
    tables.get_mut(name).ok_or_else(|| Error::Store(format!("table {name:?} not found")))
}

fn matches(item: &Item, condition: &KeyCondition) -> Result<bool> {
    condition.operator.check_key_condition(&condition.values)?;
    let Some(value) = item.get(&condition.attribute) else {
        return Ok(false);
    };
    let cmp = |bound: &TypedValue| value.key_cmp(bound);
    let values = &condition.values;
    let hit = match condition.operator {
        ComparisonOperator::Eq => cmp(&values[0]) == Some(Ordering::Equal),
        ComparisonOperator::Lt => cmp(&values[0]) == Some(Ordering::Less),
        ComparisonOperator::Le => cmp(&values[0]).is_some_and(Ordering::is_le),
        ComparisonOperator::Gt => cmp(&values[0]) == Some(Ordering::Greater),
        ComparisonOperator::Ge => cmp(&values[0]).is_some_and(Ordering::is_ge),
        ComparisonOperator::Between => {
            cmp(&values[0]).is_some_and(Ordering::is_ge) && cmp(&values[1]).is_some_and(Ordering::is_le)
        }
        ComparisonOperator::BeginsWith => value.begins_with(&values[0]),
        other => return Err(Error::NotSupported(format!("{other} in a key condition"))),
    };
    Ok(hit)
}

fn matches_all(item: &Item, conditions: &[KeyCondition]) -> Result<bool> {
    for condition in conditions {
        if !matches(item, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn segment_of(value: Option<&TypedValue>, total: u32) -> u32 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    (hasher.finish() % u64::from(total.max(1))) as u32
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn query(&self, request: QueryRequest) -> Result<Page> {
        let tables = self.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        let anchored = request.key_conditions.iter().any(|c| {
            c.attribute == table.schema.hash_key && c.operator == ComparisonOperator::Eq
        });
        if !anchored {
            return Err(Error::Store(format!(
                "query on {:?} needs an equality condition on {:?}",
                request.table_name, table.schema.hash_key
            )));
        }

        let mut selected = Vec::new();
        for row in &table.rows {
            if matches_all(row, &request.key_conditions)? {
                selected.push(row);
            }
        }
        let page = table.page(
            selected.into_iter(),
            request.exclusive_start_key.as_ref(),
            self.limit(request.limit),
        )?;
        trace!(table = %request.table_name, items = page.items.len(), more = page.last_evaluated_key.is_some(), "query page");
        Ok(page)
    }

    async fn scan(&self, request: ScanRequest) -> Result<Page> {
        let tables = self.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        if let Some((segment, total)) = request.segment {
            if segment >= total {
                return Err(Error::Store(format!("segment {segment} outside 0..{total}")));
            }
        }
        let hash_key = &table.schema.hash_key;
        let mut selected = Vec::new();
        for row in &table.rows {
            if let Some((segment, total)) = request.segment {
                if segment_of(row.get(hash_key), total) != segment {
                    continue;
                }
            }
            if matches_all(row, &request.filter)? {
                selected.push(row);
            }
        }
        let page = table.page(
            selected.into_iter(),
            request.exclusive_start_key.as_ref(),
            self.limit(request.limit),
        )?;
        trace!(table = %request.table_name, items = page.items.len(), more = page.last_evaluated_key.is_some(), "scan page");
        Ok(page)
    }

    async fn batch_write(&self, table_name: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        self.faults.batch_write_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if take_one(&self.faults.failing_batches) {
            return Err(Error::Store("batch write rejected".to_string()));
        }

        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table_name)?;
        let mut items = items.into_iter();
        let unprocessed = if take_one(&self.faults.throttled_batches) {
            if let Some(first) = items.next() {
                table.upsert(first)?;
            }
            items.collect()
        } else {
            for item in items {
                table.upsert(item)?;
            }
            Vec::new()
        };
        Ok(unprocessed)
    }

    async fn put_item(&self, table_name: &str, item: Item) -> Result<()> {
        self.faults.put_item_calls.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.tables.write().await;
        table_mut(&mut tables, table_name)?.upsert(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, sk: i64) -> Item {
        Item::from([
            ("id".to_string(), TypedValue::string(id)),
            ("sk".to_string(), TypedValue::N(sk.to_string())),
        ])
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new().with_page_size(2);
        store.create_table("t", TableSchema::new("id", Some("sk"))).await;
        for sk in [3, 1, 10, 2] {
            store.put_item("t", row("a", sk)).await.unwrap();
        }
        store.put_item("t", row("b", 1)).await.unwrap();
        store
    }

    fn query(conditions: Vec<KeyCondition>, start: Option<Item>) -> QueryRequest {
        QueryRequest {
            table_name: "t".to_string(),
            key_conditions: conditions,
            exclusive_start_key: start,
            limit: None,
        }
    }

    fn eq_a() -> KeyCondition {
        KeyCondition::new("id", ComparisonOperator::Eq, vec![TypedValue::string("a")])
    }

    #[tokio::test]
    async fn test_rows_sorted_by_number() {
        let store = store().await;
        let items = store.items("t").await.unwrap();
        let sks: Vec<_> = items.iter().map(|i| i["sk"].render()).collect();
        assert_eq!(sks, vec!["1", "2", "3", "10", "1"]);
    }

    #[tokio::test]
    async fn test_query_pages() {
        let store = store().await;
        let first = store.query(query(vec![eq_a()], None)).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let cursor = first.last_evaluated_key.clone();
        assert_eq!(cursor, Some(row("a", 2)));

        let second = store.query(query(vec![eq_a()], cursor)).await.unwrap();
        assert_eq!(second.items, vec![row("a", 3), row("a", 10)]);
        assert!(second.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_query_between() {
        let store = store().await;
        let between = KeyCondition::new(
            "sk",
            ComparisonOperator::Between,
            vec![TypedValue::N("2".into()), TypedValue::N("9".into())],
        );
        let page = store.query(query(vec![eq_a(), between], None)).await.unwrap();
        assert_eq!(page.items, vec![row("a", 2), row("a", 3)]);
    }

    #[tokio::test]
    async fn test_query_needs_hash_key() {
        let store = store().await;
        let gt = KeyCondition::new("sk", ComparisonOperator::Gt, vec![TypedValue::N("1".into())]);
        assert!(store.query(query(vec![gt], None)).await.is_err());

        let ne = KeyCondition::new("sk", ComparisonOperator::Ne, vec![TypedValue::N("1".into())]);
        assert!(store.query(query(vec![eq_a(), ne], None)).await.is_err());
    }

    #[tokio::test]
    async fn test_scan_segments_partition_rows() {
        let store = store().await;
        let mut seen = 0;
        for segment in 0..3 {
            let mut start = None;
            loop {
                let page = store
                    .scan(ScanRequest {
                        table_name: "t".to_string(),
                        exclusive_start_key: start.take(),
                        segment: Some((segment, 3)),
                        filter: Vec::new(),
                        limit: None,
                    })
                    .await
                    .unwrap();
                seen += page.items.len();
                match page.last_evaluated_key {
                    Some(key) => start = Some(key),
                    None => break,
                }
            }
        }
        assert_eq!(seen, 5);
    }

    #[tokio::test]
    async fn test_scan_filter_pages() {
        let store = store().await;
        let request = |start| ScanRequest {
            table_name: "t".to_string(),
            exclusive_start_key: start,
            filter: vec![KeyCondition::new("sk", ComparisonOperator::Le, vec![TypedValue::N("2".into())])],
            ..Default::default()
        };
        let first = store.scan(request(None)).await.unwrap();
        assert_eq!(first.items, vec![row("a", 1), row("a", 2)]);

        let second = store.scan(request(first.last_evaluated_key)).await.unwrap();
        assert_eq!(second.items, vec![row("b", 1)]);
        assert!(second.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_batch_write_faults() {
        let store = store().await;
        store.fail_next_batch_writes(1);
        assert!(store.batch_write("t", vec![row("c", 1)]).await.is_err());

        store.throttle_next_batch_writes(1);
        let left = store.batch_write("t", vec![row("c", 1), row("c", 2)]).await.unwrap();
        assert_eq!(left, vec![row("c", 2)]);

        let left = store.batch_write("t", left).await.unwrap();
        assert!(left.is_empty());
        assert_eq!(store.batch_write_calls(), 3);
        assert_eq!(store.items("t").await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_missing_table_and_key() {
        let store = store().await;
        assert!(store.put_item("nope", row("a", 1)).await.is_err());
        let keyless = Item::from([("sk".to_string(), TypedValue::N("1".into()))]);
        assert!(store.put_item("t", keyless).await.is_err());
    }
}

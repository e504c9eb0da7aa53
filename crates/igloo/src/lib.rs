//! Library side of the `igloo` binary: turns job settings into printable
//! split listings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use igloo_common::Result;
use igloo_connector_dynamodb::{QuerySplit, ScanSplit, ScanSplitter, Settings, Splitter};

/// Query splits for a job, with `parallelism` overriding the configured value.
pub fn plan_query_splits(settings: &Settings, parallelism: Option<i64>) -> Result<Vec<QuerySplit>> {
    let mut request = settings.split_request()?;
    if let Some(parallelism) = parallelism {
        request = request.with_parallelism(parallelism);
    }
    Splitter::new(settings.splitter_settings()?).split(&request)
}

pub fn plan_scan_splits(parallelism: i64) -> Result<Vec<ScanSplit>> {
    ScanSplitter.split(parallelism)
}

/// One line per split, either readable or as base64 of its wire bytes.
pub fn describe_query_splits(splits: &[QuerySplit], encoded: bool) -> Result<Vec<String>> {
    splits
        .iter()
        .enumerate()
        .map(|(i, split)| {
            let text = if encoded { STANDARD.encode(split.to_bytes()?) } else { split.to_string() };
            Ok(format!("{i}\t{text}"))
        })
        .collect()
}

pub fn describe_scan_splits(splits: &[ScanSplit], encoded: bool) -> Result<Vec<String>> {
    splits
        .iter()
        .enumerate()
        .map(|(i, split)| {
            let text = if encoded { STANDARD.encode(split.to_bytes()?) } else { split.to_string() };
            Ok(format!("{i}\t{text}"))
        })
        .collect()
}

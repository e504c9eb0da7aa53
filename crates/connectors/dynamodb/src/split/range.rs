//! Closed key intervals and the assembly of cut points into adjacent ranges.

use serde::{Deserialize, Serialize};

use crate::types::TypedValue;

/// A closed interval on the range key, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: TypedValue,
    pub end: TypedValue,
}

impl KeyRange {
    pub fn new(start: TypedValue, end: TypedValue) -> Self {
        Self { start, end }
    }

    /// Both bounds as a `BETWEEN` value list.
    pub fn into_values(self) -> Vec<TypedValue> {
        vec![self.start, self.end]
    }
}

/// Turns ascending cut points into adjacent closed intervals.
///
/// Each interval after the first starts at `successor(previous end)`. A
/// candidate that would be empty is dropped and its start carried to the
/// next candidate; `allow_point` decides whether `start == end` is empty.
/// The last interval always ends at the last point, and a single point
/// yields the one-point interval.
pub(crate) fn assemble<K, F>(points: &[K], successor: F, allow_point: bool) -> Vec<(K, K)>
where
    K: Ord + Clone,
    F: Fn(&K) -> K,
{
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };
    if points.len() == 1 {
        return vec![(first.clone(), first.clone())];
    }

    let mut ranges: Vec<(K, K)> = Vec::with_capacity(points.len() - 1);
    let mut start = first.clone();
    for end in &points[1..] {
        let empty = if allow_point { &start > end } else { &start >= end };
        if empty {
            continue;
        }
        let next = successor(end);
        ranges.push((start, end.clone()));
        start = next;
    }

    match ranges.last_mut() {
        Some(tail) if &tail.1 < last => tail.1 = last.clone(),
        Some(_) => {}
        None => ranges.push((first.clone(), last.clone())),
    }
    ranges
}

/// Swaps the outermost bounds for the caller's own values so the first
/// interval starts exactly at `min` and the last ends exactly at `max`.
pub(crate) fn pin_bounds(ranges: &mut [KeyRange], min: &TypedValue, max: &TypedValue) {
    if let Some(head) = ranges.first_mut() {
        head.start = min.clone();
    }
    if let Some(tail) = ranges.last_mut() {
        tail.end = max.clone();
    }
}

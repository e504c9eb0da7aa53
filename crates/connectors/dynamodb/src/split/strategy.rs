//! Range interpolation chosen by the range key's type.

use igloo_common::Error;

use super::binary::{self, binary_points};
use super::numeric::{split_points, NumericSettings};
use super::range::{assemble, pin_bounds, KeyRange};
use super::text::{self, text_points};
use crate::decimal::KeyDecimal;
use crate::types::{KeyType, TypedValue};
use crate::Result;

/// How a range key of a given type is cut into sub-ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Number,
    Text,
    Binary,
    /// No usable order; the whole partition stays one split.
    PassThrough,
}

impl SplitStrategy {
    pub fn for_key_type(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Number => SplitStrategy::Number,
            KeyType::String => SplitStrategy::Text,
            KeyType::Binary => SplitStrategy::Binary,
            KeyType::StringSet | KeyType::NumberSet | KeyType::BinarySet => {
                SplitStrategy::PassThrough
            }
        }
    }

    /// Cuts `[min, max]` into at most `count` closed, ordered ranges.
    ///
    /// Returns `Ok(None)` when the strategy does not interpolate. The first
    /// range starts at `min` and the last ends at `max`, as given.
    pub fn ranges(
        &self,
        min: &TypedValue,
        max: &TypedValue,
        count: i64,
        settings: &NumericSettings,
    ) -> Result<Option<Vec<KeyRange>>> {
        let mut ranges = match self {
            SplitStrategy::PassThrough => return Ok(None),
            SplitStrategy::Number => {
                let lo = number_bound(min)?;
                let hi = number_bound(max)?;
                let points = split_points(count, &lo, &hi, settings)?;
                let increment = &settings.min_increment;
                assemble(&points, |end| end + increment, true)
                    .into_iter()
                    .map(|(start, end)| {
                        KeyRange::new(TypedValue::N(start.to_string()), TypedValue::N(end.to_string()))
                    })
                    .collect::<Vec<_>>()
            }
            SplitStrategy::Text => {
                let lo = bound(min, KeyType::String, TypedValue::as_str)?;
                let hi = bound(max, KeyType::String, TypedValue::as_str)?;
                let points = text_points(lo, hi, count, settings)?;
                assemble(&points, |end| text::successor(end), false)
                    .into_iter()
                    .map(|(start, end)| KeyRange::new(TypedValue::S(start), TypedValue::S(end)))
                    .collect()
            }
            SplitStrategy::Binary => {
                let lo = bound(min, KeyType::Binary, TypedValue::as_bytes)?;
                let hi = bound(max, KeyType::Binary, TypedValue::as_bytes)?;
                let points = binary_points(lo, hi, count, settings)?;
                assemble(&points, |end| binary::successor(end), false)
                    .into_iter()
                    .map(|(start, end)| KeyRange::new(TypedValue::B(start), TypedValue::B(end)))
                    .collect()
            }
        };
        pin_bounds(&mut ranges, min, max);
        Ok(Some(ranges))
    }
}

fn bound<'a, T: ?Sized>(
    value: &'a TypedValue,
    expected: KeyType,
    get: fn(&'a TypedValue) -> Option<&'a T>,
) -> Result<&'a T> {
    get(value).ok_or_else(|| Error::TypeMismatch {
        expected: expected.tag().to_string(),
        found: value.key_type().tag().to_string(),
    })
}

fn number_bound(value: &TypedValue) -> Result<KeyDecimal> {
    bound(value, KeyType::Number, TypedValue::as_number)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> TypedValue {
        TypedValue::N(s.to_string())
    }

    fn ranges(strategy: SplitStrategy, min: TypedValue, max: TypedValue, count: i64) -> Vec<KeyRange> {
        strategy.ranges(&min, &max, count, &NumericSettings::default()).unwrap().unwrap()
    }

    #[test]
    fn test_strategy_for_key_type() {
        assert_eq!(SplitStrategy::for_key_type(KeyType::Number), SplitStrategy::Number);
        assert_eq!(SplitStrategy::for_key_type(KeyType::String), SplitStrategy::Text);
        assert_eq!(SplitStrategy::for_key_type(KeyType::Binary), SplitStrategy::Binary);
        assert_eq!(SplitStrategy::for_key_type(KeyType::NumberSet), SplitStrategy::PassThrough);
    }

    #[test]
    fn test_number_ranges() {
        let r = ranges(SplitStrategy::Number, n("0.0"), n("100.0"), 2);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0], KeyRange::new(n("0.0"), n("50.0")));
        assert_eq!(r[1].start, n("50.0000000000000000000000000000000000001"));
        assert_eq!(r[1].end, n("100.0"));
    }

    #[test]
    fn test_number_bounds_keep_their_spelling() {
        let r = ranges(SplitStrategy::Number, n("1e1"), n("3E1"), 2);
        assert_eq!(r.first().map(|r| &r.start), Some(&n("1e1")));
        assert_eq!(r.last().map(|r| &r.end), Some(&n("3E1")));
    }

    #[test]
    fn test_single_point_interval() {
        let r = ranges(SplitStrategy::Text, TypedValue::string("k"), TypedValue::string("k"), 5);
        assert_eq!(r, vec![KeyRange::new(TypedValue::string("k"), TypedValue::string("k"))]);
    }

    #[test]
    fn test_binary_ranges_do_not_overlap() {
        let r = ranges(SplitStrategy::Binary, TypedValue::binary(vec![0x00]), TypedValue::binary(vec![0xff]), 4);
        assert_eq!(r.len(), 4);
        for pair in r.windows(2) {
            let prev = pair[0].end.as_bytes().unwrap();
            let next = pair[1].start.as_bytes().unwrap();
            assert!(prev < next);
        }
    }

    #[test]
    fn test_pass_through_refuses() {
        let out = SplitStrategy::PassThrough
            .ranges(&n("1"), &n("2"), 4, &NumericSettings::default())
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_type_mismatch() {
        let err = SplitStrategy::Number
            .ranges(&TypedValue::string("a"), &n("2"), 4, &NumericSettings::default())
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}

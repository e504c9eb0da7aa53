//! Even-width subdivision of a decimal interval.

use num_bigint::BigInt;
use tracing::warn;

use crate::decimal::KeyDecimal;
use crate::Result;
use igloo_common::Error;

/// Smallest positive magnitude a store number can hold.
pub const MIN_POSITIVE_VALUE: &str = "0.0000000000000000000000000000000000001";

/// Fractional digits kept when an interval width does not divide exactly.
pub const DEFAULT_DIVISION_SCALE: u32 = 40;

/// Extra digits granted beyond the dividend's scale so small divisors stay exact.
const DIVISOR_HEADROOM: u32 = 16;

/// Arithmetic knobs for [`split_points`].
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSettings {
    /// Floor for the width of one piece.
    pub min_increment: KeyDecimal,
    pub division_scale: u32,
}

impl Default for NumericSettings {
    fn default() -> Self {
        Self { min_increment: min_positive_value(), division_scale: DEFAULT_DIVISION_SCALE }
    }
}

pub fn min_positive_value() -> KeyDecimal {
    KeyDecimal::new(1u32, 37)
}

/// Returns the cut points dividing `[min, max]` into `count` equal pieces.
///
/// The result is ascending, starts at `min` and ends at `max`, so it has
/// `count + 1` points unless the width had to be raised to
/// `settings.min_increment`, in which case there are fewer. `count <= 0` is
/// treated as 1 and `min == max` yields the single point `[min]`.
///
/// ```text
/// [0, 5, 8, 12, 18] => [0, 5] [5+e, 8] [8+e, 12] [12+e, 18]
/// ```
pub fn split_points(
    count: i64,
    min: &KeyDecimal,
    max: &KeyDecimal,
    settings: &NumericSettings,
) -> Result<Vec<KeyDecimal>> {
    if min > max {
        return Err(Error::InvalidRange(format!("lower bound {min} exceeds upper bound {max}")));
    }
    if min == max {
        return Ok(vec![max.clone()]);
    }

    let count = count.max(1);
    let span = max - min;
    let count_digits = count.to_string().len() as u32;
    let scale = settings.division_scale.max(span.scale() + DIVISOR_HEADROOM) + count_digits;
    let mut width = span.div_int(&BigInt::from(count), scale)?;
    let clamped = width < settings.min_increment || width.is_zero();
    if clamped {
        warn!(
            %width,
            min_increment = %settings.min_increment,
            count,
            "split width below minimum increment, producing fewer splits"
        );
        width = settings.min_increment.clone();
    }
    if width.is_zero() || width.is_negative() {
        return Err(Error::Arithmetic(format!("non-positive split width {width}")));
    }

    let mut points = Vec::new();
    let mut cur = min.clone();
    while &cur <= max {
        let next = &cur + &width;
        points.push(cur);
        cur = next;
    }

    // A rounded width leaves the final step a hair off max; pin it to max.
    let on_max = |last: &KeyDecimal| {
        last == max || (!clamped && &(max - last) < &settings.min_increment)
    };
    let snap = points.len() > 1 && points.last().is_some_and(on_max);
    match points.last_mut() {
        Some(last) if snap => *last = max.clone(),
        _ => points.push(max.clone()),
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> KeyDecimal {
        s.parse().unwrap()
    }

    fn render(points: &[KeyDecimal]) -> Vec<String> {
        points.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_even_split() {
        let points = split_points(2, &dec("0.0"), &dec("100.0"), &NumericSettings::default()).unwrap();
        assert_eq!(render(&points), vec!["0.0", "50.0", "100.0"]);
    }

    #[test]
    fn test_uneven_split_ends_on_max() {
        let points = split_points(3, &dec("0"), &dec("10"), &NumericSettings::default()).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], dec("0"));
        assert_eq!(points[3].to_string(), "10");
        assert!(points.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rounded_width_does_not_add_a_sliver() {
        let points = split_points(3, &dec("0"), &dec("1"), &NumericSettings::default()).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[1].to_string(), format!("0.{}", "3".repeat(41)));
        assert_eq!(points[3].to_string(), "1");
    }

    #[test]
    fn test_non_positive_count_is_one() {
        let settings = NumericSettings::default();
        for count in [1, 0, -5] {
            let points = split_points(count, &dec("1"), &dec("9"), &settings).unwrap();
            assert_eq!(render(&points), vec!["1", "9"]);
        }
    }

    #[test]
    fn test_single_point_interval() {
        let points = split_points(4, &dec("42"), &dec("42.0"), &NumericSettings::default()).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_inverted_interval_is_an_error() {
        let err = split_points(2, &dec("5"), &dec("1"), &NumericSettings::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidRange(_)));
    }

    #[test]
    fn test_width_clamped_to_min_increment() {
        let settings = NumericSettings { min_increment: dec("1"), division_scale: 10 };
        let points = split_points(100, &dec("0"), &dec("2.5"), &settings).unwrap();
        assert_eq!(render(&points), vec!["0", "1", "2", "2.5"]);
    }

    #[test]
    fn test_interval_narrower_than_min_increment() {
        let settings = NumericSettings { min_increment: dec("1"), division_scale: 10 };
        let points = split_points(8, &dec("0"), &dec("0.5"), &settings).unwrap();
        assert_eq!(render(&points), vec!["0", "0.5"]);
    }

    #[test]
    fn test_negative_interval() {
        let points = split_points(4, &dec("-2"), &dec("2"), &NumericSettings::default()).unwrap();
        assert_eq!(render(&points), vec!["-2", "-1", "0", "1", "2"]);
    }

    proptest! {
        #[test]
        fn prop_boundaries_are_pinned_and_ascending(
            lo in -1_000_000i64..1_000_000,
            span in 1i64..1_000_000,
            scale in 0u32..6,
            count in -2i64..64,
        ) {
            let min = KeyDecimal::new(lo, scale);
            let max = KeyDecimal::new(lo + span, scale);
            let points = split_points(count, &min, &max, &NumericSettings::default()).unwrap();

            prop_assert!(points.len() >= 2);
            prop_assert!(points.len() as i64 <= count.max(1) + 1);
            prop_assert_eq!(points.first().unwrap(), &min);
            prop_assert_eq!(points.last().unwrap().to_string(), max.to_string());
            prop_assert!(points.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

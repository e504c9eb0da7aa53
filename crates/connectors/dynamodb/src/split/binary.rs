//! Interpolation over binary keys, one base-256 digit per byte.

use igloo_common::Error;

use super::numeric::{split_points, NumericSettings};
use crate::decimal::{common_prefix_len, Radix};
use crate::Result;

/// Cut points between `min` and `max`, ascending, first `min`, last `max`.
///
/// Same scheme as [`super::text::text_points`] over raw bytes, with
/// [`Radix::BINARY`].
pub fn binary_points(
    min: &[u8],
    max: &[u8],
    count: i64,
    settings: &NumericSettings,
) -> Result<Vec<Vec<u8>>> {
    if min > max {
        return Err(Error::InvalidRange(format!(
            "lower bound {min:02x?} exceeds upper bound {max:02x?}"
        )));
    }
    if min == max {
        return Ok(vec![min.to_vec()]);
    }

    let shared = common_prefix_len(min, max);
    let radix = Radix::BINARY;
    let lo = radix.encode(&to_symbols(&min[shared..]))?;
    let hi = radix.encode(&to_symbols(&max[shared..]))?;
    if lo >= hi {
        return Ok(vec![min.to_vec(), max.to_vec()]);
    }

    let cuts = split_points(count, &lo, &hi, settings)?;
    let mut points = Vec::with_capacity(cuts.len());
    points.push(min.to_vec());
    for cut in &cuts[1..cuts.len().saturating_sub(1)] {
        let mut point = min[..shared].to_vec();
        for symbol in radix.decode(cut)? {
            point.push(u8::try_from(symbol).unwrap_or(u8::MAX));
        }
        if points.last().is_some_and(|prev| *prev < point) && point.as_slice() < max {
            points.push(point);
        }
    }
    points.push(max.to_vec());
    Ok(points)
}

fn to_symbols(bytes: &[u8]) -> Vec<u32> {
    bytes.iter().map(|&b| u32::from(b)).collect()
}

/// Smallest byte string sorting after `value`.
pub fn successor(value: &[u8]) -> Vec<u8> {
    let mut next = value.to_vec();
    next.push(0);
    next
}

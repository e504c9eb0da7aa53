//! Interpolation over string keys.

use igloo_common::Error;

use super::numeric::{split_points, NumericSettings};
use crate::decimal::{common_prefix_len, Radix};
use crate::Result;

/// Highest code point that maps to its own digit; anything above saturates.
const MAX_SYMBOL: u32 = 0xFF;

/// Cut points between `min` and `max`, ascending, first `min`, last `max`.
///
/// The shared prefix of both bounds is set aside, the remaining suffixes
/// are placed in `[0, 1)` with [`Radix::TEXT`], and the even cuts of that
/// interval are mapped back and re-prefixed. Cuts that collapse onto a
/// neighbour after mapping back are dropped.
pub fn text_points(
    min: &str,
    max: &str,
    count: i64,
    settings: &NumericSettings,
) -> Result<Vec<String>> {
    if min > max {
        return Err(Error::InvalidRange(format!("lower bound {min:?} exceeds upper bound {max:?}")));
    }
    if min == max {
        return Ok(vec![min.to_string()]);
    }

    let lo_chars: Vec<char> = min.chars().collect();
    let hi_chars: Vec<char> = max.chars().collect();
    let shared = common_prefix_len(&lo_chars, &hi_chars);
    let prefix: String = lo_chars[..shared].iter().collect();

    let radix = Radix::TEXT;
    let lo = radix.encode(&to_symbols(&lo_chars[shared..]))?;
    let hi = radix.encode(&to_symbols(&hi_chars[shared..]))?;
    if lo >= hi {
        // The bounds differ only past what the radix can see.
        return Ok(vec![min.to_string(), max.to_string()]);
    }

    let cuts = split_points(count, &lo, &hi, settings)?;
    let mut points = Vec::with_capacity(cuts.len());
    points.push(min.to_string());
    for cut in &cuts[1..cuts.len().saturating_sub(1)] {
        let mut point = prefix.clone();
        point.extend(radix.decode(cut)?.into_iter().filter_map(char::from_u32));
        if points.last().is_some_and(|prev| *prev < point) && point.as_str() < max {
            points.push(point);
        }
    }
    points.push(max.to_string());
    Ok(points)
}

fn to_symbols(chars: &[char]) -> Vec<u32> {
    chars.iter().map(|&c| (c as u32).min(MAX_SYMBOL)).collect()
}

/// Smallest string sorting after `value`.
pub fn successor(value: &str) -> String {
    let mut next = value.to_string();
    next.push('\0');
    next
}

//! Evenly spaced rate values for the sweep axes.

/// Number of decimal places kept by [`evenly_spaced`].
pub const DECIMALS: i32 = 4;

/// Returns `count` values evenly spaced from `min` to `max` inclusive.
///
/// Values are rounded to four decimal places. With `invert` the sequence runs from
/// `max` down to `min`. A single value is always `min`, and `count == 0` yields an
/// empty list.
///
/// # Examples
///
/// ```
/// use onemax_sweep::grid::evenly_spaced;
///
/// assert_eq!(evenly_spaced(2.0, 5.0, 4, false), vec![2.0, 3.0, 4.0, 5.0]);
/// assert_eq!(evenly_spaced(2.0, 5.0, 4, true), vec![5.0, 4.0, 3.0, 2.0]);
/// assert_eq!(evenly_spaced(0.1, 1.0, 1, true), vec![0.1]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn evenly_spaced(min: f64, max: f64, count: usize, invert: bool) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![round(min)],
        _ => {
            let (start, end) = if invert { (max, min) } else { (min, max) };
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| round(start + i as f64 * step))
                .collect()
        }
    }
}

fn round(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range() {
        assert_eq!(
            evenly_spaced(0.1, 1.0, 10, false),
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
        );
    }

    #[test]
    fn test_same_bounds() {
        assert_eq!(evenly_spaced(3.0, 3.0, 5, false), vec![3.0; 5]);
    }

    #[test]
    fn test_inverted_mutation_axis() {
        let values = evenly_spaced(0.001, 0.01, 8, true);
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], 0.01);
        assert_eq!(values[7], 0.001);
        assert!(values.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_rounds_to_four_decimals() {
        let values = evenly_spaced(0.0, 1.0, 4, false);
        assert_eq!(values, vec![0.0, 0.3333, 0.6667, 1.0]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(evenly_spaced(0.0, 1.0, 0, false).is_empty());
        assert_eq!(evenly_spaced(0.25, 1.0, 1, false), vec![0.25]);
    }
}

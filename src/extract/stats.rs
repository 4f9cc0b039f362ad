//! Summary statistics over forward series.

use std::cmp::Ordering;

use crate::model::Aggregation;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Smallest value.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

/// Largest value.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Most frequent value; the smallest one wins a tie.
pub fn mode(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut best = f64::NAN;
    let mut best_count = 0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j].total_cmp(&sorted[i]) == Ordering::Equal {
            j += 1;
        }
        if j - i > best_count {
            best = sorted[i];
            best_count = j - i;
        }
        i = j;
    }
    best
}

/// Geometric mean: exp of the mean of logarithms.
pub fn geomean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (values.iter().map(|v| v.ln()).sum::<f64>() / values.len() as f64).exp()
}

/// Root mean square.
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Compute a statistic. Returns `None` for aggregations that are not
/// statistics.
pub fn compute(aggregation: Aggregation, values: &[f64]) -> Option<f64> {
    let value = match aggregation {
        Aggregation::Mean => mean(values),
        Aggregation::StdDev => stddev(values),
        Aggregation::Min => min(values),
        Aggregation::Max => max(values),
        Aggregation::Mode => mode(values),
        Aggregation::GeoMean => geomean(values),
        Aggregation::Rms => rms(values),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DATA: [f64; 5] = [1.0, 2.0, 2.0, 4.0, 8.0];

    #[test]
    fn test_mean_and_stddev() {
        assert_relative_eq!(mean(&DATA), 3.4);
        assert_relative_eq!(stddev(&DATA), 2.4979991993593593, epsilon = 1e-12);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min(&DATA), 1.0);
        assert_eq!(max(&DATA), 8.0);
    }

    #[test]
    fn test_mode_prefers_smallest_on_tie() {
        assert_eq!(mode(&DATA), 2.0);
        assert_eq!(mode(&[3.0, 1.0, 3.0, 1.0]), 1.0);
    }

    #[test]
    fn test_geomean_and_rms() {
        assert_relative_eq!(geomean(&[1.0, 4.0, 16.0]), 4.0, epsilon = 1e-12);
        assert_relative_eq!(rms(&[3.0, 4.0]), (12.5f64).sqrt());
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(stddev(&[]).is_nan());
        assert!(min(&[]).is_nan());
        assert!(mode(&[]).is_nan());
        assert!(rms(&[]).is_nan());
    }

    #[test]
    fn test_compute_dispatch() {
        assert_eq!(compute(Aggregation::Max, &DATA), Some(8.0));
        assert_eq!(compute(Aggregation::Forward, &DATA), None);
    }
}

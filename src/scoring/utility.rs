use crate::scoring::types::Quartiles;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator) given a pre-computed mean.
/// Returns 0.0 when fewer than two values are present.
pub fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile `p` (0..=100) of already-sorted data, interpolating linearly
/// between the two closest ranks.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Percentile `p` (0..=100) with linear interpolation. `None` for empty input.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(percentile_sorted(&sorted(values), p.clamp(0.0, 100.0)))
}

/// Q1, median and Q3 of `values`. `None` for empty input.
pub fn quartiles(values: &[f64]) -> Option<Quartiles> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    Some(Quartiles {
        q1: percentile_sorted(&sorted, 25.0),
        median: percentile_sorted(&sorted, 50.0),
        q3: percentile_sorted(&sorted, 75.0),
    })
}

/// Whisker ends for a box plot: the most extreme data points still within
/// 1.5 IQR of the box.
pub fn whiskers(values: &[f64], q: &Quartiles) -> Option<(f64, f64)> {
    let lo_fence = q.q1 - 1.5 * q.iqr();
    let hi_fence = q.q3 + 1.5 * q.iqr();

    let lo = values
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence)
        .min_by(|a, b| a.total_cmp(b))?;
    let hi = values
        .iter()
        .copied()
        .filter(|v| *v <= hi_fence)
        .max_by(|a, b| a.total_cmp(b))?;

    // The fence can sit inside the box when the data are very sparse.
    Some((lo.min(q.q1), hi.max(q.q3)))
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated at
/// `points` evenly spaced coordinates from min to max of `values`.
///
/// Returns `(coordinate, density)` pairs, or `None` when the data have no
/// spread (empty, a single value, or all values equal).
pub fn gaussian_kde(values: &[f64], points: usize) -> Option<Vec<(f64, f64)>> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sd = sample_stddev(values, m);
    let bandwidth = sd * (values.len() as f64).powf(-0.2);
    if bandwidth <= 0.0 || !bandwidth.is_finite() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let curve = linspace(min, max, points)
        .into_iter()
        .map(|x| {
            let density = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect();

    Some(curve)
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

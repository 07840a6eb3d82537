//! Small numeric helpers shared by indicators and analyzers.

/// Arithmetic mean. NaN for an empty slice; NaN inputs propagate.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Trailing rolling mean. Output[i] is the mean of values[i+1-period..=i];
/// the first `period - 1` positions are NaN, as is any window containing NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    for i in (period - 1)..n {
        result[i] = mean(&values[(i + 1 - period)..=i]);
    }
    result
}

/// Pearson correlation coefficient of two equal-length samples.
///
/// `None` for fewer than two points, mismatched lengths, non-finite input or
/// a zero-variance side (the coefficient is undefined there).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if !denominator.is_finite() || denominator == 0.0 {
        return None;
    }
    Some((cov / denominator).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(mean(&v), 5.0, DEFAULT_EPSILON);
        // population std is 2.0; sample std = sqrt(32/7)
        assert_approx(sample_std(&v), (32.0_f64 / 7.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn degenerate_inputs_are_nan() {
        assert!(mean(&[]).is_nan());
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn rolling_mean_warmup() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
        assert_approx(out[3], 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_approx(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0, 1e-12);
        assert_approx(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0, 1e-12);
    }

    #[test]
    fn pearson_known_value() {
        // Sums of co-deviations: cov = 5.5, ss_x = 5.0, ss_y = 8.75
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 5.0];
        let expected = 5.5 / (5.0_f64 * 8.75).sqrt();
        assert_approx(pearson(&x, &y).unwrap(), expected, 1e-9);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[3.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }
}

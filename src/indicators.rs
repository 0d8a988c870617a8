//! Technical indicators over a close-price series.
//!
//! Every function returns a vector aligned with its input. Positions inside the
//! warm-up window are `NaN`, as is any window touched by a `NaN` input.

/// Simple moving average. First value at index `period - 1`.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
            // NaN poisons a running sum, so rebuild it from the window
            sum = values[(i + 1 - period)..=i].iter().sum();
        } else {
            sum += entering - leaving;
        }
        result[i] = sum / period as f64;
    }

    result
}

/// Exponential moving average seeded with the SMA of the first `period` values.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if seed.is_nan() {
        return result;
    }
    result[period - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in period..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

/// Relative Strength Index with Wilder smoothing. First value at index `period`.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for &ch in &changes[..period] {
        if ch.is_nan() {
            return result;
        }
        if ch > 0.0 {
            avg_gain += ch;
        } else {
            avg_loss -= ch;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for (i, &ch) in changes.iter().enumerate().skip(period) {
        if ch.is_nan() {
            return result;
        }
        let gain = ch.max(0.0);
        let loss = (-ch).max(0.0);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        // changes[i] is the move into values[i + 1]
        result[i + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Last value of a series, if it is a real number
pub fn last_valid(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_sma_basic() {
        let out = sma(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0], 5);
        assert!(out[..4].iter().all(|v| v.is_nan()));
        assert!(approx(out[4], 12.0));
        assert!(approx(out[5], 13.0));
        assert!(approx(out[6], 14.0));
    }

    #[test]
    fn test_sma_recovers_after_nan() {
        let out = sma(&[10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0], 3);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
        assert!(out[4].is_nan());
        assert!(approx(out[5], 14.0));
    }

    #[test]
    fn test_sma_zero_period() {
        assert!(sma(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ema_seed_and_step() {
        let out = ema(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[1].is_nan());
        assert!(approx(out[2], 2.0));
        // alpha = 0.5 → 0.5 * 4 + 0.5 * 2
        assert!(approx(out[3], 3.0));
    }

    #[test]
    fn test_rsi_extremes() {
        let up = rsi(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3);
        assert!(up[2].is_nan());
        assert!(approx(up[3], 100.0));
        assert!(approx(up[5], 100.0));

        let down = rsi(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3);
        assert!(approx(down[3], 0.0));

        let flat = rsi(&[100.0; 5], 3);
        assert!(approx(flat[4], 50.0));
    }

    #[test]
    fn test_rsi_seed_value() {
        // gains 0.34, losses 0.25 + 0.48 over the first three changes
        let out = rsi(&[44.0, 44.34, 44.09, 43.61], 3);
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert!((out[3] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_rsi_bounds() {
        let out = rsi(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0], 3);
        for v in out.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v), "RSI out of bounds: {v}");
        }
    }

    #[test]
    fn test_last_valid() {
        assert_eq!(last_valid(&[1.0, 2.0]), Some(2.0));
        assert_eq!(last_valid(&[1.0, f64::NAN]), None);
        assert_eq!(last_valid(&[]), None);
    }
}

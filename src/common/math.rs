//! Rolling-window math over price series.
//!
//! Series helpers return one entry per input value. Entries whose window is
//! not yet full are `None`, never a placeholder zero.

/// Smoothing factor for an exponential average with the given span
pub fn ema_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// One EMA step from the previous average
pub fn ema_from_previous(value: f64, previous: f64, span: usize) -> f64 {
    let alpha = ema_alpha(span);
    alpha * value + (1.0 - alpha) * previous
}

/// True range of a bar given the prior bar's close
pub fn true_range(high: f64, low: f64, previous_close: f64) -> f64 {
    let high_low = high - low;
    let high_close = (high - previous_close).abs();
    let low_close = (low - previous_close).abs();
    high_low.max(high_close).max(low_close)
}

/// Trailing simple moving average.
///
/// An entry is defined only when every value in its trailing window is
/// defined, so a series with a leading gap of `k` entries yields its first
/// average at index `k + window - 1`.
pub fn sma_series(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for end in window - 1..values.len() {
        let slice = &values[end + 1 - window..=end];
        let sum: Option<f64> = slice.iter().copied().sum();
        out[end] = sum.map(|s| s / window as f64);
    }
    out
}

/// Exponential moving average seeded from the simple average of the first
/// `span` defined values, then updated bar by bar.
///
/// Leading `None` entries are skipped. The recursion never restarts: a gap
/// after the seed leaves every later entry undefined.
pub fn ema_series(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if span == 0 {
        return out;
    }

    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };
    let seed_end = start + span;
    if seed_end > values.len() {
        return out;
    }

    let seed: Option<f64> = values[start..seed_end].iter().copied().sum();
    let Some(seed) = seed else {
        return out;
    };

    let mut previous = seed / span as f64;
    out[seed_end - 1] = Some(previous);

    for (i, value) in values.iter().enumerate().skip(seed_end) {
        match value {
            Some(v) => {
                previous = ema_from_previous(*v, previous, span);
                out[i] = Some(previous);
            }
            None => break,
        }
    }
    out
}

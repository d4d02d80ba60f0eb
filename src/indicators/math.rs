// =============================================================================
// Indicator recurrences — pure numeric building blocks
// =============================================================================
//
// Every indicator in the engine is built from the incremental recurrences in
// this module. All functions are O(1), side-effect-free, and never fail:
// insufficient history is modeled by passing `None` for the previous value,
// and callers are responsible for supplying finite inputs where determinism
// matters.
//
// EMA:    ema_t    = price * a + ema_{t-1} * (1 - a),  a = 2 / (period + 1)
// Wilder: avg_t    = avg_{t-1} + (x_t - avg_{t-1}) / period
// TR:     tr       = max(H - L, |H - prevClose|, |L - prevClose|)
// =============================================================================

/// Advance an exponential moving average by one value.
///
/// With no previous value the EMA bootstraps to `price` itself.
pub fn ema_update(prev: Option<f64>, price: f64, period: usize) -> f64 {
    match prev {
        None => price,
        Some(prev) => {
            let alpha = 2.0 / (period as f64 + 1.0);
            price * alpha + prev * (1.0 - alpha)
        }
    }
}

/// Advance a Wilder-smoothed average by one value.
///
/// Wilder smoothing decays at `1/period`, slower than the equivalent EMA; it
/// is the smoothing used for RSI and ATR. Bootstraps to `value` when no
/// previous average exists.
pub fn wilder_update(prev: Option<f64>, value: f64, period: usize) -> f64 {
    match prev {
        None => value,
        Some(prev) => prev + (value - prev) / period as f64,
    }
}

/// True range of a bar relative to the previous close.
///
/// Falls back to the plain high-low range when there is no previous close.
pub fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    match prev_close {
        None => high - low,
        Some(pc) => {
            let hl = high - low;
            let hc = (high - pc).abs();
            let lc = (low - pc).abs();
            hl.max(hc).max(lc)
        }
    }
}

/// Normalized Bollinger band width over the trailing values in `window`.
///
/// Takes the last `min(period, window.len())` values, computes the mean and
/// population standard deviation, and returns `(2 * k * std) / mean`. A zero
/// mean returns 0.0 (division guard); identical values or a single-element
/// window also yield exactly 0.0 since the deviation is zero.
pub fn bollinger_width_normalized(window: &[f64], period: usize, k: f64) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = period.min(window.len());
    let tail = &window[window.len() - n..];

    let mean = tail.iter().sum::<f64>() / n as f64;
    if mean == 0.0 {
        return 0.0;
    }

    let variance = tail.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    (2.0 * k * std_dev) / mean
}

/// Clamp `value` into `[lo, hi]`.
///
/// Infinities clamp to the respective bound. NaN passes through unchanged —
/// repairing NaN propagation is explicitly not this function's job; callers
/// must guard upstream.
pub fn safe_clip(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return value;
    }
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- ema_update / wilder_update ---------------------------------------

    #[test]
    fn ema_bootstraps_to_first_price() {
        assert_eq!(ema_update(None, 42.5, 20), 42.5);
    }

    #[test]
    fn ema_known_step() {
        // alpha = 2/(4+1) = 0.4: 10*0.4 + 5*0.6 = 7.0
        let v = ema_update(Some(5.0), 10.0, 4);
        assert!((v - 7.0).abs() < 1e-12);
    }

    #[test]
    fn ema_converges_to_constant() {
        let mut ema = None;
        for _ in 0..200 {
            ema = Some(ema_update(ema, 100.0, 20));
        }
        assert!((ema.unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn wilder_bootstraps_to_first_value() {
        assert_eq!(wilder_update(None, 3.25, 14), 3.25);
    }

    #[test]
    fn wilder_converges_to_constant() {
        let mut avg = None;
        for _ in 0..200 {
            avg = Some(wilder_update(avg, 7.0, 14));
        }
        assert!((avg.unwrap() - 7.0).abs() < 1e-6);
    }

    // ---- true_range --------------------------------------------------------

    #[test]
    fn true_range_without_prev_close_is_high_low() {
        assert_eq!(true_range(105.0, 99.0, None), 6.0);
    }

    #[test]
    fn true_range_gap_up_uses_prev_close() {
        // Gap: prev close far below the low.
        let tr = true_range(110.0, 108.0, Some(100.0));
        assert!((tr - 10.0).abs() < 1e-12);
    }

    #[test]
    fn true_range_never_below_high_low() {
        for pc in [95.0, 100.0, 101.5, 120.0] {
            assert!(true_range(103.0, 101.0, Some(pc)) >= 2.0 - 1e-12);
        }
    }

    // ---- bollinger_width_normalized ----------------------------------------

    #[test]
    fn bollinger_width_identical_values_is_zero() {
        let window = vec![50.0; 30];
        assert_eq!(bollinger_width_normalized(&window, 20, 2.0), 0.0);
    }

    #[test]
    fn bollinger_width_single_element_is_zero() {
        assert_eq!(bollinger_width_normalized(&[123.4], 20, 2.0), 0.0);
    }

    #[test]
    fn bollinger_width_zero_mean_guard() {
        let window = vec![-1.0, 1.0];
        assert_eq!(bollinger_width_normalized(&window, 20, 2.0), 0.0);
    }

    #[test]
    fn bollinger_width_known_value() {
        // Mean 10, population std of [8, 12] = 2 => width = 2*2*2 / 10 = 0.8
        let w = bollinger_width_normalized(&[8.0, 12.0], 20, 2.0);
        assert!((w - 0.8).abs() < 1e-12);
    }

    #[test]
    fn bollinger_width_uses_only_trailing_period() {
        // Leading outlier outside the period window must not affect the width.
        let mut window = vec![1000.0];
        window.extend(std::iter::repeat(10.0).take(20));
        assert_eq!(bollinger_width_normalized(&window, 20, 2.0), 0.0);
    }

    // ---- safe_clip ---------------------------------------------------------

    #[test]
    fn safe_clip_in_range_unchanged() {
        assert_eq!(safe_clip(1.7, 0.5, 3.0), 1.7);
    }

    #[test]
    fn safe_clip_clamps_bounds() {
        assert_eq!(safe_clip(10.0, 0.5, 3.0), 3.0);
        assert_eq!(safe_clip(-2.0, 0.5, 3.0), 0.5);
    }

    #[test]
    fn safe_clip_infinities() {
        assert_eq!(safe_clip(f64::INFINITY, 0.5, 3.0), 3.0);
        assert_eq!(safe_clip(f64::NEG_INFINITY, 0.5, 3.0), 0.5);
    }

    #[test]
    fn safe_clip_nan_passes_through() {
        assert!(safe_clip(f64::NAN, 0.5, 3.0).is_nan());
    }
}

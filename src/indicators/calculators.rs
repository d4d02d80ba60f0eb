// =============================================================================
// Indicator calculators — advance one IndicatorState by one bar
// =============================================================================
//
// Derivation order per bar:
//   1. EMA 12/26/20/50/200 (first close seeds every accumulator)
//   2. EMA20 slope sign vs. the value one bar prior
//   3. MACD histogram (signal bootstraps to the line => first histogram 0.0)
//   4. Wilder RSI-14 (neutral 50.0 until the averages are meaningful)
//   5. ATR-14 / ATR-50 ratio, clipped to [0.5, 3.0], neutral default 1.0
//   6. Normalized Bollinger width over the trailing-closes window
//   7. Band-width history append (feeds the adaptive volatility threshold)
//
// The previous close is *not* advanced here; the detector commits it after
// classification so RSI deltas and true ranges reference the prior bar.

use serde::{Deserialize, Serialize};

use crate::indicators::math::{
    bollinger_width_normalized, ema_update, safe_clip, true_range, wilder_update,
};
use crate::indicators::state::IndicatorState;
use crate::types::Bar;

const RSI_PERIOD: usize = 14;
const MACD_SIGNAL_PERIOD: usize = 9;
const ATR_FAST_PERIOD: usize = 14;
const ATR_SLOW_PERIOD: usize = 50;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_K: f64 = 2.0;

/// Snapshot of derived indicator values after one bar.
///
/// Absent fields mean "not yet available" — not enough bars have been seen to
/// seed the corresponding recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub rsi: Option<f64>,
    pub atr_ratio: Option<f64>,
    pub bollinger_width: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    /// +1 / 0 / -1, absent until EMA20 has a one-bar-prior value.
    pub ema_slope_sign: Option<i8>,
}

/// Advance `state` by one bar and derive the full indicator snapshot.
pub fn update(state: &mut IndicatorState, bar: &Bar) -> IndicatorValues {
    let close = bar.close;

    // --- EMAs (slope needs the pre-update EMA20) -----------------------------
    let ema20_one_bar_ago = state.ema20;

    state.ema12 = Some(ema_update(state.ema12, close, 12));
    state.ema26 = Some(ema_update(state.ema26, close, 26));
    state.ema20 = Some(ema_update(state.ema20, close, 20));
    state.ema50 = Some(ema_update(state.ema50, close, 50));
    state.ema200 = Some(ema_update(state.ema200, close, 200));

    let ema_slope_sign = match (state.ema20, ema20_one_bar_ago) {
        (Some(curr), Some(prev)) => {
            if curr > prev {
                Some(1)
            } else if curr < prev {
                Some(-1)
            } else {
                Some(0)
            }
        }
        _ => None,
    };

    // --- MACD histogram ------------------------------------------------------
    let macd_histogram = match (state.ema12, state.ema26) {
        (Some(e12), Some(e26)) => {
            let line = e12 - e26;
            // Bootstrapping the signal to the line makes the first histogram
            // exactly 0.0 — a seed-value contract consumers rely on.
            let signal = ema_update(state.macd_signal, line, MACD_SIGNAL_PERIOD);
            state.macd_signal = Some(signal);
            Some(line - signal)
        }
        _ => None,
    };

    // --- Wilder RSI ----------------------------------------------------------
    let (gain, loss) = match state.prev_close {
        Some(pc) => {
            let delta = close - pc;
            (delta.max(0.0), (-delta).max(0.0))
        }
        // Very first bar: no delta to measure.
        None => (0.0, 0.0),
    };
    state.avg_gain = Some(wilder_update(state.avg_gain, gain, RSI_PERIOD));
    state.avg_loss = Some(wilder_update(state.avg_loss, loss, RSI_PERIOD));

    let rsi = match (state.avg_gain, state.avg_loss) {
        (Some(avg_gain), Some(avg_loss)) => {
            if avg_loss == 0.0 {
                if avg_gain > 0.0 {
                    Some(100.0)
                } else {
                    Some(50.0)
                }
            } else {
                Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
            }
        }
        // Averages not ready: neutral default.
        _ => Some(50.0),
    };

    // --- ATR ratio -----------------------------------------------------------
    let tr = true_range(bar.high, bar.low, state.prev_close);
    state.atr14 = Some(wilder_update(state.atr14, tr, ATR_FAST_PERIOD));
    state.atr50 = Some(wilder_update(state.atr50, tr, ATR_SLOW_PERIOD));

    let atr_ratio = match (state.atr14, state.atr50) {
        (Some(fast), Some(slow)) if slow != 0.0 => {
            // Anti-outlier clip.
            Some(safe_clip(fast / slow, 0.5, 3.0))
        }
        _ => Some(1.0),
    };

    // --- Bollinger width + band-width history --------------------------------
    state.closes.push(close);
    let ordered_closes = state.closes.to_ordered_vec();
    let width = bollinger_width_normalized(&ordered_closes, BOLLINGER_PERIOD, BOLLINGER_K);
    state.widths.push(width);

    IndicatorValues {
        rsi,
        atr_ratio,
        bollinger_width: Some(width),
        macd_histogram,
        ema20: state.ema20,
        ema50: state.ema50,
        ema200: state.ema200,
        ema_slope_sign,
    }
}

// =============================================================================
// Per-timeframe indicator state
// =============================================================================
//
// One `IndicatorState` is owned exclusively by one detector and mutated in
// place once per processed bar. All accumulators start absent (`None`) and
// bootstrap from the first value they see; "absent" flows through the
// classifier as reduced weight, never as a fabricated zero.

use crate::indicators::window::RingBuffer;

/// Capacity of the trailing-closes window backing the Bollinger width.
pub const CLOSE_WINDOW_CAPACITY: usize = 200;

/// Mutable container of recurrence accumulators for one timeframe.
#[derive(Debug, Clone)]
pub struct IndicatorState {
    // EMA accumulators.
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,

    // MACD signal line (EMA-9 of EMA12 - EMA26).
    pub macd_signal: Option<f64>,

    // Wilder accumulators for RSI-14.
    pub avg_gain: Option<f64>,
    pub avg_loss: Option<f64>,

    // Wilder accumulators for the ATR ratio.
    pub atr14: Option<f64>,
    pub atr50: Option<f64>,

    /// Close of the previously committed bar.
    pub prev_close: Option<f64>,

    /// Trailing closes feeding the Bollinger width (capacity 200).
    pub closes: RingBuffer,
    /// Trailing band-widths feeding the adaptive volatility threshold.
    pub widths: RingBuffer,
}

impl IndicatorState {
    /// Create a fresh state with the given band-width window capacity.
    pub fn new(width_window_capacity: usize) -> Self {
        Self {
            ema12: None,
            ema26: None,
            ema20: None,
            ema50: None,
            ema200: None,
            macd_signal: None,
            avg_gain: None,
            avg_loss: None,
            atr14: None,
            atr50: None,
            prev_close: None,
            closes: RingBuffer::new(CLOSE_WINDOW_CAPACITY),
            widths: RingBuffer::new(width_window_capacity),
        }
    }

    /// Record the close of the bar that has just been fully processed.
    ///
    /// Called by the detector after classification so that RSI deltas and
    /// true ranges computed for the *next* bar see the correct previous close.
    pub fn commit_close(&mut self, close: f64) {
        self.prev_close = Some(close);
    }
}

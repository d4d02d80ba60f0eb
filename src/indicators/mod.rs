// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Strictly incremental, O(1)-per-bar indicator plumbing:
// - `math`        — pure recurrences (EMA, Wilder, true range, band width)
// - `window`      — fixed-capacity ring buffer for trailing samples
// - `state`       — per-timeframe accumulator container
// - `calculators` — per-bar advance deriving RSI, ATR ratio, MACD histogram,
//                   EMA slope and Bollinger width

pub mod calculators;
pub mod math;
pub mod state;
pub mod window;

pub use calculators::IndicatorValues;
pub use state::IndicatorState;

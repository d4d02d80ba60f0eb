// =============================================================================
// Regime Engine — real-time market-regime classification
// =============================================================================
//
// Given a stream of OHLC bars per timeframe, the engine incrementally
// computes technical indicators (O(1) per bar, no look-back recomputation),
// scores directional and volatility state, filters the result against a
// higher-timeframe bias and a hysteresis state machine, and emits a
// stabilized regime label with a confidence score. Identical input sequences
// produce identical output.
//
// The HTTP/transport layers, broker clients and data loading live outside
// this crate; they feed bars in and consume `RegimeSnapshot` /
// `RegimeEnrichment` records out.

pub mod config;
pub mod htf_bias;
pub mod indicators;
pub mod regime;
pub mod types;

pub use config::EngineConfig;
pub use htf_bias::{HtfBiasCalculator, HtfRule};
pub use indicators::{IndicatorState, IndicatorValues};
pub use regime::{
    ClassificationResult, RegimeDetector, RegimeEnrichment, RegimeManager, RegimeSnapshot,
    RegimeStateMachine, RegimeStats,
};
pub use types::{Bar, Direction, HtfBias, RegimeLabel, Volatility};

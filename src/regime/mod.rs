// =============================================================================
// Regime Detection Module
// =============================================================================
//
// Regime classification pipeline, bottom to top:
// - `classifier`     — stateless directional/volatility scoring
// - `state_machine`  — hysteresis filter against label flapping
// - `detector`       — per-timeframe orchestrator (warmup, history, export)
// - `manager`        — multi-timeframe coordination

pub mod classifier;
pub mod detector;
pub mod manager;
pub mod state_machine;

pub use classifier::ClassificationResult;
pub use detector::{RegimeDetector, RegimeSnapshot, RegimeStats};
pub use manager::{RegimeEnrichment, RegimeManager};
pub use state_machine::RegimeStateMachine;

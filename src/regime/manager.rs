// =============================================================================
// Regime Manager — multi-timeframe coordination
// =============================================================================
//
// Owns one detector per configured timeframe. Setup replays the available
// historical bars through each detector (this replay consumes the detector's
// own warmup counter — the historical depth and the configured warmup length
// are independent knobs that usually, but need not, match). Live bars are
// then routed per timeframe with a running index counter.
//
// Each detector is fully independent state, so an external scheduler may
// drive different timeframes in parallel as long as no two calls hit the
// same detector concurrently. The latest-snapshot cache sits behind an
// `RwLock` so read-side regime lookups never contend with detector mutation.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::regime::detector::{RegimeDetector, RegimeSnapshot};
use crate::types::Bar;

/// Consumer-facing record derived from the latest snapshot of a timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeEnrichment {
    pub regime: String,
    pub regime_confidence: f64,
    pub is_transition: bool,
    /// Epoch milliseconds of the underlying bar; absent for the sentinel.
    pub regime_timestamp: Option<i64>,
}

impl RegimeEnrichment {
    /// Sentinel for timeframes that were never set up.
    pub fn unknown() -> Self {
        Self {
            regime: "unknown".to_string(),
            regime_confidence: 0.0,
            is_transition: false,
            regime_timestamp: None,
        }
    }

    fn from_snapshot(snapshot: &RegimeSnapshot) -> Self {
        Self {
            regime: snapshot.regime.to_string(),
            regime_confidence: snapshot.confidence,
            is_transition: snapshot.is_transition,
            regime_timestamp: Some(snapshot.timestamp),
        }
    }
}

/// Multi-timeframe regime coordinator.
pub struct RegimeManager {
    config: EngineConfig,
    detectors: HashMap<String, RegimeDetector>,
    /// Running bar-index counter per timeframe.
    next_index: HashMap<String, u64>,
    /// Most recent snapshot per timeframe.
    latest: RwLock<HashMap<String, RegimeSnapshot>>,
}

impl RegimeManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            detectors: HashMap::new(),
            next_index: HashMap::new(),
            latest: RwLock::new(HashMap::new()),
        }
    }

    /// Construct one detector per timeframe and replay its historical bars.
    ///
    /// Bars are re-stamped with sequential indices starting at 0 so the
    /// strict-ordering contract holds regardless of how the caller indexed
    /// its history.
    pub fn setup(&mut self, timeframes: &[String], historical: &HashMap<String, Vec<Bar>>) {
        for timeframe in timeframes {
            let mut detector = RegimeDetector::new(self.config.clone());
            let bars = historical.get(timeframe).map(Vec::as_slice).unwrap_or(&[]);

            for (i, bar) in bars.iter().enumerate() {
                let mut stamped = *bar;
                stamped.index = i as u64;
                let snapshot = detector.process(&stamped);
                self.latest.write().insert(timeframe.clone(), snapshot);
            }

            info!(
                timeframe = %timeframe,
                historical_bars = bars.len(),
                warmup = self.config.warmup_bars,
                "detector initialised"
            );

            self.next_index.insert(timeframe.clone(), bars.len() as u64);
            self.detectors.insert(timeframe.clone(), detector);
        }
    }

    /// Route one live bar to its timeframe's detector.
    ///
    /// The bar's index is overwritten with the timeframe's running counter.
    /// An unconfigured timeframe is answered with the "unknown" sentinel.
    pub fn update(&mut self, timeframe: &str, mut bar: Bar) -> RegimeEnrichment {
        let Some(detector) = self.detectors.get_mut(timeframe) else {
            warn!(timeframe, "update for timeframe that was never set up");
            return RegimeEnrichment::unknown();
        };

        let index = self.next_index.entry(timeframe.to_string()).or_insert(0);
        bar.index = *index;
        *index += 1;

        let snapshot = detector.process(&bar);
        self.latest.write().insert(timeframe.to_string(), snapshot);
        RegimeEnrichment::from_snapshot(&snapshot)
    }

    /// Latest enrichment for one timeframe, or — with `None` — for the
    /// timeframe whose latest snapshot is the most recent across the board.
    pub fn get_regime(&self, timeframe: Option<&str>) -> RegimeEnrichment {
        let latest = self.latest.read();
        match timeframe {
            Some(tf) => match latest.get(tf) {
                Some(snapshot) => RegimeEnrichment::from_snapshot(snapshot),
                None => {
                    warn!(timeframe = tf, "regime lookup for unknown timeframe");
                    RegimeEnrichment::unknown()
                }
            },
            None => latest
                .values()
                .max_by_key(|s| s.timestamp)
                .map(RegimeEnrichment::from_snapshot)
                .unwrap_or_else(RegimeEnrichment::unknown),
        }
    }

    /// Borrow a timeframe's detector (stats, export, history access).
    pub fn detector(&self, timeframe: &str) -> Option<&RegimeDetector> {
        self.detectors.get(timeframe)
    }

    /// Timeframes that were set up, in no particular order.
    pub fn timeframes(&self) -> Vec<String> {
        self.detectors.keys().cloned().collect()
    }
}

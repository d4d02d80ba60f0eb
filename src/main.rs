// =============================================================================
// Regime Engine — demo runner
// =============================================================================
//
// Replays a deterministic synthetic data set through the multi-timeframe
// manager (historical warmup, then live streaming updates), logs the regimes
// that fall out, and writes one export document per timeframe. The same
// inputs always produce the same exports.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use regime_engine::{Bar, EngineConfig, RegimeManager};

const CONFIG_PATH: &str = "engine_config.json";
const HISTORICAL_BARS: usize = 300;
const LIVE_BARS: usize = 60;

/// Deterministic synthetic close series: a slow trend with a phase-shifted
/// oscillation so the regimes actually move around.
fn synthetic_close(i: usize, phase: f64) -> f64 {
    let t = i as f64;
    100.0 + t * 0.08 + 3.0 * (t * 0.05 + phase).sin() + 0.8 * (t * 0.23 + phase * 2.0).sin()
}

fn synthetic_bar(i: usize, step_ms: i64, phase: f64) -> Bar {
    let close = synthetic_close(i, phase);
    let open = if i == 0 {
        close
    } else {
        synthetic_close(i - 1, phase)
    };
    let spread = 0.4 + 0.3 * ((i as f64 * 0.11 + phase).cos()).abs();
    Bar::new(
        i as i64 * step_ms,
        open,
        open.max(close) + spread,
        open.min(close) - spread,
        close,
        i as u64,
    )
}

fn step_ms(timeframe: &str) -> i64 {
    match timeframe {
        "1m" => 60_000,
        "5m" => 300_000,
        "15m" => 900_000,
        "1h" => 3_600_000,
        _ => 60_000,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        EngineConfig::default()
    });
    let timeframes = config.timeframes.clone();

    info!(
        warmup = config.warmup_bars,
        persist_n = config.persist_n,
        transition_bars = config.transition_bars,
        htf_rule = ?config.htf_rule,
        timeframes = ?timeframes,
        "regime engine starting"
    );

    // --- Historical warmup ---------------------------------------------------
    let mut historical: HashMap<String, Vec<Bar>> = HashMap::new();
    for (n, timeframe) in timeframes.iter().enumerate() {
        let step = step_ms(timeframe);
        let phase = n as f64 * 1.7;
        let bars = (0..HISTORICAL_BARS)
            .map(|i| synthetic_bar(i, step, phase))
            .collect();
        historical.insert(timeframe.clone(), bars);
    }

    let mut manager = RegimeManager::new(config.clone());
    manager.setup(&timeframes, &historical);

    for timeframe in &timeframes {
        let enrichment = manager.get_regime(Some(timeframe));
        info!(
            timeframe = %timeframe,
            regime = %enrichment.regime,
            confidence = format!("{:.2}", enrichment.regime_confidence),
            "post-warmup regime"
        );
    }

    // --- Live streaming ------------------------------------------------------
    for (n, timeframe) in timeframes.clone().iter().enumerate() {
        let step = step_ms(timeframe);
        let phase = n as f64 * 1.7;
        for i in HISTORICAL_BARS..HISTORICAL_BARS + LIVE_BARS {
            let bar = synthetic_bar(i, step, phase);
            let enrichment = manager.update(timeframe, bar);
            if enrichment.is_transition {
                info!(
                    timeframe = %timeframe,
                    regime = %enrichment.regime,
                    confidence = format!("{:.2}", enrichment.regime_confidence),
                    "regime in transition"
                );
            }
        }
    }

    let global = manager.get_regime(None);
    info!(
        regime = %global.regime,
        confidence = format!("{:.2}", global.regime_confidence),
        "most recent regime across timeframes"
    );

    // --- Export ---------------------------------------------------------------
    std::fs::create_dir_all("exports")?;
    for timeframe in &timeframes {
        if let Some(detector) = manager.detector(timeframe) {
            let path = format!("exports/regime_{timeframe}.json");
            detector.export(&path)?;
            let stats = detector.stats();
            info!(
                timeframe = %timeframe,
                path = %path,
                bars = detector.bars_processed(),
                transitions = stats.total_transitions,
                "export written"
            );
        }
    }

    Ok(())
}

// =============================================================================
// Higher Time Frame (HTF) Bias
// =============================================================================
//
// Aggregates the per-timeframe bar stream into coarser buckets (hourly,
// 4-hourly or daily) and derives a bull/bear/neutral bias used to suppress
// counter-trend regime labels downstream.
//
// HTF indicators only advance on bucket *close* — the first bar that lands in
// a new bucket triggers a recompute using the final close of the bucket that
// just ended. Bars inside an open bucket merely refresh the tracked close.
//
// Decision rule on bucket close (`c` = closing price of the ended bucket):
//   bull    = c > EMA200  AND  MACD histogram > 0
//   bear    = c < EMA200  AND  MACD histogram < 0
//   neutral = otherwise
//
// The bias is sticky: when any required accumulator is still absent, the
// previous bias is kept rather than reset to neutral, so downstream filtering
// never sees the bias flap to neutral mid-warmup.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::math::ema_update;
use crate::types::{Bar, HtfBias};

const HTF_FAST_PERIOD: usize = 12;
const HTF_SLOW_PERIOD: usize = 26;
const HTF_TREND_PERIOD: usize = 200;
const HTF_SIGNAL_PERIOD: usize = 9;

/// Granularity of the higher-timeframe bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtfRule {
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "1d")]
    Daily,
}

impl HtfRule {
    /// Bucket size in epoch milliseconds.
    pub fn bucket_ms(self) -> i64 {
        match self {
            Self::Hourly => 3_600_000,
            Self::FourHour => 14_400_000,
            Self::Daily => 86_400_000,
        }
    }
}

impl std::fmt::Display for HtfRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hourly => write!(f, "1h"),
            Self::FourHour => write!(f, "4h"),
            Self::Daily => write!(f, "1d"),
        }
    }
}

/// Floor `timestamp_ms` to the start of its bucket for the given rule.
///
/// Plain integer arithmetic on epoch milliseconds — deliberately independent
/// of any date-library rounding semantics. A timestamp that sits exactly on a
/// bucket boundary is its own bucket start.
pub fn bucket_start(timestamp_ms: i64, rule: HtfRule) -> i64 {
    let size = rule.bucket_ms();
    timestamp_ms - timestamp_ms.rem_euclid(size)
}

/// Per-timeframe HTF bias state machine.
///
/// Owned exclusively by one detector; mutated only when a bar's timestamp
/// crosses into a new bucket.
#[derive(Debug, Clone)]
pub struct HtfBiasCalculator {
    rule: Option<HtfRule>,
    /// Start of the bucket currently being filled, `None` before any bar.
    bucket: Option<i64>,
    /// Most recent close seen inside the current bucket.
    last_close: f64,
    ema12: Option<f64>,
    ema26: Option<f64>,
    ema200: Option<f64>,
    macd_signal: Option<f64>,
    bias: HtfBias,
}

impl HtfBiasCalculator {
    /// Create a calculator; with no rule configured the bias is permanently
    /// neutral.
    pub fn new(rule: Option<HtfRule>) -> Self {
        Self {
            rule,
            bucket: None,
            last_close: 0.0,
            ema12: None,
            ema26: None,
            ema200: None,
            macd_signal: None,
            bias: HtfBias::Neutral,
        }
    }

    /// Current bias without advancing state.
    pub fn bias(&self) -> HtfBias {
        self.bias
    }

    /// Feed one bar and return the (possibly updated) bias.
    pub fn update(&mut self, bar: &Bar) -> HtfBias {
        let Some(rule) = self.rule else {
            return HtfBias::Neutral;
        };

        let bucket = bucket_start(bar.timestamp, rule);

        match self.bucket {
            // First bar ever: record the bucket, no indicator work yet.
            None => {
                self.bucket = Some(bucket);
                self.last_close = bar.close;
            }
            // Same bucket: just track the latest close.
            Some(current) if current == bucket => {
                self.last_close = bar.close;
            }
            // New bucket: the previous one closed at `self.last_close`.
            Some(_) => {
                self.on_bucket_close(rule, bucket, bar.close);
            }
        }

        self.bias
    }

    fn on_bucket_close(&mut self, rule: HtfRule, new_bucket: i64, new_close: f64) {
        let closed = self.last_close;

        self.ema12 = Some(ema_update(self.ema12, closed, HTF_FAST_PERIOD));
        self.ema26 = Some(ema_update(self.ema26, closed, HTF_SLOW_PERIOD));
        self.ema200 = Some(ema_update(self.ema200, closed, HTF_TREND_PERIOD));

        if let (Some(e12), Some(e26)) = (self.ema12, self.ema26) {
            let line = e12 - e26;
            self.macd_signal = Some(ema_update(self.macd_signal, line, HTF_SIGNAL_PERIOD));
        }

        // Classification requires the full accumulator set; otherwise the
        // bias stays at its previous value.
        if let (Some(e200), Some(e12), Some(e26), Some(signal)) =
            (self.ema200, self.ema12, self.ema26, self.macd_signal)
        {
            let histogram = (e12 - e26) - signal;
            let new_bias = if closed > e200 && histogram > 0.0 {
                HtfBias::Bull
            } else if closed < e200 && histogram < 0.0 {
                HtfBias::Bear
            } else {
                HtfBias::Neutral
            };
            if new_bias != self.bias {
                debug!(
                    rule = %rule,
                    close = closed,
                    prev = %self.bias,
                    next = %new_bias,
                    "HTF bias changed on bucket close"
                );
            }
            self.bias = new_bias;
        }

        self.bucket = Some(new_bucket);
        self.last_close = new_close;
    }
}

//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single emitted point, keyed by candle time
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//! - `IndicatorState`: Per-kind toggle plus the series computed for it
//!
//! Every calculation is a pure function of the candle slice and its
//! parameters. Warm-up indices are omitted rather than flagged, so a series
//! shorter than its window comes back empty.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::calculate_bollinger;
pub use ema::ema_values;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::candle::Candle;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "MA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Indicator identity without parameters, used for toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    Ma,
    Bollinger,
    Rsi,
    Macd,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [
        IndicatorKind::Ma,
        IndicatorKind::Bollinger,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
    ];

    /// Overlays are drawn on the price pane, oscillators on their own pane.
    pub fn is_overlay(&self) -> bool {
        matches!(self, IndicatorKind::Ma | IndicatorKind::Bollinger)
    }

    pub fn is_oscillator(&self) -> bool {
        !self.is_overlay()
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorKind::Ma => "MA",
            IndicatorKind::Bollinger => "Bollinger Bands",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
        };
        f.write_str(name)
    }
}

/// Window and period parameters for every indicator kind.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub ma_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult_x100: u32,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_period: sma::DEFAULT_PERIOD,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_mult_x100: bollinger::DEFAULT_MULT_X100,
            rsi_period: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
        }
    }
}

impl IndicatorParams {
    pub fn indicator_type(&self, kind: IndicatorKind) -> IndicatorType {
        match kind {
            IndicatorKind::Ma => IndicatorType::Sma(self.ma_period),
            IndicatorKind::Bollinger => IndicatorType::Bollinger {
                period: self.bollinger_period,
                stddev_mult_x100: self.bollinger_mult_x100,
            },
            IndicatorKind::Rsi => IndicatorType::Rsi(self.rsi_period),
            IndicatorKind::Macd => IndicatorType::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
        }
    }
}

pub fn compute_indicator(candles: &[Candle], indicator_type: &IndicatorType) -> IndicatorSeries {
    match *indicator_type {
        IndicatorType::Sma(period) => calculate_sma(candles, period),
        IndicatorType::Rsi(period) => calculate_rsi(candles, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(candles, fast, slow, signal),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(candles, period, stddev_mult_x100),
    }
}

/// One indicator's toggle and its computed data. Replaced wholesale on
/// every recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorState {
    pub kind: IndicatorKind,
    pub active: bool,
    pub data: IndicatorSeries,
}

/// Recompute the state of every kind. Inactive kinds carry an empty series.
pub fn compute_states(
    candles: &[Candle],
    is_active: impl Fn(IndicatorKind) -> bool,
    params: &IndicatorParams,
) -> Vec<IndicatorState> {
    IndicatorKind::ALL
        .iter()
        .map(|&kind| {
            let indicator_type = params.indicator_type(kind);
            let active = is_active(kind);
            let data = if active {
                compute_indicator(candles, &indicator_type)
            } else {
                IndicatorSeries::empty(indicator_type)
            };
            IndicatorState { kind, active, data }
        })
        .collect()
}

//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Output starts once the signal EMA is seeded, i.e. at index
//! max(fast, slow) - 1 + signal - 1.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    // First index where both EMAs are seeded.
    let macd_start = fast.max(slow) - 1;
    if closes.len() <= macd_start {
        return IndicatorSeries::empty(indicator_type);
    }

    let macd_line: Vec<f64> = (macd_start..closes.len())
        .map(|i| ema_fast[i + 1 - fast] - ema_slow[i + 1 - slow])
        .collect();
    let signal_line = ema_values(&macd_line, signal_period);

    // signal_line[j] belongs to macd_line[j + signal_period - 1]
    let offset = signal_period - 1;
    let values = signal_line
        .iter()
        .enumerate()
        .map(|(j, &signal)| {
            let line = macd_line[j + offset];
            IndicatorPoint {
                time: candles[macd_start + offset + j].time,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

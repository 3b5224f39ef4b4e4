//! Simple Moving Average over closing prices.
//!
//! MA[i] = mean(close[i-n+1..=i]), emitted for i >= n-1.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 20;

/// Arithmetic mean of `close` over `window`.
pub(crate) fn mean_close(window: &[Candle]) -> f64 {
    window.iter().map(|c| c.close).sum::<f64>() / window.len() as f64
}

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.len() < period {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let values = candles
        .windows(period)
        .map(|window| IndicatorPoint {
            time: window[period - 1].time,
            value: IndicatorValue::Simple(mean_close(window)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

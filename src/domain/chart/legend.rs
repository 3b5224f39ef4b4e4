//! Crosshair legend for the main pane.

use std::fmt;

use crate::domain::candle::{Candle, Instrument};
use crate::domain::controls::{ChartType, Timeframe};

/// Two legend rows: instrument header and the hovered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendText {
    pub header: String,
    pub values: String,
}

impl fmt::Display for LegendText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        write!(f, "{}", self.values)
    }
}

/// What the crosshair is over, in the shape of the price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverPoint {
    Ohlc {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
    Price(f64),
}

impl HoverPoint {
    pub fn from_candle(candle: &Candle, chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Candlestick => HoverPoint::Ohlc {
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
            },
            ChartType::Line => HoverPoint::Price(candle.close),
        }
    }
}

pub fn header_line(instrument: &Instrument, timeframe: Timeframe) -> String {
    format!(
        "{} | {} | Timeframe: {}",
        instrument.company_name, instrument.exchange_code, timeframe
    )
}

#[derive(Debug, Clone)]
pub struct Legend {
    header: String,
}

impl Legend {
    pub fn new(instrument: &Instrument, timeframe: Timeframe) -> Self {
        Self {
            header: header_line(instrument, timeframe),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Legend text for the hovered point; `None` resets the value row.
    pub fn on_hover_point_change(&self, point: Option<&HoverPoint>) -> LegendText {
        let values = match point {
            Some(HoverPoint::Ohlc {
                open,
                high,
                low,
                close,
            }) => format!(
                "OHLC: O: {:.2} | H: {:.2} | L: {:.2} | C: {:.2}",
                open, high, low, close
            ),
            Some(HoverPoint::Price(price)) => format!("OHLC: Price: {:.2}", price),
            None => "OHLC: ".to_string(),
        };
        LegendText {
            header: self.header.clone(),
            values,
        }
    }
}

//! Candle and instrument representations.

use serde::Deserialize;

/// A raw candle as handed over by the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCandle {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// `{ "data": [...] }` envelope of a candle fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandlePayload {
    pub data: Vec<RawCandle>,
}

impl CandlePayload {
    pub fn from_json(content: &str) -> Result<Self, crate::domain::error::ChartError> {
        serde_json::from_str(content).map_err(|e| crate::domain::error::ChartError::Payload {
            reason: e.to_string(),
        })
    }
}

/// A normalized candle. `time` is epoch seconds shifted into the display
/// timezone and is the time-axis key of every chart series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Histogram value of the volume series.
    pub fn value(&self) -> f64 {
        self.volume
    }

    /// high >= max(open, close) and low <= min(open, close)
    pub fn is_consistent(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

/// The subscribed instrument a chart is drawn for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub id: u64,
    pub company_name: String,
    pub exchange_code: String,
}

//! Candle fetch port.

use crate::domain::candle::{CandlePayload, Instrument};
use crate::domain::controls::Timeframe;
use crate::domain::error::ChartError;

pub trait CandleSourcePort {
    fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
    ) -> Result<CandlePayload, ChartError>;
}

//! Candle export port.

use crate::domain::candle::Candle;
use crate::domain::error::ChartError;
use std::io::Write;

/// Port for serializing the charted candle series.
pub trait ExportPort {
    fn write_candles(&self, candles: &[Candle], out: &mut dyn Write) -> Result<(), ChartError>;

    /// Default implementation: buffers `write_candles` into a string.
    fn export_string(&self, candles: &[Candle]) -> Result<String, ChartError> {
        let mut buf = Vec::new();
        self.write_candles(candles, &mut buf)?;
        String::from_utf8(buf).map_err(|e| ChartError::Export {
            reason: e.to_string(),
        })
    }
}

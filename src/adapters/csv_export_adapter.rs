//! CSV export adapter.

use crate::domain::candle::Candle;
use crate::domain::error::ChartError;
use crate::domain::export::{csv_record, CSV_HEADER};
use crate::ports::export_port::ExportPort;
use std::io::Write;

pub struct CsvExportAdapter;

impl ExportPort for CsvExportAdapter {
    fn write_candles(&self, candles: &[Candle], out: &mut dyn Write) -> Result<(), ChartError> {
        let mut wtr = csv::Writer::from_writer(out);
        let to_export = |e: csv::Error| ChartError::Export {
            reason: format!("CSV write error: {}", e),
        };

        wtr.write_record(CSV_HEADER).map_err(to_export)?;
        for candle in candles {
            wtr.write_record(csv_record(candle)).map_err(to_export)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

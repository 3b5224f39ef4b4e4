//! JSON file candle source.
//!
//! Reads `{ "data": [...] }` payloads either from a directory laid out as
//! `<instrumentId>_<timeframe>.json` or from one fixed file.

use crate::domain::candle::{CandlePayload, Instrument};
use crate::domain::controls::Timeframe;
use crate::domain::error::ChartError;
use crate::ports::candle_source_port::CandleSourcePort;
use std::fs;
use std::path::PathBuf;

enum Location {
    Directory(PathBuf),
    File(PathBuf),
}

pub struct JsonCandleAdapter {
    location: Location,
}

impl JsonCandleAdapter {
    pub fn from_dir(base_path: PathBuf) -> Self {
        Self {
            location: Location::Directory(base_path),
        }
    }

    pub fn from_file(path: PathBuf) -> Self {
        Self {
            location: Location::File(path),
        }
    }

    pub fn payload_path(&self, instrument: &Instrument, timeframe: Timeframe) -> PathBuf {
        match &self.location {
            Location::Directory(base) => base.join(format!("{}_{}.json", instrument.id, timeframe)),
            Location::File(path) => path.clone(),
        }
    }
}

impl CandleSourcePort for JsonCandleAdapter {
    fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
    ) -> Result<CandlePayload, ChartError> {
        let path = self.payload_path(instrument, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| ChartError::Fetch {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "read candle payload");
        CandlePayload::from_json(&content)
    }
}

//! CSV export of the charted series.

use crate::domain::candle::Candle;
use crate::domain::controls::Timeframe;

pub const CSV_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// `<companyName>_<timeframeMinutes>_data.csv`
pub fn csv_filename(company_name: &str, timeframe: Timeframe) -> String {
    format!("{}_{}_data.csv", company_name, timeframe)
}

/// One export row. `Date` is the normalized time key, not reformatted.
pub fn csv_record(candle: &Candle) -> [String; 6] {
    [
        candle.time.to_string(),
        candle.open.to_string(),
        candle.high.to_string(),
        candle.low.to_string(),
        candle.close.to_string(),
        candle.volume.to_string(),
    ]
}

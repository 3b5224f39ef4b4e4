//! User-facing display controls: timeframe, chart type, indicator and
//! volume toggles.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ChartError;
use crate::domain::indicator::{IndicatorKind, IndicatorParams};

/// Candle bucket size in minutes. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timeframe(u32);

impl Timeframe {
    pub const PRESETS: [u32; 7] = [5, 10, 15, 30, 60, 240, 1440];
    pub const DEFAULT_MINUTES: u32 = 60;

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then_some(Self(minutes))
    }

    pub fn presets() -> impl Iterator<Item = Timeframe> {
        Self::PRESETS.into_iter().map(Timeframe)
    }

    /// Validate a custom timeframe typed by the user.
    pub fn parse_custom(input: &str) -> Result<Self, ChartError> {
        let trimmed = input.trim();
        let reject = |reason: &str| ChartError::InvalidTimeframe {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(reject("please enter a positive number"));
        }
        let minutes: i64 = trimmed
            .parse()
            .map_err(|_| reject("please enter a positive number"))?;
        if minutes <= 0 {
            return Err(reject("timeframe must be positive"));
        }
        u32::try_from(minutes)
            .map(Timeframe)
            .map_err(|_| reject("timeframe is too large"))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn is_preset(&self) -> bool {
        Self::PRESETS.contains(&self.0)
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartType {
    #[default]
    Candlestick,
    Line,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartType::Candlestick => write!(f, "Candlestick"),
            ChartType::Line => write!(f, "Line"),
        }
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "candlestick" | "candle" => Ok(ChartType::Candlestick),
            "line" => Ok(ChartType::Line),
            other => Err(format!("unknown chart type '{}'", other)),
        }
    }
}

/// Everything the user can change about the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub timeframe: Timeframe,
    pub chart_type: ChartType,
    pub show_volume: bool,
    pub active: BTreeSet<IndicatorKind>,
    pub params: IndicatorParams,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            chart_type: ChartType::default(),
            show_volume: true,
            active: BTreeSet::new(),
            params: IndicatorParams::default(),
        }
    }
}

impl DisplayOptions {
    pub fn is_active(&self, kind: IndicatorKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn set_indicator(&mut self, kind: IndicatorKind, on: bool) {
        if on {
            self.active.insert(kind);
        } else {
            self.active.remove(&kind);
        }
    }

    pub fn active_overlays(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.active.iter().copied().filter(IndicatorKind::is_overlay)
    }

    pub fn active_oscillators(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.active.iter().copied().filter(IndicatorKind::is_oscillator)
    }
}

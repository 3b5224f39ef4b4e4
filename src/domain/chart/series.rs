//! Renderable series: what a pane draws and the data bound to it.
//!
//! The builders here turn normalized candles and indicator output into
//! surface-ready series. They never touch a surface themselves.

use crate::domain::candle::Candle;
use crate::domain::controls::ChartType;
use crate::domain::indicator::{IndicatorKind, IndicatorState, IndicatorValue};

pub mod palette {
    pub const UP: &str = "#10B981";
    pub const DOWN: &str = "#EF4444";
    pub const LINE: &str = "#3B82F6";
    pub const MA: &str = "#F59E0B";
    pub const BOLLINGER: &str = "#F59E0B";
    pub const VOLUME: &str = "#D1D5DB";
    pub const RSI: &str = "#F59E0B";
    pub const MACD: &str = "#3B82F6";
    pub const SIGNAL: &str = "#EF4444";
    pub const HISTOGRAM: &str = "#10B981";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneKind {
    Main,
    Oscillator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Candlestick,
    Line,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceScale {
    /// Shared right-hand price axis.
    Right,
    /// Own axis squeezed into the bottom of the pane (volume).
    Overlay,
    Fixed { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub label: String,
    pub kind: SeriesKind,
    pub color: &'static str,
    /// Colour of bearish candles; candlestick series only.
    pub down_color: Option<&'static str>,
    pub line_width: u32,
    pub scale: PriceScale,
}

impl SeriesSpec {
    fn line(label: &str, color: &'static str, line_width: u32) -> Self {
        Self {
            label: label.to_string(),
            kind: SeriesKind::Line,
            color,
            down_color: None,
            line_width,
            scale: PriceScale::Right,
        }
    }

    fn histogram(label: &str, color: &'static str, scale: PriceScale) -> Self {
        Self {
            label: label.to_string(),
            kind: SeriesKind::Histogram,
            color,
            down_color: None,
            line_width: 1,
            scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OhlcPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcPoint {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    pub time: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Ohlc(Vec<OhlcPoint>),
    Values(Vec<ValuePoint>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Ohlc(points) => points.len(),
            SeriesData::Values(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (first, last) time key, if any.
    pub fn time_bounds(&self) -> Option<(i64, i64)> {
        match self {
            SeriesData::Ohlc(points) => Some((points.first()?.time, points.last()?.time)),
            SeriesData::Values(points) => Some((points.first()?.time, points.last()?.time)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesId(pub usize);

pub type BoundSeries = (SeriesSpec, SeriesData);

pub fn price_series(candles: &[Candle], chart_type: ChartType) -> BoundSeries {
    match chart_type {
        ChartType::Candlestick => (
            SeriesSpec {
                label: "Price".to_string(),
                kind: SeriesKind::Candlestick,
                color: palette::UP,
                down_color: Some(palette::DOWN),
                line_width: 1,
                scale: PriceScale::Right,
            },
            SeriesData::Ohlc(
                candles
                    .iter()
                    .map(|c| OhlcPoint {
                        time: c.time,
                        open: c.open,
                        high: c.high,
                        low: c.low,
                        close: c.close,
                    })
                    .collect(),
            ),
        ),
        ChartType::Line => (
            SeriesSpec::line("Price", palette::LINE, 2),
            SeriesData::Values(
                candles
                    .iter()
                    .map(|c| ValuePoint {
                        time: c.time,
                        value: c.close,
                    })
                    .collect(),
            ),
        ),
    }
}

pub fn volume_series(candles: &[Candle]) -> BoundSeries {
    (
        SeriesSpec::histogram("Volume", palette::VOLUME, PriceScale::Overlay),
        SeriesData::Values(
            candles
                .iter()
                .map(|c| ValuePoint {
                    time: c.time,
                    value: c.value(),
                })
                .collect(),
        ),
    )
}

fn project(state: &IndicatorState, pick: impl Fn(&IndicatorValue) -> Option<f64>) -> SeriesData {
    SeriesData::Values(
        state
            .data
            .values
            .iter()
            .filter_map(|p| {
                pick(&p.value).map(|value| ValuePoint {
                    time: p.time,
                    value,
                })
            })
            .collect(),
    )
}

fn simple(value: &IndicatorValue) -> Option<f64> {
    match value {
        IndicatorValue::Simple(v) => Some(*v),
        _ => None,
    }
}

/// Price-pane series for an overlay indicator (MA, Bollinger).
pub fn overlay_series(state: &IndicatorState) -> Vec<BoundSeries> {
    let label = state.data.indicator_type.to_string();
    match state.kind {
        IndicatorKind::Ma => vec![(SeriesSpec::line(&label, palette::MA, 2), project(state, simple))],
        IndicatorKind::Bollinger => {
            let band = |name: &str| SeriesSpec::line(&format!("{label} {name}"), palette::BOLLINGER, 1);
            vec![
                (
                    band("upper"),
                    project(state, |v| match v {
                        IndicatorValue::Bollinger { upper, .. } => Some(*upper),
                        _ => None,
                    }),
                ),
                (
                    band("middle"),
                    project(state, |v| match v {
                        IndicatorValue::Bollinger { middle, .. } => Some(*middle),
                        _ => None,
                    }),
                ),
                (
                    band("lower"),
                    project(state, |v| match v {
                        IndicatorValue::Bollinger { lower, .. } => Some(*lower),
                        _ => None,
                    }),
                ),
            ]
        }
        IndicatorKind::Rsi | IndicatorKind::Macd => Vec::new(),
    }
}

/// Oscillator-pane series for RSI and MACD.
pub fn oscillator_series(state: &IndicatorState) -> Vec<BoundSeries> {
    let label = state.data.indicator_type.to_string();
    match state.kind {
        IndicatorKind::Rsi => {
            let mut spec = SeriesSpec::line(&label, palette::RSI, 2);
            spec.scale = PriceScale::Fixed {
                min: 0.0,
                max: 100.0,
            };
            vec![(spec, project(state, simple))]
        }
        IndicatorKind::Macd => vec![
            (
                SeriesSpec::line(&label, palette::MACD, 2),
                project(state, |v| match v {
                    IndicatorValue::Macd { line, .. } => Some(*line),
                    _ => None,
                }),
            ),
            (
                SeriesSpec::line(&format!("{label} signal"), palette::SIGNAL, 2),
                project(state, |v| match v {
                    IndicatorValue::Macd { signal, .. } => Some(*signal),
                    _ => None,
                }),
            ),
            (
                SeriesSpec::histogram(&format!("{label} histogram"), palette::HISTOGRAM, PriceScale::Right),
                project(state, |v| match v {
                    IndicatorValue::Macd { histogram, .. } => Some(*histogram),
                    _ => None,
                }),
            ),
        ],
        IndicatorKind::Ma | IndicatorKind::Bollinger => Vec::new(),
    }
}

#![allow(dead_code)]

use candlescope::domain::candle::{Candle, CandlePayload, Instrument, RawCandle};
use candlescope::domain::chart::series::{PaneKind, SeriesData, SeriesId, SeriesSpec};
use candlescope::domain::controls::Timeframe;
use candlescope::domain::error::ChartError;
use candlescope::domain::viewport::VisibleRange;
use candlescope::ports::candle_source_port::CandleSourcePort;
use candlescope::ports::render_port::{RenderSurface, SurfaceFactory};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Created(PaneKind),
    SeriesAdded(PaneKind, String),
    DataSet(PaneKind, usize),
    SpecSet(PaneKind, String),
    Resized(PaneKind, u32, u32),
    Released(PaneKind),
}

/// Shared log of everything done to surfaces produced by one factory.
#[derive(Clone, Default)]
pub struct SurfaceLog(Rc<RefCell<Vec<SurfaceEvent>>>);

impl SurfaceLog {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.0.borrow().clone()
    }

    pub fn created(&self, kind: PaneKind) -> usize {
        self.count(|e| *e == SurfaceEvent::Created(kind))
    }

    pub fn released(&self, kind: PaneKind) -> usize {
        self.count(|e| *e == SurfaceEvent::Released(kind))
    }

    pub fn live(&self) -> usize {
        let created = self.count(|e| matches!(e, SurfaceEvent::Created(_)));
        let released = self.count(|e| matches!(e, SurfaceEvent::Released(_)));
        created - released
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn count(&self, pred: impl Fn(&SurfaceEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: SurfaceEvent) {
        self.0.borrow_mut().push(event);
    }
}

pub struct RecordingSurface {
    kind: PaneKind,
    log: SurfaceLog,
    series: Vec<String>,
}

impl RenderSurface for RecordingSurface {
    fn add_series(&mut self, spec: SeriesSpec) -> SeriesId {
        self.log.push(SurfaceEvent::SeriesAdded(self.kind, spec.label.clone()));
        self.series.push(spec.label);
        SeriesId(self.series.len() - 1)
    }

    fn set_series_data(&mut self, _id: SeriesId, data: SeriesData) {
        self.log.push(SurfaceEvent::DataSet(self.kind, data.len()));
    }

    fn set_series_spec(&mut self, id: SeriesId, spec: SeriesSpec) {
        self.log.push(SurfaceEvent::SpecSet(self.kind, spec.label.clone()));
        if let Some(label) = self.series.get_mut(id.0) {
            *label = spec.label;
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.log.push(SurfaceEvent::Resized(self.kind, width, height));
    }

    fn encode(&self, visible: Option<VisibleRange>) -> String {
        format!("{:?} {:?} {:?}", self.kind, self.series, visible)
    }

    fn release(&mut self) {
        self.log.push(SurfaceEvent::Released(self.kind));
    }
}

pub struct RecordingSurfaceFactory {
    pub log: SurfaceLog,
}

impl RecordingSurfaceFactory {
    pub fn new() -> (Self, SurfaceLog) {
        let log = SurfaceLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl SurfaceFactory for RecordingSurfaceFactory {
    fn create(&self, kind: PaneKind, _width: u32, _height: u32) -> Box<dyn RenderSurface> {
        self.log.push(SurfaceEvent::Created(kind));
        Box::new(RecordingSurface {
            kind,
            log: self.log.clone(),
            series: Vec::new(),
        })
    }
}

/// Candle source keyed by timeframe minutes.
pub struct MockCandleSource {
    pub payloads: HashMap<u32, CandlePayload>,
    pub errors: HashMap<u32, String>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self {
            payloads: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_payload(mut self, minutes: u32, payload: CandlePayload) -> Self {
        self.payloads.insert(minutes, payload);
        self
    }

    pub fn with_error(mut self, minutes: u32, reason: &str) -> Self {
        self.errors.insert(minutes, reason.to_string());
        self
    }
}

impl CandleSourcePort for MockCandleSource {
    fn fetch_candles(
        &self,
        _instrument: &Instrument,
        timeframe: Timeframe,
    ) -> Result<CandlePayload, ChartError> {
        if let Some(reason) = self.errors.get(&timeframe.minutes()) {
            return Err(ChartError::Fetch {
                reason: reason.clone(),
            });
        }
        Ok(self
            .payloads
            .get(&timeframe.minutes())
            .cloned()
            .unwrap_or_default())
    }
}

pub fn acme() -> Instrument {
    Instrument {
        id: 42,
        company_name: "Acme".into(),
        exchange_code: "NSE".into(),
    }
}

/// Raw candles one `step_minutes` apart from 2024-01-02T03:45:00Z.
pub fn raw_candles(closes: &[f64], step_minutes: i64) -> Vec<RawCandle> {
    let start = 1_704_167_100;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let ts = start + i as i64 * step_minutes * 60;
            RawCandle {
                date: chrono::DateTime::from_timestamp(ts, 0)
                    .unwrap()
                    .to_rfc3339(),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: Some(1_000.0 + i as f64),
            }
        })
        .collect()
}

pub fn payload(closes: &[f64], step_minutes: i64) -> CandlePayload {
    CandlePayload {
        data: raw_candles(closes, step_minutes),
    }
}

pub fn rising(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

pub fn zigzag(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
        .collect()
}

pub fn candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            time: 1_704_167_100 + i as i64 * 3600,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 500.0,
        })
        .collect()
}

//! Chart session: one instrument's chart from fetch to teardown.
//!
//! A session issues fetch tickets, applies only the newest one, runs the
//! normalizer and hands the result to the [`ChartController`]. Options set
//! through the session trigger a rebuild once data is loaded.

use std::fmt;
use std::io::Write;

use crate::domain::candle::{Candle, CandlePayload, Instrument};
use crate::domain::chart::{ChartController, ChartInputs, LegendText, PaneLayout, RebuildOutcome};
use crate::domain::controls::{ChartType, DisplayOptions, Timeframe};
use crate::domain::error::ChartError;
use crate::domain::export::csv_filename;
use crate::domain::indicator::{IndicatorKind, IndicatorParams};
use crate::domain::normalizer::{normalize, DisplayOffset, RejectedRow};
use crate::domain::viewport::VisibleRange;
use crate::ports::export_port::ExportPort;
use crate::ports::render_port::SurfaceFactory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    /// No instrument context; terminal.
    NoInstrument,
    Loading,
    Error(String),
    Empty,
    Ready,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::NoInstrument => write!(f, "no instrument data available"),
            DisplayState::Loading => write!(f, "loading"),
            DisplayState::Error(message) => write!(f, "error: {}", message),
            DisplayState::Empty => write!(f, "no candles"),
            DisplayState::Ready => write!(f, "ready"),
        }
    }
}

/// Handle for one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    timeframe: Timeframe,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Superseded by a newer request or already resolved; nothing changed.
    Stale,
}

/// Last request wins: only the most recently issued, unresolved ticket is
/// accepted, whatever order responses arrive in.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
    settled: u64,
}

impl RequestTracker {
    pub fn issue(&mut self, timeframe: Timeframe) -> FetchTicket {
        self.latest += 1;
        FetchTicket {
            seq: self.latest,
            timeframe,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.latest && ticket.seq > self.settled
    }

    /// Accept `ticket` if it is current. Each ticket is accepted at most once.
    pub fn settle(&mut self, ticket: &FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.settled = ticket.seq;
        true
    }

    /// Invalidate every outstanding ticket.
    pub fn cancel_all(&mut self) {
        self.settled = self.latest;
    }
}

pub struct ChartSession {
    instrument: Option<Instrument>,
    options: DisplayOptions,
    offset: DisplayOffset,
    tracker: RequestTracker,
    controller: ChartController,
    candles: Vec<Candle>,
    rejected: Vec<RejectedRow>,
    data_version: u64,
    state: DisplayState,
}

impl ChartSession {
    pub fn new(
        instrument: Option<Instrument>,
        options: DisplayOptions,
        offset: DisplayOffset,
        factory: Box<dyn SurfaceFactory>,
        layout: PaneLayout,
    ) -> Self {
        let state = match instrument {
            Some(_) => DisplayState::Empty,
            None => DisplayState::NoInstrument,
        };
        Self {
            instrument,
            options,
            offset,
            tracker: RequestTracker::default(),
            controller: ChartController::new(factory, layout),
            candles: Vec::new(),
            rejected: Vec::new(),
            data_version: 0,
            state,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        self.instrument.as_ref()
    }

    pub fn controller(&self) -> &ChartController {
        &self.controller
    }

    /// The normalized series currently charted.
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn rejected(&self) -> &[RejectedRow] {
        &self.rejected
    }

    /// Issue a fetch for the current timeframe. Panes are torn down until
    /// the matching response is resolved.
    pub fn refresh(&mut self) -> Result<FetchTicket, ChartError> {
        self.require_instrument()?;
        let ticket = self.tracker.issue(self.options.timeframe);
        self.controller.destroy();
        self.state = DisplayState::Loading;
        tracing::debug!(seq = ticket.seq, timeframe = %ticket.timeframe, "fetch issued");
        Ok(ticket)
    }

    /// Selecting the current timeframe again refreshes.
    /// Without an instrument the current timeframe is kept.
    pub fn select_timeframe(&mut self, timeframe: Timeframe) -> Result<FetchTicket, ChartError> {
        self.require_instrument()?;
        self.options.timeframe = timeframe;
        self.refresh()
    }

    fn require_instrument(&mut self) -> Result<(), ChartError> {
        if self.instrument.is_none() {
            self.state = DisplayState::NoInstrument;
            return Err(ChartError::NoInstrument);
        }
        Ok(())
    }

    /// Validate and select a typed timeframe. Rejected input changes nothing.
    pub fn select_custom_timeframe(&mut self, input: &str) -> Result<FetchTicket, ChartError> {
        let timeframe = Timeframe::parse_custom(input)?;
        self.select_timeframe(timeframe)
    }

    pub fn resolve_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<CandlePayload, ChartError>,
    ) -> FetchOutcome {
        if !self.tracker.settle(&ticket) {
            tracing::warn!(
                seq = ticket.seq,
                timeframe = %ticket.timeframe,
                "discarding superseded fetch response"
            );
            return FetchOutcome::Stale;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(seq = ticket.seq, error = %e, "fetch failed");
                self.candles.clear();
                self.rejected.clear();
                self.state = DisplayState::Error(e.to_string());
                return FetchOutcome::Applied;
            }
        };

        let normalized = normalize(&payload.data, self.offset);
        self.data_version += 1;
        self.candles = normalized.candles;
        self.rejected = normalized.rejected;
        self.state = if self.candles.is_empty() {
            DisplayState::Empty
        } else {
            DisplayState::Ready
        };
        tracing::info!(
            seq = ticket.seq,
            timeframe = %ticket.timeframe,
            candles = self.candles.len(),
            rejected = self.rejected.len(),
            "applied candle fetch"
        );
        self.rebuild();
        FetchOutcome::Applied
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) -> Option<RebuildOutcome> {
        self.options.chart_type = chart_type;
        self.rebuild()
    }

    pub fn set_show_volume(&mut self, show: bool) -> Option<RebuildOutcome> {
        self.options.show_volume = show;
        self.rebuild()
    }

    pub fn set_indicator(&mut self, kind: IndicatorKind, on: bool) -> Option<RebuildOutcome> {
        self.options.set_indicator(kind, on);
        self.rebuild()
    }

    pub fn set_params(&mut self, params: IndicatorParams) -> Option<RebuildOutcome> {
        self.options.params = params;
        self.rebuild()
    }

    pub fn hover(&self, time: Option<i64>) -> Option<LegendText> {
        self.controller.crosshair_move(time)
    }

    pub fn resize(&mut self, container_width: u32, viewport_height: u32) {
        self.controller.resize(container_width, viewport_height);
    }

    pub fn scroll(&self, range: VisibleRange) -> bool {
        self.controller.scroll_main(range)
    }

    /// Export file name, `None` without an instrument.
    pub fn export_filename(&self) -> Option<String> {
        let instrument = self.instrument.as_ref()?;
        Some(csv_filename(&instrument.company_name, self.options.timeframe))
    }

    /// Write exactly the charted series.
    pub fn export_csv(&self, exporter: &dyn ExportPort, out: &mut dyn Write) -> Result<(), ChartError> {
        exporter.write_candles(&self.candles, out)
    }

    /// Tear every pane down and ignore responses still in flight.
    pub fn unmount(mut self) {
        self.tracker.cancel_all();
        self.controller.destroy();
        tracing::debug!("chart session unmounted");
    }

    /// Rebuild panes from loaded data. `None` while nothing is loaded.
    fn rebuild(&mut self) -> Option<RebuildOutcome> {
        let instrument = self.instrument.as_ref()?;
        if self.data_version == 0
            || !matches!(self.state, DisplayState::Ready | DisplayState::Empty)
        {
            return None;
        }
        Some(self.controller.rebuild(ChartInputs {
            candles: &self.candles,
            data_version: self.data_version,
            instrument,
            options: &self.options,
        }))
    }
}

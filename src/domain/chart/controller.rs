//! Chart lifecycle controller.
//!
//! The controller is the only owner of chart handles. Every change goes
//! through [`ChartController::rebuild`], which either rebinds series data in
//! place (parameter-only change) or tears all panes down and recreates them.
//! Teardown always runs in the same order: sync link, oscillator, main.

use std::collections::HashSet;

use crate::domain::candle::{Candle, Instrument};
use crate::domain::chart::legend::{HoverPoint, Legend, LegendText};
use crate::domain::chart::pane::{ChartHandle, PaneState};
use crate::domain::chart::series::{
    oscillator_series, overlay_series, price_series, volume_series, BoundSeries, PaneKind,
};
use crate::domain::controls::{ChartType, DisplayOptions};
use crate::domain::indicator::{compute_states, IndicatorKind, IndicatorState};
use crate::domain::viewport::{attach, SyncLink, VisibleRange};
use crate::ports::render_port::SurfaceFactory;

/// Everything a rebuild depends on.
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    pub candles: &'a [Candle],
    /// Bumped by the caller whenever a new candle set replaces the old one.
    pub data_version: u64,
    pub instrument: &'a Instrument,
    pub options: &'a DisplayOptions,
}

/// Container size the panes are laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    pub container_width: u32,
    pub viewport_height: u32,
}

impl PaneLayout {
    pub const MAIN_FRACTION: f64 = 0.5;
    pub const OSCILLATOR_FRACTION: f64 = 0.2;

    pub fn new(container_width: u32, viewport_height: u32) -> Self {
        Self {
            container_width,
            viewport_height,
        }
    }

    pub fn height(&self, kind: PaneKind) -> u32 {
        let fraction = match kind {
            PaneKind::Main => Self::MAIN_FRACTION,
            PaneKind::Oscillator => Self::OSCILLATOR_FRACTION,
        };
        (self.viewport_height as f64 * fraction).round() as u32
    }
}

impl Default for PaneLayout {
    fn default() -> Self {
        Self::new(1200, 900)
    }
}

/// Inputs whose change forces destroy-and-recreate.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StructureKey {
    data_version: u64,
    chart_type: ChartType,
    show_volume: bool,
    overlays: Vec<IndicatorKind>,
    oscillators: Vec<IndicatorKind>,
    oscillator_pane: bool,
}

impl StructureKey {
    fn derive(inputs: &ChartInputs<'_>, indicators: &[IndicatorState]) -> Self {
        let oscillator_pane = indicators
            .iter()
            .any(|s| s.active && s.kind.is_oscillator() && !s.data.is_empty());
        Self {
            data_version: inputs.data_version,
            chart_type: inputs.options.chart_type,
            show_volume: inputs.options.show_volume,
            overlays: inputs.options.active_overlays().collect(),
            oscillators: inputs.options.active_oscillators().collect(),
            oscillator_pane,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// No candles; every pane is gone.
    Empty,
    /// Same structure; data replaced in place.
    Rebound,
    /// All panes destroyed and created again.
    Recreated,
}

pub struct ChartController {
    factory: Box<dyn SurfaceFactory>,
    layout: PaneLayout,
    main: Option<ChartHandle>,
    oscillator: Option<ChartHandle>,
    sync: Option<SyncLink>,
    legend: Option<Legend>,
    chart_type: ChartType,
    candles: Vec<Candle>,
    indicators: Vec<IndicatorState>,
    structure: Option<StructureKey>,
    ever_created: HashSet<PaneKind>,
}

impl ChartController {
    pub fn new(factory: Box<dyn SurfaceFactory>, layout: PaneLayout) -> Self {
        Self {
            factory,
            layout,
            main: None,
            oscillator: None,
            sync: None,
            legend: None,
            chart_type: ChartType::default(),
            candles: Vec::new(),
            indicators: Vec::new(),
            structure: None,
            ever_created: HashSet::new(),
        }
    }

    pub fn rebuild(&mut self, inputs: ChartInputs<'_>) -> RebuildOutcome {
        let options = inputs.options;
        let indicators = compute_states(inputs.candles, |k| options.is_active(k), &options.params);

        self.legend = Some(Legend::new(inputs.instrument, options.timeframe));
        self.chart_type = options.chart_type;
        self.candles = inputs.candles.to_vec();

        if inputs.candles.is_empty() {
            self.teardown();
            self.structure = None;
            self.indicators = indicators;
            tracing::debug!(version = inputs.data_version, "rebuild: no candles");
            return RebuildOutcome::Empty;
        }

        let key = StructureKey::derive(&inputs, &indicators);
        let outcome = if self.structure.as_ref() == Some(&key)
            && self.rebind_all(inputs.candles, options, &indicators)
        {
            RebuildOutcome::Rebound
        } else {
            self.teardown();
            let overlays: Vec<&IndicatorState> = active(&indicators, IndicatorKind::is_overlay);
            self.create_main_pane(inputs.candles, options.chart_type, &overlays, options.show_volume);
            if key.oscillator_pane {
                let oscillators = active(&indicators, IndicatorKind::is_oscillator);
                self.create_oscillator_pane(&oscillators);
            }
            RebuildOutcome::Recreated
        };

        tracing::debug!(
            version = inputs.data_version,
            ?outcome,
            oscillator = self.oscillator.is_some(),
            "rebuild"
        );
        self.structure = Some(key);
        self.indicators = indicators;
        outcome
    }

    /// Build the price pane: price series, overlay series, then volume.
    ///
    /// # Panics
    ///
    /// Panics if a main pane already exists; it must be destroyed first.
    pub fn create_main_pane(
        &mut self,
        candles: &[Candle],
        chart_type: ChartType,
        overlays: &[&IndicatorState],
        show_volume: bool,
    ) {
        assert!(self.main.is_none(), "main pane must be destroyed before it is recreated");

        let mut pane = ChartHandle::create(
            self.factory.as_ref(),
            PaneKind::Main,
            self.layout.container_width,
            self.layout.height(PaneKind::Main),
        );
        pane.bind(main_series(candles, chart_type, overlays, show_volume));
        self.main = Some(pane);
        self.ever_created.insert(PaneKind::Main);
        self.link_panes();
    }

    /// Build the oscillator pane. Returns `false`, creating nothing, when no
    /// oscillator produced a point.
    ///
    /// # Panics
    ///
    /// Panics if an oscillator pane already exists.
    pub fn create_oscillator_pane(&mut self, oscillators: &[&IndicatorState]) -> bool {
        assert!(
            self.oscillator.is_none(),
            "oscillator pane must be destroyed before it is recreated"
        );
        if oscillators.iter().all(|s| s.data.is_empty()) {
            return false;
        }

        let mut pane = ChartHandle::create(
            self.factory.as_ref(),
            PaneKind::Oscillator,
            self.layout.container_width,
            self.layout.height(PaneKind::Oscillator),
        );
        pane.bind(oscillator_pane_series(oscillators));
        self.oscillator = Some(pane);
        self.ever_created.insert(PaneKind::Oscillator);
        self.link_panes();
        true
    }

    pub fn resize(&mut self, container_width: u32, viewport_height: u32) {
        self.layout = PaneLayout::new(container_width, viewport_height);
        for pane in self.main.iter_mut().chain(self.oscillator.iter_mut()) {
            let height = self.layout.height(pane.kind());
            pane.resize(container_width, height);
        }
    }

    /// Destroy every pane. The next rebuild recreates from scratch.
    pub fn destroy(&mut self) {
        self.teardown();
        self.structure = None;
    }

    /// Legend for a crosshair at `time`, or the reset legend when `None` or
    /// off-data. `None` while no main pane exists.
    pub fn crosshair_move(&self, time: Option<i64>) -> Option<LegendText> {
        self.main.as_ref()?;
        let legend = self.legend.as_ref()?;
        let point = time
            .and_then(|t| self.candles.binary_search_by_key(&t, |c| c.time).ok())
            .map(|i| HoverPoint::from_candle(&self.candles[i], self.chart_type));
        Some(legend.on_hover_point_change(point.as_ref()))
    }

    /// Scroll the main pane; followers are updated before this returns.
    pub fn scroll_main(&self, range: VisibleRange) -> bool {
        match &self.main {
            Some(main) => {
                main.time_scale().set_visible_range(range);
                true
            }
            None => false,
        }
    }

    pub fn pane_state(&self, kind: PaneKind) -> PaneState {
        let pane = match kind {
            PaneKind::Main => self.main.as_ref(),
            PaneKind::Oscillator => self.oscillator.as_ref(),
        };
        match pane {
            Some(pane) => pane.state(),
            None if self.ever_created.contains(&kind) => PaneState::Destroyed,
            None => PaneState::Uninitialized,
        }
    }

    pub fn visible_range(&self, kind: PaneKind) -> Option<VisibleRange> {
        match kind {
            PaneKind::Main => self.main.as_ref()?.time_scale().visible_range(),
            PaneKind::Oscillator => self.oscillator.as_ref()?.time_scale().visible_range(),
        }
    }

    pub fn indicator_states(&self) -> &[IndicatorState] {
        &self.indicators
    }

    pub fn sync_attached(&self) -> bool {
        self.sync.as_ref().is_some_and(SyncLink::is_attached)
    }

    pub fn layout(&self) -> PaneLayout {
        self.layout
    }

    /// Encoded surfaces of the live panes, main first.
    pub fn encode_panes(&self) -> Vec<(PaneKind, String)> {
        self.main
            .iter()
            .chain(self.oscillator.iter())
            .map(|pane| (pane.kind(), pane.encode()))
            .collect()
    }

    fn link_panes(&mut self) {
        if self.sync.is_some() {
            return;
        }
        if let (Some(main), Some(oscillator)) = (&self.main, &self.oscillator) {
            self.sync = Some(attach(main.time_scale(), oscillator.time_scale()));
        }
    }

    fn rebind_all(
        &mut self,
        candles: &[Candle],
        options: &DisplayOptions,
        indicators: &[IndicatorState],
    ) -> bool {
        let Some(main) = self.main.as_mut() else {
            return false;
        };
        let overlays = active(indicators, IndicatorKind::is_overlay);
        if !main.rebind(main_series(candles, options.chart_type, &overlays, options.show_volume)) {
            return false;
        }
        match self.oscillator.as_mut() {
            Some(oscillator) => {
                let oscillators = active(indicators, IndicatorKind::is_oscillator);
                oscillator.rebind(oscillator_pane_series(&oscillators))
            }
            None => true,
        }
    }

    fn teardown(&mut self) {
        if let Some(link) = self.sync.take() {
            link.detach();
        }
        if let Some(oscillator) = self.oscillator.take() {
            oscillator.destroy();
        }
        if let Some(main) = self.main.take() {
            main.destroy();
        }
    }
}

impl Drop for ChartController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn active(indicators: &[IndicatorState], pane: fn(&IndicatorKind) -> bool) -> Vec<&IndicatorState> {
    indicators
        .iter()
        .filter(|s| s.active && pane(&s.kind))
        .collect()
}

fn main_series(
    candles: &[Candle],
    chart_type: ChartType,
    overlays: &[&IndicatorState],
    show_volume: bool,
) -> Vec<BoundSeries> {
    let mut series = vec![price_series(candles, chart_type)];
    for state in overlays {
        series.extend(overlay_series(state));
    }
    if show_volume {
        series.push(volume_series(candles));
    }
    series
}

fn oscillator_pane_series(oscillators: &[&IndicatorState]) -> Vec<BoundSeries> {
    oscillators.iter().flat_map(|s| oscillator_series(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::series::{SeriesData, SeriesId, SeriesSpec};
    use crate::domain::indicator::test_support::make_candles;
    use crate::ports::render_port::RenderSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        created: usize,
        released: usize,
        series: usize,
    }

    struct CountingSurface(Rc<RefCell<Counts>>);

    impl RenderSurface for CountingSurface {
        fn add_series(&mut self, _spec: SeriesSpec) -> SeriesId {
            let mut counts = self.0.borrow_mut();
            counts.series += 1;
            SeriesId(counts.series)
        }
        fn set_series_data(&mut self, _id: SeriesId, _data: SeriesData) {}
        fn set_series_spec(&mut self, _id: SeriesId, _spec: SeriesSpec) {}
        fn set_size(&mut self, _width: u32, _height: u32) {}
        fn encode(&self, _visible: Option<VisibleRange>) -> String {
            String::new()
        }
        fn release(&mut self) {
            self.0.borrow_mut().released += 1;
        }
    }

    struct CountingFactory(Rc<RefCell<Counts>>);

    impl SurfaceFactory for CountingFactory {
        fn create(&self, _kind: PaneKind, _width: u32, _height: u32) -> Box<dyn RenderSurface> {
            self.0.borrow_mut().created += 1;
            Box::new(CountingSurface(Rc::clone(&self.0)))
        }
    }

    fn controller() -> (ChartController, Rc<RefCell<Counts>>) {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let factory = CountingFactory(Rc::clone(&counts));
        (ChartController::new(Box::new(factory), PaneLayout::default()), counts)
    }

    fn instrument() -> Instrument {
        Instrument {
            id: 1,
            company_name: "Acme".into(),
            exchange_code: "NSE".into(),
        }
    }

    fn rising(n: usize) -> Vec<Candle> {
        make_candles(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
    }

    fn rebuild(
        ctl: &mut ChartController,
        candles: &[Candle],
        version: u64,
        options: &DisplayOptions,
    ) -> RebuildOutcome {
        let instrument = instrument();
        ctl.rebuild(ChartInputs {
            candles,
            data_version: version,
            instrument: &instrument,
            options,
        })
    }

    #[test]
    fn layout_fractions() {
        let layout = PaneLayout::new(1000, 1000);
        assert_eq!(layout.height(PaneKind::Main), 500);
        assert_eq!(layout.height(PaneKind::Oscillator), 200);
    }

    #[test]
    fn empty_candles_create_no_pane() {
        let (mut ctl, counts) = controller();
        let outcome = rebuild(&mut ctl, &[], 1, &DisplayOptions::default());
        assert_eq!(outcome, RebuildOutcome::Empty);
        assert_eq!(counts.borrow().created, 0);
        assert_eq!(ctl.pane_state(PaneKind::Main), PaneState::Uninitialized);
        assert!(ctl.crosshair_move(None).is_none());
    }

    #[test]
    fn main_only_without_oscillators() {
        let (mut ctl, counts) = controller();
        let candles = rising(30);
        rebuild(&mut ctl, &candles, 1, &DisplayOptions::default());

        assert_eq!(counts.borrow().created, 1);
        assert_eq!(ctl.pane_state(PaneKind::Main), PaneState::Bound { points: 30 });
        assert_eq!(ctl.pane_state(PaneKind::Oscillator), PaneState::Uninitialized);
        assert!(!ctl.sync_attached());
    }

    #[test]
    fn oscillator_pane_appears_and_syncs() {
        let (mut ctl, _) = controller();
        let candles = rising(40);
        let mut options = DisplayOptions::default();
        options.set_indicator(IndicatorKind::Rsi, true);
        rebuild(&mut ctl, &candles, 1, &options);

        assert!(matches!(ctl.pane_state(PaneKind::Oscillator), PaneState::Bound { .. }));
        assert!(ctl.sync_attached());

        let range = VisibleRange::new(candles[5].time, candles[20].time);
        assert!(ctl.scroll_main(range));
        assert_eq!(ctl.visible_range(PaneKind::Oscillator), Some(range));
    }

    #[test]
    fn oscillator_without_points_creates_no_pane() {
        let (mut ctl, counts) = controller();
        let mut options = DisplayOptions::default();
        options.set_indicator(IndicatorKind::Macd, true);
        rebuild(&mut ctl, &rising(10), 1, &options);

        assert_eq!(counts.borrow().created, 1);
        assert_eq!(ctl.pane_state(PaneKind::Oscillator), PaneState::Uninitialized);
    }

    #[test]
    fn parameter_change_rebinds_in_place() {
        let (mut ctl, counts) = controller();
        let candles = rising(60);
        let mut options = DisplayOptions::default();
        options.set_indicator(IndicatorKind::Ma, true);
        assert_eq!(rebuild(&mut ctl, &candles, 1, &options), RebuildOutcome::Recreated);

        options.params.ma_period = 10;
        assert_eq!(rebuild(&mut ctl, &candles, 1, &options), RebuildOutcome::Rebound);
        assert_eq!(counts.borrow().created, 1);
        assert_eq!(counts.borrow().released, 0);
        assert_eq!(ctl.indicator_states()[0].data.len(), 51);
    }

    #[test]
    fn structural_change_recreates() {
        let (mut ctl, counts) = controller();
        let candles = rising(60);
        let mut options = DisplayOptions::default();
        rebuild(&mut ctl, &candles, 1, &options);

        options.chart_type = ChartType::Line;
        assert_eq!(rebuild(&mut ctl, &candles, 1, &options), RebuildOutcome::Recreated);
        assert_eq!(counts.borrow().created, 2);
        assert_eq!(counts.borrow().released, 1);

        assert_eq!(rebuild(&mut ctl, &candles, 2, &options), RebuildOutcome::Recreated);
        assert_eq!(counts.borrow().released, 2);
    }

    #[test]
    fn toggling_oscillator_off_destroys_pane_and_link() {
        let (mut ctl, counts) = controller();
        let candles = rising(60);
        let mut options = DisplayOptions::default();
        options.set_indicator(IndicatorKind::Rsi, true);
        rebuild(&mut ctl, &candles, 1, &options);
        assert_eq!(counts.borrow().created, 2);

        options.set_indicator(IndicatorKind::Rsi, false);
        rebuild(&mut ctl, &candles, 1, &options);
        assert_eq!(ctl.pane_state(PaneKind::Oscillator), PaneState::Destroyed);
        assert!(!ctl.sync_attached());
        assert_eq!(counts.borrow().released, 2);
        assert_eq!(counts.borrow().created, 3);
    }

    #[test]
    fn crosshair_legend_for_hovered_candle() {
        let (mut ctl, _) = controller();
        let candles = rising(5);
        rebuild(&mut ctl, &candles, 1, &DisplayOptions::default());

        let text = ctl.crosshair_move(Some(candles[2].time)).unwrap();
        assert_eq!(text.header, "Acme | NSE | Timeframe: 60");
        assert_eq!(text.values, "OHLC: O: 102.00 | H: 102.00 | L: 102.00 | C: 102.00");

        let off = ctl.crosshair_move(Some(candles[2].time + 1)).unwrap();
        assert_eq!(off.values, "OHLC: ");
        assert_eq!(ctl.crosshair_move(None).unwrap().values, "OHLC: ");
    }

    #[test]
    fn destroy_releases_every_surface() {
        let (mut ctl, counts) = controller();
        let mut options = DisplayOptions::default();
        options.set_indicator(IndicatorKind::Macd, true);
        rebuild(&mut ctl, &rising(60), 1, &options);

        ctl.destroy();
        assert_eq!(counts.borrow().created, counts.borrow().released);
        assert_eq!(ctl.pane_state(PaneKind::Main), PaneState::Destroyed);
        assert!(!ctl.scroll_main(VisibleRange::new(0, 1)));
    }

    #[test]
    fn drop_releases_every_surface() {
        let (mut ctl, counts) = controller();
        let mut options = DisplayOptions::default();
        options.set_indicator(IndicatorKind::Rsi, true);
        rebuild(&mut ctl, &rising(60), 1, &options);
        drop(ctl);
        assert_eq!(counts.borrow().released, 2);
    }

    #[test]
    fn initial_viewport_fits_data() {
        let (mut ctl, _) = controller();
        let candles = rising(20);
        rebuild(&mut ctl, &candles, 1, &DisplayOptions::default());
        assert_eq!(
            ctl.visible_range(PaneKind::Main),
            Some(VisibleRange::new(candles[0].time, candles[19].time))
        );
    }

    #[test]
    #[should_panic(expected = "destroyed before it is recreated")]
    fn creating_main_twice_panics() {
        let (mut ctl, _) = controller();
        let candles = rising(5);
        rebuild(&mut ctl, &candles, 1, &DisplayOptions::default());
        ctl.create_main_pane(&candles, ChartType::Candlestick, &[], true);
    }
}

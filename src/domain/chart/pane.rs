//! Chart handles: one rendering surface, its time axis and attached series.

use std::fmt;

use crate::domain::chart::series::{BoundSeries, PaneKind, SeriesId, SeriesSpec};
use crate::domain::viewport::{TimeScale, VisibleRange};
use crate::ports::render_port::{RenderSurface, SurfaceFactory};

/// Lifecycle of a pane:
/// `Uninitialized → Created → Bound ⟲ (rebind) → Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneState {
    Uninitialized,
    Created,
    Bound { points: usize },
    Destroyed,
}

impl fmt::Display for PaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneState::Uninitialized => write!(f, "uninitialized"),
            PaneState::Created => write!(f, "created"),
            PaneState::Bound { points } => write!(f, "bound({} points)", points),
            PaneState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Exclusive owner of one surface. Destroying consumes the handle, so it
/// cannot be read afterwards.
pub struct ChartHandle {
    kind: PaneKind,
    surface: Box<dyn RenderSurface>,
    time_scale: TimeScale,
    series: Vec<(SeriesId, SeriesSpec)>,
    state: PaneState,
}

impl ChartHandle {
    pub fn create(factory: &dyn SurfaceFactory, kind: PaneKind, width: u32, height: u32) -> Self {
        tracing::debug!(?kind, width, height, "pane created");
        Self {
            kind,
            surface: factory.create(kind, width, height),
            time_scale: TimeScale::new(),
            series: Vec::new(),
            state: PaneState::Created,
        }
    }

    pub fn kind(&self) -> PaneKind {
        self.kind
    }

    pub fn state(&self) -> PaneState {
        self.state
    }

    pub fn time_scale(&self) -> &TimeScale {
        &self.time_scale
    }

    pub fn series_specs(&self) -> impl Iterator<Item = &SeriesSpec> {
        self.series.iter().map(|(_, spec)| spec)
    }

    /// Attach series and their data, then fit the time axis to the first
    /// series.
    ///
    /// # Panics
    ///
    /// Panics unless the pane is freshly created.
    pub fn bind(&mut self, series: Vec<BoundSeries>) {
        assert_eq!(
            self.state,
            PaneState::Created,
            "bind requires a freshly created pane"
        );

        let bounds = series.first().and_then(|(_, data)| data.time_bounds());
        let points = series.first().map_or(0, |(_, data)| data.len());

        for (spec, data) in series {
            let id = self.surface.add_series(spec.clone());
            self.surface.set_series_data(id, data);
            self.series.push((id, spec));
        }

        self.state = PaneState::Bound { points };
        if let Some((first, last)) = bounds {
            self.time_scale.set_visible_range(VisibleRange::new(first, last));
        }
        tracing::debug!(kind = ?self.kind, series = self.series.len(), points, "pane bound");
    }

    /// Replace the data of already attached series in place, pushing any
    /// changed label or style to the surface. Returns `false`
    /// without touching the surface when the series layout differs; the
    /// caller must then recreate the pane.
    pub fn rebind(&mut self, series: Vec<BoundSeries>) -> bool {
        if !matches!(self.state, PaneState::Bound { .. })
            || series.len() != self.series.len()
            || series
                .iter()
                .zip(&self.series)
                .any(|((spec, _), (_, bound))| spec.kind != bound.kind || spec.scale != bound.scale)
        {
            return false;
        }

        let points = series.first().map_or(0, |(_, data)| data.len());
        for ((spec, data), (id, bound)) in series.into_iter().zip(self.series.iter_mut()) {
            if spec != *bound {
                self.surface.set_series_spec(*id, spec.clone());
                *bound = spec;
            }
            self.surface.set_series_data(*id, data);
        }
        self.state = PaneState::Bound { points };
        tracing::debug!(kind = ?self.kind, points, "pane rebound");
        true
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.set_size(width, height);
    }

    pub fn encode(&self) -> String {
        self.surface.encode(self.time_scale.visible_range())
    }

    /// Release the surface and close the time axis. Any sync link on this
    /// pane must already be detached.
    pub fn destroy(mut self) {
        self.time_scale.close();
        self.surface.release();
        self.state = PaneState::Destroyed;
        tracing::debug!(kind = ?self.kind, "pane destroyed");
    }
}

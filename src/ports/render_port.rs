//! Rendering surface port.
//!
//! A surface is one drawable pane. It is created by a [`SurfaceFactory`],
//! owned by exactly one chart handle, and released before that handle is
//! dropped.

use crate::domain::chart::series::{PaneKind, SeriesData, SeriesId, SeriesSpec};
use crate::domain::viewport::VisibleRange;

pub trait RenderSurface {
    fn add_series(&mut self, spec: SeriesSpec) -> SeriesId;

    /// Replace the data of a series wholesale.
    fn set_series_data(&mut self, id: SeriesId, data: SeriesData);

    /// Replace the label, colours and width of an attached series.
    fn set_series_spec(&mut self, id: SeriesId, spec: SeriesSpec);

    fn set_size(&mut self, width: u32, height: u32);

    /// Serialize the surface restricted to `visible`, or everything when `None`.
    fn encode(&self, visible: Option<VisibleRange>) -> String;

    fn release(&mut self);
}

pub trait SurfaceFactory {
    fn create(&self, kind: PaneKind, width: u32, height: u32) -> Box<dyn RenderSurface>;
}

//! Chart panes, their series and the controller that owns them.

pub mod controller;
pub mod legend;
pub mod pane;
pub mod series;

pub use controller::{ChartController, ChartInputs, PaneLayout, RebuildOutcome};
pub use legend::{HoverPoint, Legend, LegendText};
pub use pane::{ChartHandle, PaneState};
pub use series::PaneKind;

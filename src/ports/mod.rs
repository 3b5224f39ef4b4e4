//! Port traits at the seams of the domain.

pub mod candle_source_port;
pub mod config_port;
pub mod export_port;
pub mod render_port;

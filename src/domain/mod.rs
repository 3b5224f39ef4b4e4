//! Core domain types and logic.

pub mod candle;
pub mod chart;
pub mod config_validation;
pub mod controls;
pub mod error;
pub mod export;
pub mod indicator;
pub mod normalizer;
pub mod session;
pub mod viewport;

//! Visualization binder
//!
//! Holds the chart configuration for a session and maps query results
//! onto it.
//!
//! # Design Principles
//!
//! - Auto-suggestion fills a binding once; the user owns it afterwards
//! - Setters overwrite without cross-validation
//! - Resolution never fails: missing columns are reported

mod binder;
mod chart;
mod config;

pub use binder::VisualizationBinder;
pub use chart::{resolve, ChartSpec, Series, SeriesPoint, StackMode};
pub use config::{ValueFormat, VizConfig, VizType};

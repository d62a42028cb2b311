//! Chart data resolution
//!
//! Maps a result onto the configured bindings. Bindings naming columns the
//! result does not have are reported in `unresolved` and otherwise ignored.

use serde::Serialize;
use serde_json::Value;

use super::config::{ValueFormat, VizConfig, VizType};
use crate::request::VisualizerQueryResult;

/// How series share the value axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMode {
    #[default]
    None,
    /// Values add up along the axis
    Stacked,
    /// Stacked and scaled so each x sums to 100%
    Normalized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: Value,
    /// `None` for null or non-numeric cells
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

/// Everything a renderer needs for one result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub viz_type: VizType,
    pub x_field: Option<String>,
    pub y_fields: Vec<String>,
    pub series_field: Option<String>,
    pub value_format: ValueFormat,
    pub stack: StackMode,
    pub series: Vec<Series>,
    /// Result columns, in order; what a table renders
    pub columns: Vec<String>,
    /// Configured bindings missing from the result
    pub unresolved: Vec<String>,
}

pub fn resolve(config: &VizConfig, result: &VisualizerQueryResult) -> ChartSpec {
    let mut unresolved = Vec::new();
    let mut bind = |field: &String| {
        if result.has_column(field) {
            true
        } else {
            if !unresolved.contains(field) {
                unresolved.push(field.clone());
            }
            false
        }
    };

    let x_field = config.x_field.clone().filter(|f| bind(f));
    let y_fields: Vec<String> = config
        .y_fields()
        .iter()
        .filter(|f| bind(f))
        .cloned()
        .collect();
    let series_field = config.series_field.clone().filter(|f| bind(f));

    let mut spec = ChartSpec {
        viz_type: config.viz_type,
        x_field,
        y_fields,
        series_field,
        value_format: config.value_format(),
        stack: StackMode::None,
        series: Vec::new(),
        columns: result.columns.clone(),
        unresolved,
    };

    if !spec.viz_type.is_chart() {
        return spec;
    }

    spec.series = match (&spec.series_field, spec.y_fields.as_slice()) {
        (Some(series_field), [y_field]) => {
            pivot_series(result, spec.x_field.as_deref(), y_field, series_field)
        }
        _ => spec
            .y_fields
            .iter()
            .map(|y_field| Series {
                name: y_field.clone(),
                points: result
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(idx, row)| point(idx, row, spec.x_field.as_deref(), y_field))
                    .collect(),
            })
            .collect(),
    };
    spec.stack = stack_mode(spec.viz_type, spec.series.len(), spec.value_format);
    spec
}

/// One series per distinct `series_field` value, in first-seen order
fn pivot_series(
    result: &VisualizerQueryResult,
    x_field: Option<&str>,
    y_field: &str,
    series_field: &str,
) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();
    for (idx, row) in result.rows.iter().enumerate() {
        let name = label(row.get(series_field).unwrap_or(&Value::Null));
        let point = point(idx, row, x_field, y_field);
        match series.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.points.push(point),
            None => series.push(Series {
                name,
                points: vec![point],
            }),
        }
    }
    series
}

fn point(
    idx: usize,
    row: &serde_json::Map<String, Value>,
    x_field: Option<&str>,
    y_field: &str,
) -> SeriesPoint {
    let x = match x_field {
        Some(field) => row.get(field).cloned().unwrap_or(Value::Null),
        None => Value::from(idx),
    };
    SeriesPoint {
        x,
        y: row.get(y_field).and_then(numeric),
    }
}

/// Numbers as-is, numeric strings parsed; aggregates of bigint columns
/// often arrive as strings
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn stack_mode(viz_type: VizType, series_count: usize, format: ValueFormat) -> StackMode {
    let stacked = match viz_type {
        VizType::StackedBar => true,
        VizType::Area => series_count > 1,
        _ => false,
    };
    match (stacked, format) {
        (false, _) => StackMode::None,
        (true, ValueFormat::Percent) => StackMode::Normalized,
        (true, ValueFormat::Number) => StackMode::Stacked,
    }
}

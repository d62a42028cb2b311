//! Visualization configuration

use serde::{Deserialize, Serialize};

/// Chart kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizType {
    #[default]
    Table,
    Bar,
    StackedBar,
    Line,
    Area,
    Donut,
}

impl VizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VizType::Table => "table",
            VizType::Bar => "bar",
            VizType::StackedBar => "stacked_bar",
            VizType::Line => "line",
            VizType::Area => "area",
            VizType::Donut => "donut",
        }
    }

    pub fn is_chart(&self) -> bool {
        !matches!(self, VizType::Table)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    #[default]
    Number,
    Percent,
}

/// Axis and series bindings of a visualization
///
/// Fields are column names of the result: group-by keys or aggregation
/// aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VizConfig {
    #[serde(rename = "type")]
    pub viz_type: VizType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<ValueFormat>,
}

impl VizConfig {
    /// `y_fields`, or an empty slice when unset
    pub fn y_fields(&self) -> &[String] {
        self.y_fields.as_deref().unwrap_or(&[])
    }

    pub fn value_format(&self) -> ValueFormat {
        self.value_format.unwrap_or_default()
    }
}

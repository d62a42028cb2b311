//! Query endpoint wire types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregation::AggregationDefinition;
use crate::filter::FilterGroup;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One ordering term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Group-by key or aggregation alias
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Body of `POST /query`
///
/// Always derived from the editable models, never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerQueryRequest {
    pub filters: FilterGroup,
    pub group_by: Vec<String>,
    pub aggregations: Vec<AggregationDefinition>,
    pub sort: Vec<SortSpec>,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_join_hint: Option<bool>,
}

impl VisualizerQueryRequest {
    /// Stable JSON encoding, used to key cached and in-flight executions
    ///
    /// Node and aggregation ids are editor identity, not query content, and
    /// are left out: a rule deleted and re-added with the same contents
    /// keys the same. Objects encode key-sorted.
    pub fn cache_key(&self) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(filters) = value.get_mut("filters") {
            strip_node_ids(filters);
        }
        if let Some(Value::Array(aggregations)) = value.get_mut("aggregations") {
            for aggregation in aggregations {
                if let Value::Object(fields) = aggregation {
                    fields.remove("id");
                }
            }
        }
        serde_json::to_string(&value)
    }

    /// Whether the coordinator may send this request
    ///
    /// An unconstrained scan is never executed: at least one rule must
    /// survive serialization.
    pub fn is_executable(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// Drops `id` from a group and every node below it; rule values are untouched
fn strip_node_ids(node: &mut Value) {
    let Value::Object(fields) = node else {
        return;
    };
    fields.remove("id");
    if let Some(Value::Array(children)) = fields.get_mut("rules") {
        children.iter_mut().for_each(strip_node_ids);
    }
}

/// Body returned by `POST /query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerQueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub row_count: u64,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub execution_ms: f64,
}

impl VisualizerQueryResult {
    /// Result with the given columns and no rows
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
            execution_ms: 0.0,
        }
    }

    /// Builds a result from positional rows; missing cells become null
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let rows: Vec<Map<String, Value>> = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .cloned()
                    .zip(row.into_iter().chain(std::iter::repeat(Value::Null)))
                    .collect()
            })
            .collect();
        Self {
            row_count: rows.len() as u64,
            columns,
            rows,
            truncated: false,
            execution_ms: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

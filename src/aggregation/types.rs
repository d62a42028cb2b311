//! Aggregation function and definition types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ModelId;

/// Field placeholder meaning "all rows"; only valid with `count`
pub const ALL_ROWS: &str = "*";

/// Aggregation function applied per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationFn {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationFn {
    pub const ALL: [AggregationFn; 6] = [
        AggregationFn::Count,
        AggregationFn::CountDistinct,
        AggregationFn::Sum,
        AggregationFn::Avg,
        AggregationFn::Min,
        AggregationFn::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationFn::Count => "count",
            AggregationFn::CountDistinct => "count_distinct",
            AggregationFn::Sum => "sum",
            AggregationFn::Avg => "avg",
            AggregationFn::Min => "min",
            AggregationFn::Max => "max",
        }
    }

    /// Whether the function needs a numeric field; `min`/`max` also work
    /// on timestamps and text
    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggregationFn::Sum | AggregationFn::Avg)
    }

    /// Whether `*` is an accepted field for this function
    pub fn accepts_all_rows(&self) -> bool {
        matches!(self, AggregationFn::Count)
    }
}

impl fmt::Display for AggregationFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aggregated output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationDefinition {
    pub id: ModelId,
    #[serde(rename = "fn")]
    pub agg_fn: AggregationFn,
    /// Field key, or `*` for count of rows
    pub field: String,
    /// Output column name in the result
    pub alias: String,
}

impl AggregationDefinition {
    pub fn new(agg_fn: AggregationFn, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            id: ModelId::generate(),
            alias: default_alias(agg_fn, &field),
            agg_fn,
            field,
        }
    }

    /// Whether this definition aggregates `field` with `agg_fn`
    pub fn matches(&self, agg_fn: AggregationFn, field: &str) -> bool {
        self.agg_fn == agg_fn && self.field == field
    }
}

/// `{fn}_{field}` with dots replaced by underscores
pub fn default_alias(agg_fn: AggregationFn, field: &str) -> String {
    format!("{}_{}", agg_fn.as_str(), field).replace('.', "_")
}

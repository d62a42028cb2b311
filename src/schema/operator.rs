//! Filter operators and the value shapes they accept
//!
//! - `is_null`/`is_not_null` take no value
//! - `between` takes a 2-tuple
//! - `in`/`not_in` take a list
//! - `date_preset` takes one of [`DatePreset`]; the query service resolves
//!   the preset to a concrete range
//! - everything else takes a single scalar

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::FieldType;

/// Comparison operator of a filter rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
    DatePreset,
}

/// Shape of the value an operator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// No value (null checks)
    None,
    /// One scalar
    Single,
    /// Lower and upper bound
    Pair,
    /// Any number of scalars
    List,
    /// One of the fixed date presets
    Preset,
}

impl Operator {
    /// Every operator, in display order
    pub const ALL: [Operator; 16] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Between,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::DatePreset,
    ];

    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::DatePreset => "date_preset",
        }
    }

    pub fn value_shape(&self) -> ValueShape {
        match self {
            Operator::IsNull | Operator::IsNotNull => ValueShape::None,
            Operator::Between => ValueShape::Pair,
            Operator::In | Operator::NotIn => ValueShape::List,
            Operator::DatePreset => ValueShape::Preset,
            _ => ValueShape::Single,
        }
    }

    /// The cleared value for this operator's shape
    pub fn empty_value(&self) -> Value {
        match self.value_shape() {
            ValueShape::None => Value::Null,
            ValueShape::Single => json!(""),
            ValueShape::Pair => json!(["", ""]),
            ValueShape::List => json!([]),
            ValueShape::Preset => json!(DatePreset::Today.as_str()),
        }
    }

    /// Whether `value` fits this operator's shape
    ///
    /// Used for editor hints; a mismatched value is still serialized and
    /// left to the query service to reject.
    pub fn accepts_value(&self, value: &Value) -> bool {
        match self.value_shape() {
            ValueShape::None => value.is_null(),
            ValueShape::Single => !value.is_array() && !value.is_object(),
            ValueShape::Pair => value.as_array().map_or(false, |v| v.len() == 2),
            ValueShape::List => value.is_array(),
            ValueShape::Preset => value
                .as_str()
                .map_or(false, |s| DatePreset::parse(s).is_some()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative date ranges resolved server-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    ThisYear,
}

impl DatePreset {
    pub const ALL: [DatePreset; 6] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::Last7Days,
        DatePreset::Last30Days,
        DatePreset::ThisMonth,
        DatePreset::ThisYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::Last7Days => "last_7_days",
            DatePreset::Last30Days => "last_30_days",
            DatePreset::ThisMonth => "this_month",
            DatePreset::ThisYear => "this_year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s)
    }
}

/// One entry of an operator picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorChoice {
    pub operator: Operator,
    pub enabled: bool,
}

/// Built-in operator sets, used when a catalog omits a field type
pub fn standard_operators(field_type: FieldType) -> &'static [Operator] {
    use Operator::*;
    match field_type {
        FieldType::Text => &[
            Eq,
            Ne,
            Contains,
            NotContains,
            StartsWith,
            EndsWith,
            In,
            NotIn,
            IsNull,
            IsNotNull,
        ],
        FieldType::Numeric => &[Eq, Ne, Gt, Gte, Lt, Lte, Between, In, NotIn, IsNull, IsNotNull],
        FieldType::Boolean => &[Eq],
        FieldType::Timestamp => &[
            Gt,
            Gte,
            Lt,
            Lte,
            Between,
            Operator::DatePreset,
            IsNull,
            IsNotNull,
        ],
        FieldType::Enum => &[Eq, In, NotIn],
        FieldType::Jsonb => &[Contains, IsNull, IsNotNull],
    }
}

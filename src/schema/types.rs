//! Schema catalog type definitions
//!
//! The catalog is served by the schema endpoint as:
//!
//! ```json
//! { "fields": [...], "datePresets": [...],
//!   "allowedOperators": { "text": [...], ... }, "aggregationFns": [...] }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::operator::{standard_operators, Operator, OperatorChoice};
use crate::aggregation::AggregationFn;

/// Data type of a queryable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Numeric,
    Boolean,
    Timestamp,
    Enum,
    Jsonb,
}

impl FieldType {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Numeric => "numeric",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Enum => "enum",
            FieldType::Jsonb => "jsonb",
        }
    }
}

/// Dataset a field originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Call,
    Caller,
    Campaign,
    Organization,
    #[serde(other)]
    Other,
}

/// A queryable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Unique key, referenced by rules, group-by and aggregations
    pub key: String,
    pub label: String,
    pub source: FieldSource,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub groupable: bool,
    pub aggregatable: bool,
    pub filterable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            source: FieldSource::Call,
            field_type,
            groupable: true,
            aggregatable: matches!(field_type, FieldType::Numeric),
            filterable: true,
            enum_values: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_source(mut self, source: FieldSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_flags(mut self, groupable: bool, aggregatable: bool, filterable: bool) -> Self {
        self.groupable = groupable;
        self.aggregatable = aggregatable;
        self.filterable = filterable;
        self
    }

    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// The full catalog, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerSchema {
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub date_presets: Vec<String>,
    #[serde(default)]
    pub allowed_operators: BTreeMap<FieldType, Vec<Operator>>,
    #[serde(default)]
    pub aggregation_fns: Vec<AggregationFn>,
}

impl VisualizerSchema {
    /// Creates a catalog with the standard operator map and every
    /// aggregation function
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        let allowed_operators = [
            FieldType::Text,
            FieldType::Numeric,
            FieldType::Boolean,
            FieldType::Timestamp,
            FieldType::Enum,
            FieldType::Jsonb,
        ]
        .into_iter()
        .map(|t| (t, standard_operators(t).to_vec()))
        .collect();

        Self {
            fields,
            date_presets: super::operator::DatePreset::ALL
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            allowed_operators,
            aggregation_fns: AggregationFn::ALL.to_vec(),
        }
    }

    /// Checks the catalog itself: field keys must be unique and non-empty
    pub fn validate_structure(&self) -> SchemaResult<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.key.is_empty() {
                return Err(SchemaError::Malformed("field with empty key".into()));
            }
            if field.key == "*" {
                return Err(SchemaError::Malformed("'*' is reserved for count".into()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateField(field.key.clone()));
            }
        }
        Ok(())
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn filterable_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.filterable)
    }

    pub fn groupable_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.groupable)
    }

    pub fn aggregatable_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.aggregatable)
    }

    /// Legal operators for a field type
    ///
    /// Falls back to the built-in set when the catalog has no entry for
    /// the type.
    pub fn allowed_operators(&self, field_type: FieldType) -> &[Operator] {
        match self.allowed_operators.get(&field_type) {
            Some(ops) => ops,
            None => standard_operators(field_type),
        }
    }

    /// Field types in use that the catalog gives no operator list for
    pub fn missing_operator_types(&self) -> BTreeSet<FieldType> {
        self.fields
            .iter()
            .map(|f| f.field_type)
            .filter(|t| !self.allowed_operators.contains_key(t))
            .collect()
    }

    /// Operator picker entries for a rule's selected field
    ///
    /// With no field selected every operator is listed but disabled. An
    /// unknown field yields an empty list.
    pub fn operators_for_field(&self, field_key: &str) -> Vec<OperatorChoice> {
        if field_key.is_empty() {
            return Operator::ALL
                .iter()
                .map(|&operator| OperatorChoice {
                    operator,
                    enabled: false,
                })
                .collect();
        }

        match self.field(field_key) {
            Some(field) => self
                .allowed_operators(field.field_type)
                .iter()
                .map(|&operator| OperatorChoice {
                    operator,
                    enabled: true,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// First legal operator for the type, `eq` if the set is empty
    pub fn default_operator(&self, field_type: FieldType) -> Operator {
        self.allowed_operators(field_type)
            .first()
            .copied()
            .unwrap_or_default()
    }

    /// Whether an aggregation function may be offered
    ///
    /// An empty `aggregationFns` list means the catalog does not restrict
    /// functions.
    pub fn supports_aggregation(&self, agg_fn: AggregationFn) -> bool {
        self.aggregation_fns.is_empty() || self.aggregation_fns.contains(&agg_fn)
    }
}

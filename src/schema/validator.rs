//! Rule validation against the catalog
//!
//! Validation never fails: it classifies. Incomplete and malformed rules
//! stay editable in the tree and are left out of serialized requests.

use super::types::VisualizerSchema;
use crate::filter::FilterRule;

/// Classification of a filter rule against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleStatus {
    /// Field selected, known, operator legal for its type
    Complete,
    /// No field selected yet
    Incomplete,
    /// Field or operator no longer matches the catalog
    Malformed(MalformedReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Field key is not in the catalog
    UnknownField(String),
    /// Field exists but may not be filtered on
    NotFilterable(String),
    /// Operator is not allowed for the field's type
    OperatorNotAllowed { field: String, operator: String },
}

impl RuleStatus {
    /// Whether the rule belongs in a serialized request
    pub fn is_sendable(&self) -> bool {
        matches!(self, RuleStatus::Complete)
    }
}

/// Validates filter rules against one catalog
pub struct RuleValidator<'a> {
    schema: &'a VisualizerSchema,
}

impl<'a> RuleValidator<'a> {
    pub fn new(schema: &'a VisualizerSchema) -> Self {
        Self { schema }
    }

    pub fn validate(&self, rule: &FilterRule) -> RuleStatus {
        if rule.is_incomplete() {
            return RuleStatus::Incomplete;
        }

        let Some(field) = self.schema.field(&rule.field) else {
            return RuleStatus::Malformed(MalformedReason::UnknownField(rule.field.clone()));
        };

        if !field.filterable {
            return RuleStatus::Malformed(MalformedReason::NotFilterable(rule.field.clone()));
        }

        if !self
            .schema
            .allowed_operators(field.field_type)
            .contains(&rule.operator)
        {
            return RuleStatus::Malformed(MalformedReason::OperatorNotAllowed {
                field: rule.field.clone(),
                operator: rule.operator.as_str().to_string(),
            });
        }

        RuleStatus::Complete
    }

    /// Whether a value fits the rule's operator, for editor hints
    pub fn value_matches_shape(&self, rule: &FilterRule) -> bool {
        rule.operator.accepts_value(&rule.value)
    }
}

//! Filter tree node types
//!
//! The tree is a single root [`FilterGroup`]. Children are held behind
//! `Arc` so a rewritten tree can share every untouched subtree with the
//! tree it was derived from. Nodes are never mutated once built.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::id::ModelId;
use crate::schema::Operator;

/// Boolean combinator of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn toggled(self) -> Self {
        match self {
            Logic::And => Logic::Or,
            Logic::Or => Logic::And,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

// Single-variant markers: they pin the `kind` discriminator on the wire and
// make untagged decoding of `FilterNode` unambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RuleKind {
    #[default]
    Rule,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum GroupKind {
    #[default]
    Group,
}

/// Leaf condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: ModelId,
    kind: RuleKind,
    /// Field key, empty while the rule is still being built
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl FilterRule {
    /// A new rule with no field selected
    pub fn empty() -> Self {
        Self {
            id: ModelId::generate(),
            kind: RuleKind::Rule,
            field: String::new(),
            operator: Operator::Eq,
            value: json!(""),
        }
    }

    /// A complete rule
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            ..Self::empty()
        }
    }

    /// Rule without a field; kept in the editable tree, never serialized
    pub fn is_incomplete(&self) -> bool {
        self.field.is_empty()
    }

    /// Copy with `patch` merged in; `id` is preserved
    pub fn patched(&self, patch: &RulePatch) -> Self {
        Self {
            id: self.id.clone(),
            kind: RuleKind::Rule,
            field: patch.field.clone().unwrap_or_else(|| self.field.clone()),
            operator: patch.operator.unwrap_or(self.operator),
            value: patch.value.clone().unwrap_or_else(|| self.value.clone()),
        }
    }
}

/// Partial update of a rule's editable parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub field: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<Value>,
}

impl RulePatch {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    pub fn operator(operator: Operator) -> Self {
        Self {
            operator: Some(operator),
            ..Self::default()
        }
    }

    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.operator.is_none() && self.value.is_none()
    }
}

/// Interior node combining its children with AND or OR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub id: ModelId,
    kind: GroupKind,
    pub logic: Logic,
    pub rules: Vec<Arc<FilterNode>>,
}

impl FilterGroup {
    /// A new `AND` group with no children
    pub fn empty() -> Self {
        Self::with_logic(Logic::And)
    }

    pub fn with_logic(logic: Logic) -> Self {
        Self {
            id: ModelId::generate(),
            kind: GroupKind::Group,
            logic,
            rules: Vec::new(),
        }
    }

    /// Builder-style child append, for constructing fixtures and requests
    pub fn with_child(mut self, node: FilterNode) -> Self {
        self.rules.push(Arc::new(node));
        self
    }

    /// Copy of this group with different children; `id` and `logic` kept
    pub(crate) fn with_rules(&self, rules: Vec<Arc<FilterNode>>) -> Self {
        Self {
            id: self.id.clone(),
            kind: GroupKind::Group,
            logic: self.logic,
            rules,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Either a rule or a nested group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Rule(FilterRule),
    Group(FilterGroup),
}

impl FilterNode {
    pub fn id(&self) -> &ModelId {
        match self {
            FilterNode::Rule(rule) => &rule.id,
            FilterNode::Group(group) => &group.id,
        }
    }

    pub fn as_rule(&self) -> Option<&FilterRule> {
        match self {
            FilterNode::Rule(rule) => Some(rule),
            FilterNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&FilterGroup> {
        match self {
            FilterNode::Group(group) => Some(group),
            FilterNode::Rule(_) => None,
        }
    }
}

impl From<FilterRule> for FilterNode {
    fn from(rule: FilterRule) -> Self {
        FilterNode::Rule(rule)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

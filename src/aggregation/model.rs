//! Group-by set and aggregation list
//!
//! Both collections keep insertion order. Mutators report whether they
//! changed anything so the owner knows when to resubmit.

use std::collections::HashMap;

use super::types::{AggregationDefinition, AggregationFn};
use crate::id::ModelId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationModel {
    group_by: Vec<String>,
    aggregations: Vec<AggregationDefinition>,
}

impl AggregationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn aggregations(&self) -> &[AggregationDefinition] {
        &self.aggregations
    }

    /// Appends `field` unless already grouped on
    pub fn add_group_by(&mut self, field: &str) -> bool {
        if self.group_by.iter().any(|f| f == field) {
            return false;
        }
        self.group_by.push(field.to_string());
        true
    }

    pub fn remove_group_by(&mut self, field: &str) -> bool {
        let before = self.group_by.len();
        self.group_by.retain(|f| f != field);
        self.group_by.len() != before
    }

    /// Appends a definition with the default alias
    ///
    /// Returns the new id, or `None` when `(fn, field)` already exists.
    pub fn add_aggregation(&mut self, agg_fn: AggregationFn, field: &str) -> Option<ModelId> {
        if self.aggregations.iter().any(|a| a.matches(agg_fn, field)) {
            return None;
        }
        let def = AggregationDefinition::new(agg_fn, field);
        let id = def.id.clone();
        self.aggregations.push(def);
        Some(id)
    }

    pub fn remove_aggregation(&mut self, id: &ModelId) -> bool {
        let before = self.aggregations.len();
        self.aggregations.retain(|a| &a.id != id);
        self.aggregations.len() != before
    }

    /// Renames an aggregation's output column
    ///
    /// Collisions with other aliases are allowed; see
    /// [`alias_collisions`](Self::alias_collisions).
    pub fn set_alias(&mut self, id: &ModelId, alias: &str) -> bool {
        match self.aggregations.iter_mut().find(|a| &a.id == id) {
            Some(def) if def.alias != alias => {
                def.alias = alias.to_string();
                true
            }
            _ => false,
        }
    }

    /// Aliases used by more than one definition, in first-use order
    pub fn alias_collisions(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for def in &self.aggregations {
            *counts.entry(def.alias.as_str()).or_default() += 1;
        }

        let mut collisions: Vec<String> = Vec::new();
        for def in &self.aggregations {
            if counts[def.alias.as_str()] > 1 && !collisions.contains(&def.alias) {
                collisions.push(def.alias.clone());
            }
        }
        collisions
    }

    pub fn is_empty(&self) -> bool {
        self.group_by.is_empty() && self.aggregations.is_empty()
    }

    pub fn reset(&mut self) -> bool {
        let changed = !self.is_empty();
        self.group_by.clear();
        self.aggregations.clear();
        changed
    }
}

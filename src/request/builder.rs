//! Request assembly
//!
//! `build_request` is the structural assembly: it drops incomplete rules
//! and nothing else. `RequestBuilder` layers the session policies on top.

use crate::aggregation::{AggregationDefinition, AggregationModel};
use crate::filter::{prune_incomplete, FilterGroup};
use crate::schema::{RuleValidator, VisualizerSchema};

use super::types::{SortSpec, VisualizerQueryRequest};

pub const DEFAULT_LIMIT: u32 = 1000;
pub const DEFAULT_MAX_LIMIT: u32 = 10_000;

/// Assembles a request from the editable models
///
/// Incomplete rules, and sub-groups left empty without them, are omitted.
pub fn build_request(
    filter_root: &FilterGroup,
    group_by: &[String],
    aggregations: &[AggregationDefinition],
    sort: &[SortSpec],
    limit: u32,
) -> VisualizerQueryRequest {
    VisualizerQueryRequest {
        filters: prune_incomplete(filter_root, &|_| true),
        group_by: group_by.to_vec(),
        aggregations: aggregations.to_vec(),
        sort: sort.to_vec(),
        limit,
        include_join_hint: None,
    }
}

/// Request assembly with catalog pruning, limit clamping and the join hint
#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    filters: &'a FilterGroup,
    model: &'a AggregationModel,
    schema: Option<&'a VisualizerSchema>,
    sort: Vec<SortSpec>,
    limit: u32,
    max_limit: u32,
    include_join_hint: bool,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(filters: &'a FilterGroup, model: &'a AggregationModel) -> Self {
        Self {
            filters,
            model,
            schema: None,
            sort: Vec::new(),
            limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            include_join_hint: false,
        }
    }

    /// Also drops rules the catalog classifies as malformed
    pub fn schema(mut self, schema: &'a VisualizerSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn sort(mut self, sort: &[SortSpec]) -> Self {
        self.sort = sort.to_vec();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn include_join_hint(mut self, include: bool) -> Self {
        self.include_join_hint = include;
        self
    }

    pub fn build(&self) -> VisualizerQueryRequest {
        let mut request = build_request(
            self.filters,
            self.model.group_by(),
            self.model.aggregations(),
            &self.sort,
            self.limit.clamp(1, self.max_limit),
        );

        if let Some(schema) = self.schema {
            let validator = RuleValidator::new(schema);
            request.filters = prune_incomplete(self.filters, &|rule| {
                validator.validate(rule).is_sendable()
            });
        }

        if self.include_join_hint {
            request.include_join_hint = Some(true);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{AggregationFn, ALL_ROWS};
    use crate::filter::{add_rule, FilterRule, Logic};
    use crate::schema::{FieldDefinition, FieldType, Operator};
    use serde_json::json;

    fn schema() -> VisualizerSchema {
        VisualizerSchema::new(vec![
            FieldDefinition::new("status", FieldType::Enum),
            FieldDefinition::new("duration", FieldType::Numeric),
        ])
    }

    #[test]
    fn test_incomplete_rules_are_excluded() {
        let root = FilterGroup::empty()
            .with_child(FilterRule::new("status", Operator::Eq, json!("missed")).into());
        let root = add_rule(&root, &root.id);
        assert_eq!(root.rules.len(), 2);

        let request = build_request(&root, &[], &[], &[], 100);
        assert_eq!(request.filters.rules.len(), 1);
        assert_eq!(request.filters.id, root.id);
    }

    #[test]
    fn test_rule_with_empty_value_is_kept() {
        let root = FilterGroup::empty()
            .with_child(FilterRule::new("status", Operator::Eq, json!("")).into());
        let request = build_request(&root, &[], &[], &[], 100);
        assert_eq!(request.filters.rules.len(), 1);
        assert!(request.is_executable());
    }

    #[test]
    fn test_empty_root_is_not_executable() {
        let root = FilterGroup::empty();
        let mut model = AggregationModel::new();
        model.add_group_by("status");
        model.add_aggregation(AggregationFn::Count, ALL_ROWS);

        let request = RequestBuilder::new(&root, &model).build();
        assert!(!request.is_executable());

        let only_incomplete = add_rule(&root, &root.id);
        let request = RequestBuilder::new(&only_incomplete, &model).build();
        assert!(!request.is_executable());
    }

    #[test]
    fn test_schema_prunes_malformed_rules() {
        let schema = schema();
        let root = FilterGroup::with_logic(Logic::Or)
            .with_child(FilterRule::new("status", Operator::Eq, json!("missed")).into())
            .with_child(FilterRule::new("region", Operator::Eq, json!("EU")).into())
            .with_child(FilterRule::new("duration", Operator::Contains, json!("3")).into());
        let model = AggregationModel::new();

        let unpruned = RequestBuilder::new(&root, &model).build();
        assert_eq!(unpruned.filters.rules.len(), 3);

        let pruned = RequestBuilder::new(&root, &model).schema(&schema).build();
        assert_eq!(pruned.filters.rules.len(), 1);
        assert_eq!(pruned.filters.logic, Logic::Or);
    }

    #[test]
    fn test_limit_is_clamped() {
        let root = FilterGroup::empty();
        let model = AggregationModel::new();

        let request = RequestBuilder::new(&root, &model)
            .max_limit(500)
            .limit(5000)
            .build();
        assert_eq!(request.limit, 500);

        let request = RequestBuilder::new(&root, &model).limit(0).build();
        assert_eq!(request.limit, 1);
    }

    #[test]
    fn test_wire_format() {
        let root = FilterGroup::empty()
            .with_child(FilterRule::new("status", Operator::In, json!(["missed"])).into());
        let mut model = AggregationModel::new();
        model.add_group_by("status");
        model.add_aggregation(AggregationFn::Count, ALL_ROWS);

        let request = RequestBuilder::new(&root, &model)
            .sort(&[SortSpec::desc("count_*")])
            .include_join_hint(true)
            .build();
        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(encoded["groupBy"], json!(["status"]));
        assert_eq!(encoded["aggregations"][0]["alias"], json!("count_*"));
        assert_eq!(encoded["sort"][0]["direction"], json!("desc"));
        assert_eq!(encoded["limit"], json!(1000));
        assert_eq!(encoded["includeJoinHint"], json!(true));

        let without_hint = RequestBuilder::new(&root, &model).build();
        let encoded = serde_json::to_value(&without_hint).unwrap();
        assert!(encoded.get("includeJoinHint").is_none());
    }

    #[test]
    fn test_cache_key_is_stable() {
        let root = FilterGroup::empty()
            .with_child(FilterRule::new("status", Operator::Eq, json!({"b": 1, "a": 2})).into());
        let model = AggregationModel::new();

        let a = RequestBuilder::new(&root, &model).build().cache_key().unwrap();
        let b = RequestBuilder::new(&root, &model).build().cache_key().unwrap();
        assert_eq!(a, b);

        let c = RequestBuilder::new(&root, &model).limit(10).build().cache_key().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_cache_key_ignores_ids() {
        let build = |value: i64| {
            let root = FilterGroup::empty().with_child(
                FilterGroup::empty()
                    .with_child(FilterRule::new("duration", Operator::Gt, json!(value)).into())
                    .into(),
            );
            let mut model = AggregationModel::new();
            model.add_aggregation(AggregationFn::Count, ALL_ROWS);
            RequestBuilder::new(&root, &model).build()
        };

        let first = build(30);
        let second = build(30);
        assert_ne!(first.filters.id, second.filters.id);
        assert_eq!(first.cache_key().unwrap(), second.cache_key().unwrap());
        assert_ne!(first.cache_key().unwrap(), build(31).cache_key().unwrap());
    }

    #[test]
    fn test_cache_key_keeps_ids_inside_values() {
        let keyed = |value: serde_json::Value| {
            let root = FilterGroup::empty()
                .with_child(FilterRule::new("caller.meta", Operator::Eq, value).into());
            RequestBuilder::new(&root, &AggregationModel::new())
                .build()
                .cache_key()
                .unwrap()
        };
        assert_ne!(keyed(json!({"id": 1})), keyed(json!({"id": 2})));
    }
}

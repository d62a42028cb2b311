//! Query builder session
//!
//! One session owns one filter tree, one aggregation model, one
//! visualization binder and one coordinator. Every mutation is applied
//! synchronously and then the derived request is resubmitted; the
//! coordinator decides whether anything is executed.
//!
//! Field-dependent edits (picking a rule's field, group-by keys and
//! aggregations) are refused while the schema catalog is unavailable.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::aggregation::{AggregationFn, AggregationModel, ALL_ROWS};
use crate::config::VisualizerConfig;
use crate::executor::{CoordinatorSettings, QueryCoordinator, QueryService, QuerySnapshot};
use crate::filter::{self, FilterGroup, FilterNode, FilterRule, RulePatch};
use crate::id::ModelId;
use crate::observability::{log_event, Event, MetricsSnapshot};
use crate::request::{RequestBuilder, SortSpec, VisualizerQueryRequest};
use crate::schema::{
    FieldType, Operator, OperatorChoice, RuleStatus, RuleValidator, SchemaCatalog, SchemaError,
    VisualizerSchema,
};
use crate::viz::{self, ChartSpec, ValueFormat, VisualizationBinder, VizConfig, VizType};

pub struct QueryBuilderSession {
    id: Uuid,
    config: VisualizerConfig,
    schema: Option<Arc<VisualizerSchema>>,
    schema_error: Option<SchemaError>,
    filters: FilterGroup,
    model: AggregationModel,
    sort: Vec<SortSpec>,
    limit: u32,
    binder: VisualizationBinder,
    coordinator: QueryCoordinator,
}

impl QueryBuilderSession {
    /// Opens a session, loading the catalog if it is not loaded yet
    ///
    /// A catalog failure does not fail the session; it is reported by
    /// [`schema_error`](Self::schema_error) and the field controls stay
    /// disabled.
    pub async fn open(
        config: VisualizerConfig,
        catalog: &SchemaCatalog,
        service: Arc<dyn QueryService>,
    ) -> Self {
        let loaded = catalog.load(service.as_ref()).await;
        let mut session = Self::build(config, service);
        match loaded {
            Ok(schema) => session.schema = Some(schema),
            Err(err) => session.schema_error = Some(err),
        }
        session.log_opened();
        session
    }

    /// Opens a session over an already loaded catalog
    pub fn with_schema(
        config: VisualizerConfig,
        schema: Arc<VisualizerSchema>,
        service: Arc<dyn QueryService>,
    ) -> Self {
        let mut session = Self::build(config, service);
        session.schema = Some(schema);
        session.log_opened();
        session
    }

    fn build(config: VisualizerConfig, service: Arc<dyn QueryService>) -> Self {
        let coordinator = QueryCoordinator::new(service, CoordinatorSettings::from_config(&config));
        Self {
            id: Uuid::new_v4(),
            limit: config.default_limit,
            config,
            schema: None,
            schema_error: None,
            filters: FilterGroup::empty(),
            model: AggregationModel::new(),
            sort: Vec::new(),
            binder: VisualizationBinder::new(),
            coordinator,
        }
    }

    fn log_opened(&self) {
        log_event(
            Event::SessionOpened,
            &[
                ("schema_loaded", if self.schema.is_some() { "true" } else { "false" }),
                ("session_id", &self.id.to_string()),
            ],
        );
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn schema(&self) -> Option<&Arc<VisualizerSchema>> {
        self.schema.as_ref()
    }

    pub fn schema_error(&self) -> Option<&SchemaError> {
        self.schema_error.as_ref()
    }

    /// Whether field pickers, group-by and aggregation controls are usable
    pub fn field_controls_enabled(&self) -> bool {
        self.schema.is_some()
    }

    /// Message to show instead of the field controls
    pub fn blocking_message(&self) -> Option<String> {
        self.schema_error.as_ref().map(SchemaError::blocking_message)
    }

    /// Retries a failed catalog load
    pub async fn retry_schema(
        &mut self,
        catalog: &SchemaCatalog,
        service: &dyn QueryService,
    ) -> bool {
        if self.schema.is_some() {
            return true;
        }
        match catalog.load(service).await {
            Ok(schema) => {
                self.schema = Some(schema);
                self.schema_error = None;
                self.resubmit();
                true
            }
            Err(err) => {
                self.schema_error = Some(err);
                false
            }
        }
    }

    // ---- Filter tree ----

    pub fn filters(&self) -> &FilterGroup {
        &self.filters
    }

    /// Appends an empty rule to a group; returns its id
    pub fn add_rule(&mut self, group_id: &ModelId) -> Option<ModelId> {
        filter::find_group(&self.filters, group_id)?;
        let rule = FilterRule::empty();
        let id = rule.id.clone();
        self.filters = filter::insert_node(&self.filters, group_id, rule.into());
        self.resubmit();
        Some(id)
    }

    /// Appends an empty group, unless it would exceed the nesting limit
    pub fn add_group(&mut self, group_id: &ModelId) -> Option<ModelId> {
        let depth = filter::find_group(&self.filters, group_id)
            .and_then(|_| filter::depth_of(&self.filters, group_id))?;
        if depth >= self.config.max_filter_depth {
            return None;
        }
        let group = FilterGroup::empty();
        let id = group.id.clone();
        self.filters = filter::insert_node(&self.filters, group_id, group.into());
        self.resubmit();
        Some(id)
    }

    pub fn remove_node(&mut self, node_id: &ModelId) -> bool {
        self.replace_filters(filter::remove_node(&self.filters, node_id))
    }

    pub fn toggle_logic(&mut self, group_id: &ModelId) -> bool {
        self.replace_filters(filter::toggle_logic(&self.filters, group_id))
    }

    /// Selects a rule's field
    ///
    /// The operator resets to the field type's default and the value to
    /// that operator's empty value. An empty key clears the rule.
    pub fn set_rule_field(&mut self, rule_id: &ModelId, field: &str) -> bool {
        if filter::find_rule(&self.filters, rule_id).is_none() {
            return false;
        }

        let operator = if field.is_empty() {
            Operator::default()
        } else {
            let Some(schema) = &self.schema else {
                return false;
            };
            match schema.field(field) {
                Some(def) if def.filterable => schema.default_operator(def.field_type),
                _ => return false,
            }
        };

        let patch = RulePatch::field(field)
            .with_operator(operator)
            .with_value(if field.is_empty() {
                Value::String(String::new())
            } else {
                operator.empty_value()
            });
        self.replace_filters(filter::update_rule(&self.filters, rule_id, &patch))
    }

    /// Changes a rule's operator
    ///
    /// Refused if the operator is not legal for the rule's field. The value
    /// is cleared when the new operator expects a different shape.
    pub fn set_rule_operator(&mut self, rule_id: &ModelId, operator: Operator) -> bool {
        let Some(rule) = filter::find_rule(&self.filters, rule_id) else {
            return false;
        };
        let legal = self
            .operator_choices(rule_id)
            .iter()
            .any(|c| c.enabled && c.operator == operator);
        if !legal {
            return false;
        }

        let shape_changed = rule.operator.value_shape() != operator.value_shape();
        let mut patch = RulePatch::operator(operator);
        if shape_changed {
            patch = patch.with_value(operator.empty_value());
        }
        self.replace_filters(filter::update_rule(&self.filters, rule_id, &patch))
    }

    pub fn set_rule_value(&mut self, rule_id: &ModelId, value: Value) -> bool {
        self.replace_filters(filter::update_rule(
            &self.filters,
            rule_id,
            &RulePatch::value(value),
        ))
    }

    /// Operator picker entries for a rule
    pub fn operator_choices(&self, rule_id: &ModelId) -> Vec<OperatorChoice> {
        let (Some(rule), Some(schema)) = (filter::find_rule(&self.filters, rule_id), &self.schema)
        else {
            return Vec::new();
        };
        schema.operators_for_field(&rule.field)
    }

    pub fn rule_status(&self, rule_id: &ModelId) -> Option<RuleStatus> {
        let rule = filter::find_rule(&self.filters, rule_id)?;
        Some(match &self.schema {
            Some(schema) => RuleValidator::new(schema).validate(rule),
            None if rule.is_incomplete() => RuleStatus::Incomplete,
            None => RuleStatus::Complete,
        })
    }

    fn replace_filters(&mut self, filters: FilterGroup) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.resubmit();
        true
    }

    // ---- Aggregation model ----

    pub fn aggregation(&self) -> &AggregationModel {
        &self.model
    }

    pub fn add_group_by(&mut self, field: &str) -> bool {
        let groupable = self
            .schema
            .as_ref()
            .and_then(|s| s.field(field))
            .map_or(false, |def| def.groupable);
        groupable && self.model_changed(|m| m.add_group_by(field))
    }

    pub fn remove_group_by(&mut self, field: &str) -> bool {
        self.model_changed(|m| m.remove_group_by(field))
    }

    /// Adds an aggregation the catalog allows; `*` only with `count`
    pub fn add_aggregation(&mut self, agg_fn: AggregationFn, field: &str) -> Option<ModelId> {
        let schema = self.schema.as_ref()?;
        if !schema.supports_aggregation(agg_fn) {
            return None;
        }
        if field == ALL_ROWS {
            if !agg_fn.accepts_all_rows() {
                return None;
            }
        } else {
            let def = schema.field(field)?;
            let numeric = def.field_type == FieldType::Numeric;
            if !def.aggregatable || (agg_fn.requires_numeric() && !numeric) {
                return None;
            }
        }

        let id = self.model.add_aggregation(agg_fn, field)?;
        self.on_model_changed();
        Some(id)
    }

    pub fn remove_aggregation(&mut self, id: &ModelId) -> bool {
        self.model_changed(|m| m.remove_aggregation(id))
    }

    pub fn set_aggregation_alias(&mut self, id: &ModelId, alias: &str) -> bool {
        self.model_changed(|m| m.set_alias(id, alias))
    }

    pub fn alias_collisions(&self) -> Vec<String> {
        self.model.alias_collisions()
    }

    fn model_changed(&mut self, f: impl FnOnce(&mut AggregationModel) -> bool) -> bool {
        let changed = f(&mut self.model);
        if changed {
            self.on_model_changed();
        }
        changed
    }

    fn on_model_changed(&mut self) {
        self.binder
            .on_model_change(self.model.group_by(), self.model.aggregations());
        self.resubmit();
    }

    // ---- Sort and limit ----

    pub fn sort(&self) -> &[SortSpec] {
        &self.sort
    }

    pub fn set_sort(&mut self, sort: Vec<SortSpec>) {
        if sort != self.sort {
            self.sort = sort;
            self.resubmit();
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_limit(&mut self, limit: u32) {
        if limit != self.limit {
            self.limit = limit;
            self.resubmit();
        }
    }

    // ---- Visualization ----

    pub fn viz_config(&self) -> &VizConfig {
        self.binder.config()
    }

    pub fn set_viz_type(&mut self, viz_type: VizType) {
        self.binder.set_type(viz_type);
    }

    pub fn set_x_field(&mut self, field: Option<String>) {
        self.binder.set_x_field(field);
    }

    pub fn set_y_fields(&mut self, fields: Vec<String>) {
        self.binder.set_y_fields(fields);
    }

    pub fn set_series_field(&mut self, field: Option<String>) {
        self.binder.set_series_field(field);
    }

    pub fn set_value_format(&mut self, format: Option<ValueFormat>) {
        self.binder.set_value_format(format);
    }

    /// Chart for the last good result, if there is one
    pub fn chart(&self) -> Option<ChartSpec> {
        let snapshot = self.coordinator.snapshot();
        snapshot
            .last_good()
            .map(|result| viz::resolve(self.binder.config(), result))
    }

    // ---- Execution ----

    /// The request the current models serialize to
    pub fn request(&self) -> VisualizerQueryRequest {
        let mut builder = RequestBuilder::new(&self.filters, &self.model)
            .sort(&self.sort)
            .limit(self.limit)
            .max_limit(self.config.max_limit)
            .include_join_hint(self.config.include_join_hint);
        if let Some(schema) = &self.schema {
            builder = builder.schema(schema);
        }
        builder.build()
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        self.coordinator.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.coordinator.subscribe()
    }

    pub fn refetch(&self) {
        self.coordinator.refetch();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.coordinator.metrics()
    }

    fn resubmit(&self) {
        self.coordinator.submit(self.request());
    }

    /// Empties every model and returns the coordinator to idle
    pub fn reset(&mut self) {
        self.filters = FilterGroup::empty();
        self.model.reset();
        self.sort.clear();
        self.limit = self.config.default_limit;
        self.binder.reset();
        self.coordinator.reset();
        log_event(Event::SessionReset, &[("session_id", &self.id.to_string())]);
    }

    /// Root-level children, for callers rendering the tree
    pub fn root_nodes(&self) -> impl Iterator<Item = &FilterNode> {
        self.filters.rules.iter().map(|node| node.as_ref())
    }
}

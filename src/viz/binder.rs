//! Axis binding with one-shot auto-suggestion
//!
//! `x_field` and `y_fields` are each filled in once from the aggregation
//! model. After that, or after any explicit set (even to nothing), the
//! field belongs to the user and is never suggested again.

use super::config::{ValueFormat, VizConfig, VizType};
use crate::aggregation::AggregationDefinition;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualizationBinder {
    config: VizConfig,
    x_locked: bool,
    y_locked: bool,
}

impl VisualizationBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    /// Suggests bindings after a group-by or aggregation change
    ///
    /// Returns true if anything was filled in.
    pub fn on_model_change(
        &mut self,
        group_by: &[String],
        aggregations: &[AggregationDefinition],
    ) -> bool {
        let mut changed = false;

        if !self.x_locked && self.config.x_field.is_none() {
            if let Some(first) = group_by.first() {
                self.config.x_field = Some(first.clone());
                self.x_locked = true;
                changed = true;
            }
        }

        if !self.y_locked && self.config.y_fields().is_empty() {
            if let Some(first) = aggregations.first() {
                self.config.y_fields = Some(vec![first.alias.clone()]);
                self.y_locked = true;
                changed = true;
            }
        }

        changed
    }

    pub fn set_type(&mut self, viz_type: VizType) {
        self.config.viz_type = viz_type;
    }

    pub fn set_x_field(&mut self, field: Option<String>) {
        self.config.x_field = field;
        self.x_locked = true;
    }

    pub fn set_y_fields(&mut self, fields: Vec<String>) {
        self.config.y_fields = Some(fields);
        self.y_locked = true;
    }

    pub fn set_series_field(&mut self, field: Option<String>) {
        self.config.series_field = field;
    }

    pub fn set_value_format(&mut self, format: Option<ValueFormat>) {
        self.config.value_format = format;
    }

    /// Back to a bare table with suggestions re-armed
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationFn;

    fn aggs(fields: &[(AggregationFn, &str)]) -> Vec<AggregationDefinition> {
        fields
            .iter()
            .map(|(f, field)| AggregationDefinition::new(*f, *field))
            .collect()
    }

    #[test]
    fn test_suggests_first_group_by_and_aggregation() {
        let mut binder = VisualizationBinder::new();
        let changed = binder.on_model_change(
            &["status".into(), "region".into()],
            &aggs(&[(AggregationFn::Count, "*"), (AggregationFn::Sum, "duration")]),
        );

        assert!(changed);
        assert_eq!(binder.config().x_field.as_deref(), Some("status"));
        assert_eq!(binder.config().y_fields(), &["count_*"]);
    }

    #[test]
    fn test_suggestion_fires_once_per_field() {
        let mut binder = VisualizationBinder::new();
        binder.on_model_change(&["status".into()], &[]);
        binder.on_model_change(&["region".into()], &aggs(&[(AggregationFn::Count, "*")]));

        assert_eq!(binder.config().x_field.as_deref(), Some("status"));
        assert_eq!(binder.config().y_fields(), &["count_*"]);

        binder.on_model_change(&["region".into()], &aggs(&[(AggregationFn::Max, "duration")]));
        assert_eq!(binder.config().y_fields(), &["count_*"]);
    }

    #[test]
    fn test_explicit_empty_set_disables_suggestion() {
        let mut binder = VisualizationBinder::new();
        binder.set_x_field(None);
        binder.set_y_fields(vec![]);

        let changed = binder.on_model_change(
            &["status".into()],
            &aggs(&[(AggregationFn::Count, "*")]),
        );
        assert!(!changed);
        assert!(binder.config().x_field.is_none());
        assert!(binder.config().y_fields().is_empty());
    }

    #[test]
    fn test_setters_do_not_cross_validate() {
        let mut binder = VisualizationBinder::new();
        binder.set_type(VizType::Donut);
        binder.set_y_fields(vec!["a".into(), "b".into()]);
        binder.set_value_format(Some(ValueFormat::Percent));

        assert_eq!(binder.config().viz_type, VizType::Donut);
        assert_eq!(binder.config().y_fields().len(), 2);
    }

    #[test]
    fn test_reset_rearms_suggestions() {
        let mut binder = VisualizationBinder::new();
        binder.set_type(VizType::Line);
        binder.set_x_field(Some("status".into()));
        binder.set_series_field(Some("region".into()));
        binder.reset();

        assert_eq!(binder.config(), &VizConfig::default());
        assert!(binder.on_model_change(&["region".into()], &[]));
        assert_eq!(binder.config().x_field.as_deref(), Some("region"));
    }
}

//! Aggregation model
//!
//! Ordered group-by keys plus aggregation definitions. A `(fn, field)` pair
//! appears at most once; aliases are free-form.

mod model;
mod types;

pub use model::AggregationModel;
pub use types::{default_alias, AggregationDefinition, AggregationFn, ALL_ROWS};

//! One-shot schema catalog
//!
//! The catalog is fetched at most once and never invalidated. A failed
//! fetch leaves the cell empty, so a later call may retry.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::errors::{SchemaError, SchemaResult};
use super::types::VisualizerSchema;
use crate::executor::QueryService;
use crate::observability::{log_event, Event};

/// Holds the catalog once it has been loaded
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    cell: OnceCell<Arc<VisualizerSchema>>,
}

impl SchemaCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog that is already loaded
    pub fn preloaded(schema: VisualizerSchema) -> SchemaResult<Self> {
        schema.validate_structure()?;
        Ok(Self {
            cell: OnceCell::new_with(Some(Arc::new(schema))),
        })
    }

    /// Returns the catalog if it has been loaded
    pub fn get(&self) -> Option<Arc<VisualizerSchema>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Fetches the catalog from the schema endpoint, once
    ///
    /// Concurrent callers wait on the same fetch.
    pub async fn load(&self, service: &dyn QueryService) -> SchemaResult<Arc<VisualizerSchema>> {
        let result = self
            .cell
            .get_or_try_init(|| async {
                let schema = service
                    .fetch_schema()
                    .await
                    .map_err(|e| SchemaError::Unavailable(e.to_string()))?;
                Self::accept(schema, "endpoint")
            })
            .await;
        Self::finish(result)
    }

    /// Loads the catalog from a JSON file in the schema endpoint's format
    pub async fn load_from_file(&self, path: &Path) -> SchemaResult<Arc<VisualizerSchema>> {
        let result = self
            .cell
            .get_or_try_init(|| async {
                let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                let schema: VisualizerSchema = serde_json::from_str(&content)
                    .map_err(|e| SchemaError::Malformed(format!("Invalid JSON: {}", e)))?;
                Self::accept(schema, "file")
            })
            .await;
        Self::finish(result)
    }

    fn accept(schema: VisualizerSchema, origin: &str) -> SchemaResult<Arc<VisualizerSchema>> {
        schema.validate_structure()?;
        for field_type in schema.missing_operator_types() {
            log_event(
                Event::SchemaOperatorsMissing,
                &[("field_type", field_type.type_name())],
            );
        }
        log_event(
            Event::SchemaLoaded,
            &[
                ("fields", &schema.fields.len().to_string()),
                ("origin", origin),
            ],
        );
        Ok(Arc::new(schema))
    }

    fn finish(
        result: SchemaResult<&Arc<VisualizerSchema>>,
    ) -> SchemaResult<Arc<VisualizerSchema>> {
        match result {
            Ok(schema) => Ok(Arc::clone(schema)),
            Err(err) => {
                log_event(Event::SchemaLoadFailed, &[("reason", &err.to_string())]);
                Err(err)
            }
        }
    }
}

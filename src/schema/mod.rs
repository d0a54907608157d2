//! Textual schema descriptions that ground query generation.
//!
//! Two sources exist and a deployment uses exactly one of them: live
//! introspection of the connected database, or a fixed list of declared
//! table models rendered once.

pub mod introspect;
pub mod models;

pub use introspect::{ColumnDescriptor, SchemaDescriptor, TableDescriptor};
pub use models::{render_models, FieldModel, TableModel};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{SchemaConfig, SchemaSourceKind};
use crate::db::{DbError, SqlDatabase};

#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Same schema in, same text out. Failures propagate to the caller.
    async fn describe_schema(&self) -> Result<String, DbError>;
}

/// Declared models, rendered at construction.
pub struct StaticSchema {
    text: String,
}

impl StaticSchema {
    pub fn new(models: &[TableModel]) -> Self {
        Self {
            text: render_models(models),
        }
    }
}

#[async_trait]
impl SchemaProvider for StaticSchema {
    async fn describe_schema(&self) -> Result<String, DbError> {
        Ok(self.text.clone())
    }
}

pub struct IntrospectedSchema {
    db: Arc<dyn SqlDatabase>,
    schema: String,
    sample_rows: usize,
}

impl IntrospectedSchema {
    pub fn new(db: Arc<dyn SqlDatabase>, schema: Option<String>, sample_rows: usize) -> Self {
        let schema = schema.unwrap_or_else(|| db.default_schema().to_string());
        Self {
            db,
            schema,
            sample_rows,
        }
    }
}

#[async_trait]
impl SchemaProvider for IntrospectedSchema {
    async fn describe_schema(&self) -> Result<String, DbError> {
        let descriptor = SchemaDescriptor::introspect(self.db.as_ref(), &self.schema).await?;
        Ok(descriptor
            .render_ddl(self.db.as_ref(), &self.schema, self.sample_rows)
            .await)
    }
}

/// Picks the provider configured for this deployment.
pub fn provider_for(
    config: &SchemaConfig,
    db: Arc<dyn SqlDatabase>,
    schema: Option<String>,
) -> Arc<dyn SchemaProvider> {
    match config.source {
        SchemaSourceKind::Static => Arc::new(StaticSchema::new(&config.tables)),
        SchemaSourceKind::Introspect => Arc::new(IntrospectedSchema::new(db, schema, config.sample_rows)),
    }
}

use crate::db::{ConnectionManager, Database};
use crate::error::PipelineError;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// Every table of the selected database, kept in the engine's enumeration order.
///
/// Renders as `name(col type, col type); name(col type)`, the compact form
/// handed to the model as context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableDescriptor>,
}

impl fmt::Display for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", column.name, column.declared_type)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", table)?;
        }
        Ok(())
    }
}

/// Reads live table and column metadata into a [`SchemaDescriptor`].
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Describes the database behind the active connection.
    ///
    /// Without a connection this fails with [`PipelineError::NotConnected`]
    /// (400, "Not connected to DB"), the same client error a failed connect
    /// produces, rather than [`PipelineError::Connection`].
    pub async fn describe(connections: &ConnectionManager) -> Result<SchemaDescriptor, PipelineError> {
        let active = connections.current().await?;
        Self::describe_database(active.database()).await
    }

    pub async fn describe_database(db: &dyn Database) -> Result<SchemaDescriptor, PipelineError> {
        let table_names = db.list_tables().await.map_err(|e| {
            error!("Failed to list tables: {}", e);
            PipelineError::Introspection(e.to_string())
        })?;

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            let columns = db.list_columns(&name).await.map_err(|e| {
                error!("Failed to list columns of {}: {}", name, e);
                PipelineError::Introspection(e.to_string())
            })?;
            debug!("Table {} has {} columns", name, columns.len());
            tables.push(TableDescriptor { name, columns });
        }

        info!("Introspected {} tables", tables.len());
        Ok(SchemaDescriptor { tables })
    }
}

//! Error conversion helpers for store operations
//!
//! Translates store failures into domain errors where they carry domain
//! meaning, and into `OperationFailed` with context otherwise.

use tracing::error;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, EntityKind};
use crate::infrastructure::traits::{StoreError, StoreResult, Table};

/// Extension trait for converting `StoreResult` to `ApplicationResult` with context.
pub trait StoreResultExt<T> {
    /// Map a store error, naming the action that failed.
    ///
    /// # Example
    /// ```ignore
    /// tx.set_number(item.id, 3)
    ///     .with_store_context("renumber item")?;
    /// ```
    fn with_store_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn with_store_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| match e {
            StoreError::UniqueViolation { collection, number } => {
                error!(
                    "{}: uniqueness violated for number {} in collection {}, rolling back",
                    action, number, collection
                );
                DomainError::ConstraintConflict { collection, number }.into()
            }
            StoreError::MissingRow { table, id } => DomainError::NotFound {
                kind: match table {
                    Table::Nodes => EntityKind::Node,
                    Table::Items => EntityKind::Item,
                    Table::Collections => EntityKind::Collection,
                },
                id,
            }
            .into(),
            other => ApplicationError::OperationFailed {
                context: action.to_string(),
                source: Box::new(other),
            },
        })
    }
}

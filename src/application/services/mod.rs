//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the store traits but are themselves concrete structs.
//! Every mutating operation runs inside exactly one store transaction.

mod node;
mod sequence;

pub use node::NodeService;
pub use sequence::SequenceService;

use crate::application::{ApplicationResult, StoreResultExt};
use crate::infrastructure::traits::{Store, StoreTx};

/// Run `f` against a transaction that is never committed.
fn read<'s, T>(
    store: &'s dyn Store,
    f: impl FnOnce(&(dyn StoreTx + 's)) -> ApplicationResult<T>,
) -> ApplicationResult<T> {
    let tx = store.begin().with_store_context("begin read")?;
    f(tx.as_ref())
}

/// Run `f` in a transaction: commit if it succeeds, roll back (drop) if not.
fn write<'s, T>(
    store: &'s dyn Store,
    action: &str,
    f: impl FnOnce(&mut (dyn StoreTx + 's)) -> ApplicationResult<T>,
) -> ApplicationResult<T> {
    let mut tx = store.begin().with_store_context(action)?;
    let value = f(tx.as_mut())?;
    tx.commit().with_store_context(action)?;
    Ok(value)
}

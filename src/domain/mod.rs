//! Domain layer: entities and ordering rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod cycle;
pub mod entities;
pub mod error;
pub mod flatten;
pub mod forest;
pub mod hierarchy;
pub mod membership;

pub use cycle::{ensure_acyclic_move, is_ancestor_of};
pub use entities::*;
pub use error::{DomainError, DomainResult, EntityKind};
pub use flatten::{flatten, flatten_items};
pub use forest::{Forest, ForestNode};
pub use hierarchy::Hierarchy;
pub use membership::ensure_exact_membership;

//! Scope membership check shared by the bulk reorder operations.

use std::collections::HashSet;

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};

/// Succeeds only if `requested` is a permutation of `current`:
/// same length, no duplicates, same members.
pub fn ensure_exact_membership(
    scope: impl Into<String>,
    current: &[u64],
    requested: &[u64],
) -> DomainResult<()> {
    let current_set: HashSet<u64> = current.iter().copied().collect();
    let matches = requested.len() == current.len()
        && requested.iter().all_unique()
        && requested.iter().all(|id| current_set.contains(id));

    if matches {
        Ok(())
    } else {
        Err(DomainError::ScopeMismatch {
            scope: scope.into(),
            expected: current.iter().copied().sorted().collect(),
            actual: requested.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_permutation_when_checking_then_ok() {
        assert!(ensure_exact_membership("roots", &[1, 2, 3], &[3, 1, 2]).is_ok());
        assert!(ensure_exact_membership("empty", &[], &[]).is_ok());
    }

    #[test]
    fn given_duplicate_with_same_length_when_checking_then_mismatch() {
        let err = ensure_exact_membership("node 7", &[1, 2], &[1, 1]).unwrap_err();
        assert_eq!(
            err,
            DomainError::ScopeMismatch {
                scope: "node 7".into(),
                expected: vec![1, 2],
                actual: vec![1, 1],
            }
        );
    }

    #[test]
    fn given_foreign_or_missing_id_when_checking_then_mismatch() {
        assert!(ensure_exact_membership("c", &[1, 2], &[1, 9]).is_err());
        assert!(ensure_exact_membership("c", &[1, 2], &[1]).is_err());
        assert!(ensure_exact_membership("c", &[1, 2], &[1, 2, 3]).is_err());
    }
}

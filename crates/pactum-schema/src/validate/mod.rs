//! Contract-set validation.
//!
//! Runs over the full list of active contracts before generation. Problems
//! are collected per contract so the caller can skip just the offending
//! contracts and keep generating the rest.

pub mod naming;
pub mod relation;

use crate::{error::ErrorTree, node::Contract};

/// Implicit key every contract exposes, usable as a link field.
pub const IMPLICIT_ID: &str = "id";

/// Validate a set of contracts; children of the returned tree are keyed by
/// controller name.
#[must_use]
pub fn validate_contracts(contracts: &[Contract]) -> ErrorTree {
    let mut errors = ErrorTree::new();

    // Phase 1: contract-local invariants.
    for contract in contracts {
        let mut errs = ErrorTree::new();
        naming::validate_indexes(contract, &mut errs);
        naming::validate_messages(contract, &mut errs);
        errors.add_child(contract.name(), errs);
    }

    // Phase 2: invariants that need the whole set.
    naming::validate_unique_names(contracts, &mut errors);
    relation::validate_links(contracts, &mut errors);

    errors
}

use crate::{
    err,
    error::ErrorTree,
    node::{Contract, Field},
    validate::IMPLICIT_ID,
};
use std::collections::BTreeMap;

///
/// LinkEdge
/// A field-level relation captured for resolution against the set.
///

struct LinkEdge<'a> {
    source: &'a str,
    field: &'a Field,
    target: &'a str,
    target_field: &'a str,
}

/// Every link resolves to a contract in the set, and to a field on it.
pub fn validate_links(contracts: &[Contract], errors: &mut ErrorTree) {
    let by_name: BTreeMap<&str, &Contract> = contracts.iter().map(|c| (c.name(), c)).collect();

    // Phase 1: collect edges.
    let edges = contracts.iter().flat_map(|contract| {
        contract.fields.iter().filter_map(move |field| {
            field.link.as_ref().map(|link| LinkEdge {
                source: contract.name(),
                field,
                target: link.contract.as_str(),
                target_field: link.field.as_str(),
            })
        })
    });

    // Phase 2: resolve.
    for edge in edges {
        let mut errs = ErrorTree::new();

        match by_name.get(edge.target) {
            None => err!(
                errs,
                "link target '{}' is not a loaded contract",
                edge.target
            ),
            Some(target) => {
                if edge.target_field != IMPLICIT_ID && target.get_field(edge.target_field).is_none()
                {
                    err!(
                        errs,
                        "link field '{}' does not exist on '{}'",
                        edge.target_field,
                        edge.target
                    );
                }
            }
        }

        let mut contract_errs = ErrorTree::new();
        contract_errs.add_child(edge.field.property_key.clone(), errs);
        errors.add_child(edge.source, contract_errs);
    }
}

use crate::{
    err,
    error::ErrorTree,
    node::{ARRAY_TYPE, Contract, Message},
    types::ProtoType,
};
use std::collections::{BTreeMap, BTreeSet};

/// Controller names must be unique across the set.
pub fn validate_unique_names(contracts: &[Contract], errors: &mut ErrorTree) {
    let mut seen = BTreeMap::<&str, &str>::new();

    for contract in contracts {
        let path = contract.header.namespace.as_str();
        if let Some(prev) = seen.insert(contract.name(), path) {
            let mut errs = ErrorTree::new();
            err!(
                errs,
                "duplicate controller name '{}' in namespaces '{prev}' and '{path}'",
                contract.name()
            );
            errors.add_child(contract.name(), errs);
        }
    }
}

/// Index names are unique per contract and every index field exists.
pub fn validate_indexes(contract: &Contract, errs: &mut ErrorTree) {
    let mut names = BTreeSet::new();

    for index in &contract.indexes {
        if !names.insert(index.name.as_str()) {
            err!(errs, "duplicate index name '{}'", index.name);
        }

        for field in &index.fields {
            if contract.get_field(field).is_none() {
                err!(errs, "index '{}' names unknown field '{field}'", index.name);
            }
        }
    }
}

/// Property types resolve and service messages exist.
pub fn validate_messages(contract: &Contract, errs: &mut ErrorTree) {
    for message in &contract.messages {
        let mut message_errs = ErrorTree::new();
        validate_message(contract, message, &mut message_errs);
        errs.add_child(message.name.clone(), message_errs);
    }

    for service in &contract.services {
        for (slot, name) in [("request", &service.request), ("response", &service.response)] {
            if !name.is_empty() && contract.get_message(name).is_none() {
                let mut service_errs = ErrorTree::new();
                err!(service_errs, "{slot} message '{name}' is not declared");
                errs.add_child(service.name.clone(), service_errs);
            }
        }
    }
}

fn validate_message(contract: &Contract, message: &Message, errs: &mut ErrorTree) {
    for property in &message.properties {
        let ty = if property.is_array() {
            match &property.array_type {
                Some(item) => item.as_str(),
                None => {
                    err!(errs, "array property '{}' has no arrayType", property.name);
                    continue;
                }
            }
        } else {
            property.ty.as_str()
        };

        if !type_resolves(contract, ty) {
            err!(
                errs,
                "property '{}' has unknown type '{ty}'",
                property.name
            );
        }
    }
}

/// A property type resolves to a known proto type or a message on the contract.
#[must_use]
pub fn type_resolves(contract: &Contract, ty: &str) -> bool {
    ty != ARRAY_TYPE && (!ProtoType::from(ty).is_custom() || contract.get_message(ty).is_some())
}

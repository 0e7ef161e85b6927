//! Field and index diff between two snapshots of one contract.

use crate::migrate::column;
use pactum_schema::{
    migration::IndexDef,
    node::{Contract, Field},
};

///
/// AlterRisk
///
/// A column type change, a relation retarget, a repeated/scalar switch, or
/// nullable becoming required may lose or reject existing rows. Everything
/// else is safe.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlterRisk {
    Safe,
    DataLoss,
}

///
/// FieldChange
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldChange {
    pub from: Field,
    pub to: Field,
    pub risk: AlterRisk,
}

///
/// IndexChange
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexChange {
    pub from: IndexDef,
    pub to: IndexDef,
}

///
/// ContractDiff
///
/// Computed on demand, consumed once to build a migration.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContractDiff {
    pub added_fields: Vec<Field>,
    pub dropped_fields: Vec<Field>,
    pub modified_fields: Vec<FieldChange>,
    pub added_indexes: Vec<IndexDef>,
    pub dropped_indexes: Vec<IndexDef>,
    pub modified_indexes: Vec<IndexChange>,
}

impl ContractDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_fields.is_empty()
            && self.dropped_fields.is_empty()
            && self.modified_fields.is_empty()
            && self.added_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.modified_indexes.is_empty()
    }

    /// Dropped columns and risky alters can both lose stored data.
    #[must_use]
    pub fn data_loss_possible(&self) -> bool {
        !self.dropped_fields.is_empty()
            || self
                .modified_fields
                .iter()
                .any(|change| change.risk == AlterRisk::DataLoss)
    }
}

/// Diff two snapshots, fields by property key and indexes by name. Implicit
/// option columns take part. Added and modified entries follow the current
/// declaration order; dropped entries follow the previous one.
#[must_use]
pub fn diff(previous: &Contract, current: &Contract) -> ContractDiff {
    let mut out = ContractDiff::default();

    // Phase 1: fields
    let prev_fields = column::effective_fields(previous);
    let cur_fields = column::effective_fields(current);

    for field in &cur_fields {
        match prev_fields.iter().find(|f| f.property_key == field.property_key) {
            None => out.added_fields.push(field.clone()),
            Some(prev) => {
                if let Some(risk) = classify(prev, field) {
                    out.modified_fields.push(FieldChange {
                        from: prev.clone(),
                        to: field.clone(),
                        risk,
                    });
                }
            }
        }
    }
    out.dropped_fields = prev_fields
        .into_iter()
        .filter(|prev| !cur_fields.iter().any(|f| f.property_key == prev.property_key))
        .collect();

    // Phase 2: indexes
    let prev_indexes = column::indexes(previous);
    let cur_indexes = column::indexes(current);

    for index in &cur_indexes {
        match prev_indexes.iter().find(|i| i.name == index.name) {
            None => out.added_indexes.push(index.clone()),
            Some(prev) if prev != index => out.modified_indexes.push(IndexChange {
                from: prev.clone(),
                to: index.clone(),
            }),
            Some(_) => {}
        }
    }
    out.dropped_indexes = prev_indexes
        .into_iter()
        .filter(|prev| !cur_indexes.iter().any(|i| i.name == prev.name))
        .collect();

    out
}

/// `None` when the column is unchanged, else how risky the alter is.
#[must_use]
pub fn classify(from: &Field, to: &Field) -> Option<AlterRisk> {
    let retyped = from.proto_type != to.proto_type || from.proto_repeated != to.proto_repeated;
    let retargeted = from.relation_target() != to.relation_target();
    let tightened = from.nullable && !to.nullable;

    let changed = retyped
        || retargeted
        || from.nullable != to.nullable
        || from.unique != to.unique
        || from.default_value != to.default_value;

    if !changed {
        None
    } else if retyped || retargeted || tightened {
        Some(AlterRisk::DataLoss)
    } else {
        Some(AlterRisk::Safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::{
        node::{ContractHeader, Index, Link},
        types::ProtoType,
    };

    fn groups(fields: Vec<Field>, indexes: Vec<Index>) -> Contract {
        Contract {
            header: ContractHeader::new("Groups"),
            fields,
            indexes,
            ..Contract::default()
        }
    }

    #[test]
    fn unchanged_snapshots_diff_empty() {
        let contract = groups(vec![Field::new("name", ProtoType::String)], Vec::new());

        assert!(diff(&contract, &contract).is_empty());
    }

    #[test]
    fn classifies_added_dropped_and_modified() {
        let prev = groups(
            vec![
                Field::new("name", ProtoType::String).unique(true),
                Field::new("roles", ProtoType::String).repeated(true),
            ],
            vec![Index::new("by_name", ["name"])],
        );
        let cur = groups(
            vec![
                Field::new("name", ProtoType::String),
                Field::new("enabled", ProtoType::Bool),
            ],
            vec![Index::new("by_name", ["name"]).unique(true)],
        );

        let diff = diff(&prev, &cur);
        assert_eq!(diff.added_fields[0].property_key, "enabled");
        assert_eq!(diff.dropped_fields[0].property_key, "roles");
        assert_eq!(diff.modified_fields[0].risk, AlterRisk::Safe);
        assert_eq!(diff.modified_indexes.len(), 1);
        assert!(diff.data_loss_possible());
    }

    #[test]
    fn risky_alters_are_flagged() {
        let base = Field::new("owner", ProtoType::String).nullable(true);

        let retyped = Field::new("owner", ProtoType::Int64).nullable(true);
        assert_eq!(classify(&base, &retyped), Some(AlterRisk::DataLoss));

        let tightened = Field::new("owner", ProtoType::String);
        assert_eq!(classify(&base, &tightened), Some(AlterRisk::DataLoss));

        let relaxed = Field::new("owner", ProtoType::String).nullable(true).unique(true);
        assert_eq!(classify(&base, &relaxed), Some(AlterRisk::Safe));

        let linked = base.clone().link(Link::new("Users", "id"));
        let retargeted = base.clone().link(Link::new("Accounts", "id"));
        assert_eq!(classify(&linked, &retargeted), Some(AlterRisk::DataLoss));
    }
}

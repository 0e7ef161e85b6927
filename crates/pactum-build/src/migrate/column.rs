//! Contract fields as persistence columns.
//!
//! Shared by entity generation and the migration generator so both agree on
//! column names, types, and the implicit columns database options add.

use crate::migrate::MigrateError;
use convert_case::{Case, Casing};
use pactum_config::RepositoryBackend;
use pactum_schema::{
    migration::{Column, IndexDef},
    node::{Contract, Field},
    types::ProtoType,
    validate::IMPLICIT_ID,
};
use serde_json::Value;

/// Column type for a proto type on a backend; `None` for custom types.
#[must_use]
pub const fn column_type(backend: RepositoryBackend, ty: &ProtoType) -> Option<&'static str> {
    let name = match backend {
        RepositoryBackend::Relational => match ty {
            ProtoType::Any | ProtoType::Json => "jsonb",
            ProtoType::Bool => "boolean",
            ProtoType::Bytes => "bytea",
            ProtoType::Custom(_) => return None,
            ProtoType::Date => "date",
            ProtoType::Double => "double precision",
            ProtoType::Enum | ProtoType::String => "varchar",
            ProtoType::Float => "real",
            ProtoType::Int32 => "integer",
            ProtoType::Int64 | ProtoType::Uint32 => "bigint",
            ProtoType::Timestamp => "timestamp",
            ProtoType::Uint64 => "numeric(20)",
        },
        RepositoryBackend::Document => match ty {
            ProtoType::Any | ProtoType::Json => "object",
            ProtoType::Bool => "bool",
            ProtoType::Bytes => "binData",
            ProtoType::Custom(_) => return None,
            ProtoType::Date | ProtoType::Timestamp => "date",
            ProtoType::Double | ProtoType::Float => "double",
            ProtoType::Enum | ProtoType::String => "string",
            ProtoType::Int32 => "int",
            ProtoType::Int64 | ProtoType::Uint32 => "long",
            ProtoType::Uint64 => "decimal",
        },
    };

    Some(name)
}

/// Primary key column every table carries unless a field named `id` exists.
#[must_use]
pub fn id_column(backend: RepositoryBackend) -> Column {
    let column_type = match backend {
        RepositoryBackend::Relational => "uuid",
        RepositoryBackend::Document => "objectId",
    };

    Column {
        name: IMPLICIT_ID.to_string(),
        column_type: column_type.to_string(),
        nullable: false,
        unique: true,
        array: false,
        default: None,
        references: None,
    }
}

/// Fields added by the contract's database options.
#[must_use]
pub fn implicit_fields(contract: &Contract) -> Vec<Field> {
    let options = &contract.header.options;
    let mut fields = Vec::new();

    if options.database_timestamps {
        fields.push(Field::new("createdAt", ProtoType::Timestamp).read_only(true));
        fields.push(Field::new("updatedAt", ProtoType::Timestamp).read_only(true));
    }
    if options.database_user_action {
        fields.push(Field::new("userCreator", ProtoType::String).nullable(true));
        fields.push(Field::new("userLastUpdate", ProtoType::String).nullable(true));
    }
    if options.database_fake_delete {
        fields.push(Field::new("deleted", ProtoType::Bool).default_value(Value::Bool(false)));
    }

    fields
}

/// Declared fields followed by implicit ones a declared field does not shadow.
#[must_use]
pub fn effective_fields(contract: &Contract) -> Vec<Field> {
    let mut fields = contract.fields.clone();
    for field in implicit_fields(contract) {
        if contract.get_field(&field.property_key).is_none() {
            fields.push(field);
        }
    }

    fields
}

/// Column name for a property key.
#[must_use]
pub fn column_name(property_key: &str) -> String {
    property_key.to_case(Case::Snake)
}

pub fn column(
    backend: RepositoryBackend,
    contract: &Contract,
    field: &Field,
) -> Result<Column, MigrateError> {
    let column_type =
        column_type(backend, &field.proto_type).ok_or_else(|| MigrateError::UnmappableType {
            contract: contract.name().to_string(),
            field: field.property_key.clone(),
            ty: field.proto_type.to_string(),
            backend,
        })?;

    Ok(Column {
        name: column_name(&field.property_key),
        column_type: column_type.to_string(),
        nullable: field.nullable,
        unique: field.unique,
        array: field.proto_repeated,
        default: field.default_value.as_ref().map(Value::to_string),
        references: field.relation_target().map(ToString::to_string),
    })
}

/// Every column of the contract's table, primary key first.
pub fn columns(backend: RepositoryBackend, contract: &Contract) -> Result<Vec<Column>, MigrateError> {
    let fields = effective_fields(contract);
    let mut columns = Vec::with_capacity(fields.len() + 1);

    if !fields.iter().any(|f| f.property_key == IMPLICIT_ID) {
        columns.push(id_column(backend));
    }
    for field in &fields {
        columns.push(column(backend, contract, field)?);
    }

    Ok(columns)
}

/// Declared indexes followed by one single-column index per `index: true`
/// field, named `<table>_<column>_idx`.
#[must_use]
pub fn indexes(contract: &Contract) -> Vec<IndexDef> {
    let table = contract.table_name();

    let declared = contract.indexes.iter().map(|index| IndexDef {
        name: index.name.clone(),
        fields: index.fields.iter().map(|f| column_name(f)).collect(),
        unique: index.options.unique,
    });
    let per_field = effective_fields(contract)
        .into_iter()
        .filter(|field| field.index)
        .map(|field| {
            let column = column_name(&field.property_key);
            IndexDef {
                name: format!("{table}_{column}_idx"),
                fields: vec![column],
                unique: false,
            }
        });

    let mut all: Vec<IndexDef> = Vec::new();
    for index in declared.chain(per_field) {
        if !all.iter().any(|existing| existing.name == index.name) {
            all.push(index);
        }
    }

    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::node::{ContractHeader, ContractOptions, Index};

    fn contract(options: ContractOptions, fields: Vec<Field>) -> Contract {
        Contract {
            header: ContractHeader {
                options,
                ..ContractHeader::new("Groups")
            },
            fields,
            ..Contract::default()
        }
    }

    #[test]
    fn database_options_add_implicit_columns() {
        let contract = contract(
            ContractOptions {
                database_timestamps: true,
                database_user_action: true,
                database_fake_delete: true,
                ..ContractOptions::default()
            },
            vec![Field::new("name", ProtoType::String)],
        );

        let names: Vec<_> = columns(RepositoryBackend::Relational, &contract)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "id",
                "name",
                "created_at",
                "updated_at",
                "user_creator",
                "user_last_update",
                "deleted"
            ]
        );
    }

    #[test]
    fn column_constraints_follow_field_flags() {
        let contract = contract(ContractOptions::default(), Vec::new());
        let field = Field::new("enabled", ProtoType::Bool).default_value(true);

        let relational = column(RepositoryBackend::Relational, &contract, &field).unwrap();
        assert_eq!(relational.to_string(), "enabled boolean NOT NULL DEFAULT true");

        let document = column(RepositoryBackend::Document, &contract, &field).unwrap();
        assert_eq!(document.column_type, "bool");
    }

    #[test]
    fn custom_types_do_not_map() {
        let contract = contract(ContractOptions::default(), Vec::new());
        let field = Field::new("location", "geopoint");

        assert!(matches!(
            column(RepositoryBackend::Relational, &contract, &field),
            Err(MigrateError::UnmappableType { .. })
        ));
    }

    #[test]
    fn indexed_fields_get_named_indexes() {
        let mut contract = contract(
            ContractOptions::default(),
            vec![Field::new("ownerId", ProtoType::String).index(true)],
        );
        contract.indexes.push(Index::new("by_owner", ["ownerId"]).unique(true));

        let indexes = indexes(&contract);
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].fields, vec!["owner_id"]);
        assert!(indexes[0].unique);
        assert_eq!(indexes[1].name, "groups_owner_id_idx");
    }
}

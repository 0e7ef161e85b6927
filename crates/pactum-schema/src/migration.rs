//! Migration operation vocabulary.
//!
//! Operations carry full before/after definitions so every operation has an
//! exact inverse; a down-migration is the reversed list of inverses.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    ops::Not,
};

///
/// Column
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub column_type: String,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub array: bool,

    /// Default value as JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Contract the column references, for relation columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if self.array {
            f.write_str("[]")?;
        }
        if !self.nullable {
            f.write_str(" NOT NULL")?;
        }
        if self.unique {
            f.write_str(" UNIQUE")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {default}")?;
        }
        if let Some(table) = &self.references {
            write!(f, " REFERENCES {table}")?;
        }

        Ok(())
    }
}

impl ToTokens for Column {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = &self.name;
        let column_type = &self.column_type;
        let nullable = self.nullable;
        let unique = self.unique;
        let array = self.array;
        let default = quote_opt_string(self.default.as_deref());
        let references = quote_opt_string(self.references.as_deref());

        tokens.extend(quote! {
            ::pactum::schema::migration::Column {
                name: ::std::string::String::from(#name),
                column_type: ::std::string::String::from(#column_type),
                nullable: #nullable,
                unique: #unique,
                array: #array,
                default: #default,
                references: #references,
            }
        });
    }
}

///
/// IndexDef
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexDef {
    pub name: String,
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub unique: bool,
}

impl Display for IndexDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unique = if self.unique { "UNIQUE " } else { "" };

        write!(f, "{unique}{} ({})", self.name, self.fields.join(", "))
    }
}

impl ToTokens for IndexDef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = &self.name;
        let fields = &self.fields;
        let unique = self.unique;

        tokens.extend(quote! {
            ::pactum::schema::migration::IndexDef {
                name: ::std::string::String::from(#name),
                fields: vec![#(::std::string::String::from(#fields)),*],
                unique: #unique,
            }
        });
    }
}

///
/// MigrationOp
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum MigrationOp {
    CreateTable {
        table: String,
        columns: Vec<Column>,
        indexes: Vec<IndexDef>,
    },
    DropTable {
        table: String,
        columns: Vec<Column>,
        indexes: Vec<IndexDef>,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    DropColumn {
        table: String,
        column: Column,
    },
    AlterColumn {
        table: String,
        from: Column,
        to: Column,
    },
    CreateIndex {
        table: String,
        index: IndexDef,
    },
    DropIndex {
        table: String,
        index: IndexDef,
    },
    ModifyIndex {
        table: String,
        from: IndexDef,
        to: IndexDef,
    },
}

impl MigrationOp {
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { table, .. }
            | Self::DropTable { table, .. }
            | Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::ModifyIndex { table, .. } => table,
        }
    }

    /// The operation that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self.clone() {
            Self::CreateTable {
                table,
                columns,
                indexes,
            } => Self::DropTable {
                table,
                columns,
                indexes,
            },
            Self::DropTable {
                table,
                columns,
                indexes,
            } => Self::CreateTable {
                table,
                columns,
                indexes,
            },
            Self::AddColumn { table, column } => Self::DropColumn { table, column },
            Self::DropColumn { table, column } => Self::AddColumn { table, column },
            Self::AlterColumn { table, from, to } => Self::AlterColumn {
                table,
                from: to,
                to: from,
            },
            Self::CreateIndex { table, index } => Self::DropIndex { table, index },
            Self::DropIndex { table, index } => Self::CreateIndex { table, index },
            Self::ModifyIndex { table, from, to } => Self::ModifyIndex {
                table,
                from: to,
                to: from,
            },
        }
    }

    /// Exact inverse of a whole up-migration: inverses in reverse order.
    #[must_use]
    pub fn invert_all(ops: &[Self]) -> Vec<Self> {
        ops.iter().rev().map(Self::inverse).collect()
    }
}

impl Display for MigrationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable { table, columns, .. } => {
                write!(f, "create table {table} ({} columns)", columns.len())
            }
            Self::DropTable { table, .. } => write!(f, "drop table {table}"),
            Self::AddColumn { table, column } => write!(f, "add column {table}.{column}"),
            Self::DropColumn { table, column } => {
                write!(f, "drop column {table}.{}", column.name)
            }
            Self::AlterColumn { table, from, to } => {
                write!(f, "alter column {table}.{} ({from} -> {to})", to.name)
            }
            Self::CreateIndex { table, index } => write!(f, "create index {table}.{index}"),
            Self::DropIndex { table, index } => write!(f, "drop index {table}.{}", index.name),
            Self::ModifyIndex { table, from, to } => {
                write!(f, "modify index {table}.{} ({from} -> {to})", to.name)
            }
        }
    }
}

impl ToTokens for MigrationOp {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let table = self.table();
        let body = match self {
            Self::CreateTable {
                columns, indexes, ..
            } => quote!(CreateTable {
                table: ::std::string::String::from(#table),
                columns: vec![#(#columns),*],
                indexes: vec![#(#indexes),*],
            }),
            Self::DropTable {
                columns, indexes, ..
            } => quote!(DropTable {
                table: ::std::string::String::from(#table),
                columns: vec![#(#columns),*],
                indexes: vec![#(#indexes),*],
            }),
            Self::AddColumn { column, .. } => quote!(AddColumn {
                table: ::std::string::String::from(#table),
                column: #column,
            }),
            Self::DropColumn { column, .. } => quote!(DropColumn {
                table: ::std::string::String::from(#table),
                column: #column,
            }),
            Self::AlterColumn { from, to, .. } => quote!(AlterColumn {
                table: ::std::string::String::from(#table),
                from: #from,
                to: #to,
            }),
            Self::CreateIndex { index, .. } => quote!(CreateIndex {
                table: ::std::string::String::from(#table),
                index: #index,
            }),
            Self::DropIndex { index, .. } => quote!(DropIndex {
                table: ::std::string::String::from(#table),
                index: #index,
            }),
            Self::ModifyIndex { from, to, .. } => quote!(ModifyIndex {
                table: ::std::string::String::from(#table),
                from: #from,
                to: #to,
            }),
        };

        tokens.extend(quote!(::pactum::schema::migration::MigrationOp::#body));
    }
}

fn quote_opt_string(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote!(::std::option::Option::Some(::std::string::String::from(#value))),
        None => quote!(::std::option::Option::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, unique: bool) -> Column {
        Column {
            name: name.to_string(),
            column_type: "varchar".to_string(),
            nullable: false,
            unique,
            array: false,
            default: None,
            references: None,
        }
    }

    #[test]
    fn invert_all_reverses_and_inverts() {
        let up = vec![
            MigrationOp::AddColumn {
                table: "groups".to_string(),
                column: column("slug", false),
            },
            MigrationOp::AlterColumn {
                table: "groups".to_string(),
                from: column("name", true),
                to: column("name", false),
            },
        ];

        let down = MigrationOp::invert_all(&up);
        assert_eq!(
            down,
            vec![
                MigrationOp::AlterColumn {
                    table: "groups".to_string(),
                    from: column("name", false),
                    to: column("name", true),
                },
                MigrationOp::DropColumn {
                    table: "groups".to_string(),
                    column: column("slug", false),
                },
            ]
        );
        assert_eq!(MigrationOp::invert_all(&down), up);
    }

    #[test]
    fn renders_readable_descriptions() {
        let op = MigrationOp::DropColumn {
            table: "groups".to_string(),
            column: column("roles", false),
        };
        assert_eq!(op.to_string(), "drop column groups.roles");
        assert_eq!(
            column("name", true).to_string(),
            "name varchar NOT NULL UNIQUE"
        );
    }

    #[test]
    fn tokens_reference_runtime_paths() {
        let op = MigrationOp::CreateIndex {
            table: "groups".to_string(),
            index: IndexDef {
                name: "by_name".to_string(),
                fields: vec!["name".to_string()],
                unique: true,
            },
        };

        let rendered = op.to_token_stream().to_string();
        assert!(rendered.contains("MigrationOp :: CreateIndex"));
        assert!(rendered.contains("\"by_name\""));
    }
}

//! Repository entity generation.
//!
//! Runs with the repository module present, for contracts with
//! `generate_entities`. Entity names are assigned for every such contract
//! first so links can resolve regardless of declaration order; the
//! resolver transpiler reads them afterwards.

use crate::{
    migrate::column,
    transpile::{
        ProviderKind, TranspileContext, TranspileError, Transpiler,
        naming::{self, ENTITIES},
    },
};
use pactum_config::RepositoryBackend;
use pactum_schema::{node::Contract, validate::IMPLICIT_ID};
use proc_macro2::TokenStream;
use quote::quote;

///
/// EntityTranspiler
///

#[derive(Clone, Copy, Debug, Default)]
pub struct EntityTranspiler;

impl Transpiler for EntityTranspiler {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        if !ctx.flags().repository {
            return Ok(());
        }

        // Phase 1: names
        ctx.each_contract(
            self.name(),
            |c| c.header.generate_entities,
            |ctx, contract| {
                let ident = naming::type_ident(contract.name(), "Entity")?;
                ctx.set_entity_name(contract.name(), ident.to_string());

                Ok(())
            },
        );

        // Phase 2: files
        let backend = ctx.config().repository.backend;
        let mut modules = Vec::new();
        ctx.each_contract(
            self.name(),
            |c| c.header.generate_entities,
            |ctx, contract| {
                if ctx.entity_name(contract.name()).is_none() {
                    return Ok(());
                }

                let module = naming::module_name(contract, "entity");
                let result = generate(contract, backend, |target| {
                    ctx.entity_name(target).map(ToString::to_string)
                })
                .and_then(|tokens| ctx.write_source(ENTITIES, &module, &tokens));

                if let Err(e) = result {
                    ctx.remove_entity_name(contract.name());
                    return Err(e);
                }

                let item = naming::type_ident(contract.name(), "Entity")?;
                let path = naming::provider_path(ctx.config(), ENTITIES, &module, &item);
                ctx.provide(item.to_string(), ProviderKind::Entity, path);
                modules.push(module);

                Ok(())
            },
        );

        if modules.is_empty() {
            return Ok(());
        }

        ctx.write_mod_file(ENTITIES, &modules)
    }
}

/// Tokens for one entity. `entity_of` maps a contract name to its generated
/// entity name.
pub fn generate<F>(
    contract: &Contract,
    backend: RepositoryBackend,
    entity_of: F,
) -> Result<TokenStream, TranspileError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = contract.name();
    let ident = naming::type_ident(name, "Entity")?;
    let table = contract.table_name();
    let derive = naming::serde_derive();
    let fields = column::effective_fields(contract);

    // ------------------------------------------------------------------
    // Struct fields
    // ------------------------------------------------------------------

    let mut members = quote!();
    if !fields.iter().any(|f| f.property_key == IMPLICIT_ID) {
        members.extend(quote!(pub id: ::std::string::String,));
    }
    for field in &fields {
        let key = &field.property_key;
        let field_ident = naming::snake_ident(key)?;
        let ty = naming::field_type(field)?;
        let rename = naming::serde_rename(key, &field_ident);
        let optional = field
            .nullable
            .then(|| quote!(#[serde(default, skip_serializing_if = "::std::option::Option::is_none")]));

        members.extend(quote! {
            #rename
            #optional
            pub #field_ident: #ty,
        });
    }

    // ------------------------------------------------------------------
    // Schema constants
    // ------------------------------------------------------------------

    let columns = column::columns(backend, contract)?.into_iter().map(|column| {
        let name = column.name;
        let column_type = column.column_type;
        let nullable = column.nullable;
        let unique = column.unique;
        let array = column.array;
        let primary = name == IMPLICIT_ID;

        quote! {
            ::pactum::runtime::ColumnDef {
                name: #name,
                column_type: #column_type,
                nullable: #nullable,
                unique: #unique,
                array: #array,
                primary: #primary,
            }
        }
    });

    let mut relations = Vec::new();
    for field in &fields {
        let Some(link) = &field.link else {
            continue;
        };
        let target = entity_of(&link.contract).ok_or_else(|| TranspileError::UnresolvedLink {
            field: field.property_key.clone(),
            target: link.contract.clone(),
        })?;

        let field_name = column::column_name(&field.property_key);
        let target_contract = &link.contract;
        let target_field = &link.field;
        let array = link.array || field.proto_repeated;
        let create = link.create_relationship;

        relations.push(quote! {
            ::pactum::runtime::RelationDef {
                field: #field_name,
                target: #target,
                target_contract: #target_contract,
                target_field: #target_field,
                array: #array,
                create_relationship: #create,
            }
        });
    }

    let indexes = column::indexes(contract).into_iter().map(|index| {
        let name = index.name;
        let fields = index.fields;
        let unique = index.unique;

        quote! {
            ::pactum::runtime::EntityIndex {
                name: #name,
                fields: &[#(#fields),*],
                unique: #unique,
            }
        }
    });

    let backend = match backend {
        RepositoryBackend::Document => quote!(::pactum::runtime::Backend::Document),
        RepositoryBackend::Relational => quote!(::pactum::runtime::Backend::Relational),
    };

    Ok(quote! {
        #derive
        pub struct #ident {
            #members
        }

        impl ::pactum::runtime::EntitySchema for #ident {
            const CONTRACT: &'static str = #name;
            const TABLE: &'static str = #table;
            const BACKEND: ::pactum::runtime::Backend = #backend;
            const COLUMNS: &'static [::pactum::runtime::ColumnDef] = &[#(#columns),*];
            const RELATIONS: &'static [::pactum::runtime::RelationDef] = &[#(#relations),*];
            const INDEXES: &'static [::pactum::runtime::EntityIndex] = &[#(#indexes),*];
        }
    })
}

//! Names, paths, and Rust types shared by the source transpilers.

use crate::transpile::TranspileError;
use convert_case::{Case, Casing};
use pactum_config::GenerateConfig;
use pactum_schema::{
    node::{Contract, Field, Message, Property, Service},
    types::ProtoType,
};
use proc_macro2::{Ident, TokenStream};
use quote::quote;

// subdirectories under the source root
pub const CONTROLLERS: &str = "controllers";
pub const ENTITIES: &str = "entities";
pub const GATEWAYS: &str = "gateways";
pub const RESOLVERS: &str = "resolvers";
pub const SERVICES: &str = "services";

pub fn parse_ident(value: &str) -> Result<Ident, TranspileError> {
    syn::parse_str::<Ident>(value).map_err(|_| TranspileError::InvalidIdent {
        value: value.to_string(),
    })
}

/// PascalCase type ident with a suffix, `("groups", "Entity") -> GroupsEntity`.
pub fn type_ident(name: &str, suffix: &str) -> Result<Ident, TranspileError> {
    parse_ident(&format!("{}{suffix}", name.to_case(Case::Pascal)))
}

pub fn snake_ident(name: &str) -> Result<Ident, TranspileError> {
    parse_ident(&name.to_case(Case::Snake))
}

/// File and module name of a contract's artifact, `groups_controller`.
#[must_use]
pub fn module_name(contract: &Contract, suffix: &str) -> String {
    format!("{}_{suffix}", contract.file_stem())
}

/// Path to an item in another generated file, rooted at the configured
/// generated module.
pub fn generated_path(
    config: &GenerateConfig,
    subdir: &str,
    module: &str,
) -> Result<TokenStream, TranspileError> {
    let root: syn::Path =
        syn::parse_str(&config.generated_module).map_err(|_| TranspileError::InvalidPath {
            value: config.generated_module.clone(),
        })?;
    let subdir = parse_ident(subdir)?;
    let module = parse_ident(module)?;

    Ok(quote!(#root::#subdir::#module))
}

/// String form of a generated item path, as reported to the provider list.
#[must_use]
pub fn provider_path(config: &GenerateConfig, subdir: &str, module: &str, item: &Ident) -> String {
    format!("{}::{subdir}::{module}::{item}", config.generated_module)
}

/// Full route of a service: contract sub-path joined with the service path.
#[must_use]
pub fn route_path(contract: &Contract, service: &Service) -> String {
    let segments: Vec<_> = [contract.header.sub_path.as_str(), service.path.as_str()]
        .into_iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();

    format!("/{}", segments.join("/"))
}

/// Stable operation name, `Groups.findGroup`.
#[must_use]
pub fn operation_name(contract: &Contract, service: &Service) -> String {
    format!("{}.{}", contract.name(), service.name)
}

/// `#[serde(rename = "..")]` when the Rust ident differs from the wire key.
#[must_use]
pub fn serde_rename(key: &str, ident: &Ident) -> TokenStream {
    if *ident == key {
        quote!()
    } else {
        quote!(#[serde(rename = #key)])
    }
}

/// Derive and crate attributes for a generated serde type.
#[must_use]
pub fn serde_derive() -> TokenStream {
    quote! {
        #[derive(
            Clone,
            Debug,
            PartialEq,
            ::pactum::__reexports::serde::Deserialize,
            ::pactum::__reexports::serde::Serialize
        )]
        #[serde(crate = "::pactum::__reexports::serde")]
    }
}

// ----------------------------------------------------------------------
// Types
// ----------------------------------------------------------------------

/// Rust type of a contract field, with `Vec` and `Option` applied.
pub fn field_type(field: &Field) -> Result<TokenStream, TranspileError> {
    let base = field
        .proto_type
        .rust_type()
        .ok_or_else(|| TranspileError::UnmappableType {
            field: field.property_key.clone(),
            ty: field.proto_type.to_string(),
        })?;

    let ty = if field.proto_repeated {
        quote!(::std::vec::Vec<#base>)
    } else {
        base
    };

    Ok(if field.nullable {
        quote!(::std::option::Option<#ty>)
    } else {
        ty
    })
}

/// Rust type of a message property. Arrays become `Vec`; optional scalars
/// become `Option`.
pub fn property_type(
    contract: &Contract,
    message: &Message,
    property: &Property,
) -> Result<TokenStream, TranspileError> {
    if property.is_array() {
        let item = property.array_type.as_deref().unwrap_or_default();
        let item = scalar_type(contract, message, property, item)?;

        return Ok(quote!(::std::vec::Vec<#item>));
    }

    let ty = scalar_type(contract, message, property, &property.ty)?;

    Ok(if property.required {
        ty
    } else {
        quote!(::std::option::Option<#ty>)
    })
}

fn scalar_type(
    contract: &Contract,
    message: &Message,
    property: &Property,
    ty: &str,
) -> Result<TokenStream, TranspileError> {
    if let Some(rust) = ProtoType::from(ty).rust_type() {
        return Ok(rust);
    }
    if contract.get_message(ty).is_some() {
        let ident = type_ident(ty, "")?;

        return Ok(quote!(#ident));
    }

    Err(TranspileError::UnresolvedType {
        message: message.name.clone(),
        property: property.name.clone(),
        ty: ty.to_string(),
    })
}

/// Message a service slot names, if any.
pub fn service_message<'a>(
    contract: &'a Contract,
    service: &Service,
    name: &str,
) -> Result<Option<&'a Message>, TranspileError> {
    if name.is_empty() {
        return Ok(None);
    }

    contract
        .get_message(name)
        .map(Some)
        .ok_or_else(|| TranspileError::UnknownMessage {
            service: service.name.clone(),
            message: name.to_string(),
        })
}

//! GraphQL resolver generation.
//!
//! Emitted only when the graphql module is present. GET operations become
//! queries and everything else a mutation. Each resolver carries the SDL
//! fragment for its contract and delegates to the contract's service trait,
//! behind the same authorization checks the controller applies.

use crate::transpile::{
    ProviderKind, TranspileContext, TranspileError, Transpiler, controller,
    naming::{self, ENTITIES, RESOLVERS, SERVICES},
};
use convert_case::{Case, Casing};
use pactum_schema::{
    node::{Contract, Message, Property, Service},
    types::{OperationKind, ProtoType},
};
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::BTreeSet;

///
/// ResolverTranspiler
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ResolverTranspiler;

impl Transpiler for ResolverTranspiler {
    fn name(&self) -> &'static str {
        "resolver"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        if !ctx.flags().graphql {
            return Ok(());
        }

        let mut modules = Vec::new();
        ctx.each_contract(
            self.name(),
            |c| !c.services.is_empty(),
            |ctx, contract| {
                let module = naming::module_name(contract, "resolver");
                let services = naming::generated_path(
                    ctx.config(),
                    SERVICES,
                    &naming::module_name(contract, "service"),
                )?;
                let entity = match ctx.entity_name(contract.name()) {
                    Some(entity) => {
                        let root = naming::generated_path(
                            ctx.config(),
                            ENTITIES,
                            &naming::module_name(contract, "entity"),
                        )?;
                        let entity = naming::parse_ident(entity)?;
                        Some(quote!(#root::#entity))
                    }
                    None => None,
                };

                let tokens = generate(contract, &services, entity.as_ref())?;
                ctx.write_source(RESOLVERS, &module, &tokens)?;

                let item = naming::type_ident(contract.name(), "Resolver")?;
                let path = naming::provider_path(ctx.config(), RESOLVERS, &module, &item);
                ctx.provide(item.to_string(), ProviderKind::Resolver, path);
                modules.push(module);

                Ok(())
            },
        );

        if modules.is_empty() {
            return Ok(());
        }

        ctx.write_mod_file(RESOLVERS, &modules)
    }
}

/// GraphQL field name of an operation, `groupsListGroups`.
#[must_use]
pub fn field_name(contract: &Contract, service: &Service) -> String {
    format!("{}_{}", contract.name(), service.name)
        .to_case(Case::Snake)
        .to_case(Case::Camel)
}

pub fn generate(
    contract: &Contract,
    services: &TokenStream,
    entity: Option<&TokenStream>,
) -> Result<TokenStream, TranspileError> {
    let ident = naming::type_ident(contract.name(), "Resolver")?;
    let service_trait = naming::type_ident(contract.name(), "Service")?;
    let sdl = sdl(contract)?;
    let with_auth = controller::needs_auth(contract);

    let mut operations = quote!();
    let mut methods = quote!();
    for service in &contract.services {
        let field = field_name(contract, service);
        let kind = OperationKind::from_method(service.method);
        operations.extend(quote!((#field, #kind),));
        methods.extend(method(contract, service, services)?);
    }

    let auth_field = with_auth.then(|| {
        quote!(auth: ::std::sync::Arc<dyn ::pactum::runtime::AuthorizationChecker + Send + Sync>,)
    });
    let auth_arg = with_auth.then(|| {
        quote!(, auth: ::std::sync::Arc<dyn ::pactum::runtime::AuthorizationChecker + Send + Sync>)
    });
    let auth_init = with_auth.then(|| quote!(auth,));
    let entity = entity.map(|path| quote!(pub type Entity = #path;));

    Ok(quote! {
        #entity

        pub struct #ident<S> {
            service: S,
            #auth_field
        }

        impl<S: #services::#service_trait> #ident<S> {
            pub const SDL: &'static str = #sdl;

            pub const OPERATIONS: &'static [(&'static str, ::pactum::schema::types::OperationKind)] =
                &[#operations];

            pub fn new(service: S #auth_arg) -> Self {
                Self {
                    service,
                    #auth_init
                }
            }

            #methods
        }
    })
}

fn method(
    contract: &Contract,
    service: &Service,
    services: &TokenStream,
) -> Result<TokenStream, TranspileError> {
    let method = naming::parse_ident(&service.function_name)?;
    let request = naming::service_message(contract, service, &service.request)?;
    let response = naming::service_message(contract, service, &service.response)?;

    let (request_arg, request_pass, validate) = match request {
        Some(message) => {
            let ty = naming::type_ident(&message.name, "")?;
            (
                quote!(, request: #services::#ty),
                quote!(, request),
                quote!(::pactum::runtime::Validate::validate(&request)?;),
            )
        }
        None => (quote!(), quote!(), quote!()),
    };
    let response_ty = match response {
        Some(message) => {
            let ty = naming::type_ident(&message.name, "")?;
            quote!(#services::#ty)
        }
        None => quote!(()),
    };
    let guard = controller::guard(contract, service);

    Ok(quote! {
        pub fn #method(
            &self,
            ctx: &::pactum::runtime::RequestContext
            #request_arg
        ) -> ::std::result::Result<#response_ty, ::pactum::runtime::HandlerError> {
            #guard
            #validate
            self.service.#method(ctx #request_pass)
        }
    })
}

// ----------------------------------------------------------------------
// SDL
// ----------------------------------------------------------------------

/// SDL fragment: input and output types for the contract's messages, then
/// `extend type Query` / `extend type Mutation` blocks.
pub fn sdl(contract: &Contract) -> Result<String, TranspileError> {
    let mut inputs = BTreeSet::new();
    let mut outputs = BTreeSet::new();
    let mut queries = Vec::new();
    let mut mutations = Vec::new();

    for service in &contract.services {
        let request = naming::service_message(contract, service, &service.request)?;
        let response = naming::service_message(contract, service, &service.response)?;

        if let Some(message) = request {
            reachable(contract, message, &mut inputs);
        }
        if let Some(message) = response {
            reachable(contract, message, &mut outputs);
        }

        let args = match request {
            Some(message) => format!("(input: {}!)", type_name(contract, &message.name, true)),
            None => String::new(),
        };
        let returns = match response {
            Some(message) => type_name(contract, &message.name, false),
            None => "Boolean".to_string(),
        };
        let line = format!("  {}{args}: {returns}", field_name(contract, service));

        match OperationKind::from_method(service.method) {
            OperationKind::Query => queries.push(line),
            OperationKind::Mutation => mutations.push(line),
        }
    }

    let mut out = Vec::new();
    for (set, input) in [(&inputs, true), (&outputs, false)] {
        // declaration order, not name order
        for message in contract.messages.iter().filter(|m| set.contains(m.name.as_str())) {
            let keyword = if input { "input" } else { "type" };
            out.push(format!("{keyword} {} {{", type_name(contract, &message.name, input)));
            if message.properties.is_empty() {
                out.push("  _empty: Boolean".to_string());
            }
            for property in &message.properties {
                let ty = property_type(contract, message, property, input)?;
                out.push(format!("  {}: {ty}", property.name));
            }
            out.push("}\n".to_string());
        }
    }
    for (root, lines) in [("Query", queries), ("Mutation", mutations)] {
        if lines.is_empty() {
            continue;
        }
        out.push(format!("extend type {root} {{"));
        out.extend(lines);
        out.push("}\n".to_string());
    }

    Ok(out.join("\n").trim_end().to_string())
}

fn type_name(contract: &Contract, message: &str, input: bool) -> String {
    let suffix = if input { "Input" } else { "" };

    format!("{}{}{suffix}", contract.name(), message.to_case(Case::Pascal))
}

// reachable
// the message and every message its properties name, transitively
fn reachable<'a>(contract: &'a Contract, message: &'a Message, seen: &mut BTreeSet<&'a str>) {
    if !seen.insert(message.name.as_str()) {
        return;
    }

    for property in &message.properties {
        let ty = property.array_type.as_deref().unwrap_or(&property.ty);
        if let Some(nested) = contract.get_message(ty) {
            reachable(contract, nested, seen);
        }
    }
}

fn property_type(
    contract: &Contract,
    message: &Message,
    property: &Property,
    input: bool,
) -> Result<String, TranspileError> {
    let unresolved = |ty: &str| TranspileError::UnresolvedType {
        message: message.name.clone(),
        property: property.name.clone(),
        ty: ty.to_string(),
    };
    let scalar = |ty: &str| -> Result<String, TranspileError> {
        let name = match ProtoType::from(ty) {
            ProtoType::Bool => "Boolean",
            ProtoType::Int32 | ProtoType::Uint32 => "Int",
            ProtoType::Int64
            | ProtoType::Uint64
            | ProtoType::Float
            | ProtoType::Double
            | ProtoType::Timestamp => "Float",
            ProtoType::Json | ProtoType::Any => "JSON",
            ProtoType::String | ProtoType::Enum | ProtoType::Date | ProtoType::Bytes => "String",
            ProtoType::Custom(_) => {
                return contract
                    .get_message(ty)
                    .map(|m| type_name(contract, &m.name, input))
                    .ok_or_else(|| unresolved(ty));
            }
        };

        Ok(name.to_string())
    };

    let required = if property.required { "!" } else { "" };
    if property.is_array() {
        let item = property.array_type.as_deref().unwrap_or_default();

        return Ok(format!("[{}!]{required}", scalar(item)?));
    }

    Ok(format!("{}{required}", scalar(&property.ty)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::types::Method;

    fn groups() -> Contract {
        Contract {
            header: pactum_schema::node::ContractHeader::new("Groups"),
            messages: vec![
                Message::new("GroupRequest")
                    .property(Property::new("name", "string").required(true))
                    .property(Property::new("owner", "Member")),
                Message::new("Member").property(Property::new("id", "int64").required(true)),
                Message::new("GroupReply").property(Property::array_of("roles", "string")),
            ],
            services: vec![
                Service::new("listGroups").response("GroupReply"),
                Service::new("createGroup")
                    .method(Method::Post)
                    .request("GroupRequest")
                    .response("GroupReply")
                    .auth(true),
                Service::new("removeGroup").method(Method::Delete),
            ],
            ..Contract::default()
        }
    }

    #[test]
    fn get_is_query_everything_else_mutation() {
        let sdl = sdl(&groups()).unwrap();

        assert!(sdl.contains("extend type Query {\n  groupsListGroups: GroupsGroupReply\n}"));
        assert!(sdl.contains(
            "extend type Mutation {\n  groupsCreateGroup(input: GroupsGroupRequestInput!): GroupsGroupReply\n  groupsRemoveGroup: Boolean\n}"
        ));
    }

    #[test]
    fn nested_request_messages_become_inputs() {
        let sdl = sdl(&groups()).unwrap();

        assert!(sdl.contains("input GroupsGroupRequestInput {\n  name: String!\n  owner: GroupsMemberInput\n}"));
        assert!(sdl.contains("input GroupsMemberInput {\n  id: Float!\n}"));
        assert!(sdl.contains("type GroupsGroupReply {\n  roles: [String!]\n}"));
        assert!(!sdl.contains("type GroupsMember {"));
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let sdl = sdl(&groups()).unwrap();

        assert!(sdl.starts_with("input "));
        assert!(sdl.ends_with('}'));
        assert!(sdl.contains("}\n\ntype GroupsGroupReply {"));
        assert!(!sdl.contains("\n\n\n"));
    }

    #[test]
    fn resolver_wraps_auth_and_lists_operations() {
        let code = generate(&groups(), &quote!(crate::generated::services::groups_service), None)
            .unwrap()
            .to_string();

        assert_eq!(code.matches("self . auth . check").count(), 1);
        assert!(code.contains("(\"groupsListGroups\" , :: pactum :: schema :: types :: OperationKind :: Query)"));
        assert!(code.contains("(\"groupsRemoveGroup\" , :: pactum :: schema :: types :: OperationKind :: Mutation)"));
        assert!(!code.contains("pub type Entity"));
    }
}

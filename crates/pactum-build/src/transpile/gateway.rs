//! RPC gateway generation.
//!
//! Emitted only when the rpc module is present. A gateway dispatches by
//! operation name onto the contract's generated controller, so guards,
//! validation, and caching stay in one place.

use crate::transpile::{
    ProviderKind, TranspileContext, TranspileError, Transpiler, controller,
    naming::{self, CONTROLLERS, GATEWAYS, SERVICES},
};
use pactum_schema::node::Contract;
use proc_macro2::TokenStream;
use quote::quote;

///
/// GatewayTranspiler
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GatewayTranspiler;

impl Transpiler for GatewayTranspiler {
    fn name(&self) -> &'static str {
        "gateway"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        if !ctx.flags().rpc {
            return Ok(());
        }

        let mut modules = Vec::new();
        ctx.each_contract(self.name(), Contract::wants_controller, |ctx, contract| {
            let module = naming::module_name(contract, "gateway");
            let services = naming::generated_path(
                ctx.config(),
                SERVICES,
                &naming::module_name(contract, "service"),
            )?;
            let controllers = naming::generated_path(
                ctx.config(),
                CONTROLLERS,
                &naming::module_name(contract, "controller"),
            )?;
            let tokens = generate(contract, &services, &controllers)?;
            ctx.write_source(GATEWAYS, &module, &tokens)?;

            let item = naming::type_ident(contract.name(), "Gateway")?;
            let path = naming::provider_path(ctx.config(), GATEWAYS, &module, &item);
            ctx.provide(item.to_string(), ProviderKind::Gateway, path);
            modules.push(module);

            Ok(())
        });

        if modules.is_empty() {
            return Ok(());
        }

        ctx.write_mod_file(GATEWAYS, &modules)
    }
}

pub fn generate(
    contract: &Contract,
    services: &TokenStream,
    controllers: &TokenStream,
) -> Result<TokenStream, TranspileError> {
    let ident = naming::type_ident(contract.name(), "Gateway")?;
    let controller = naming::type_ident(contract.name(), "Controller")?;
    let service_trait = naming::type_ident(contract.name(), "Service")?;

    let mut operations = Vec::new();
    let mut arms = quote!();
    for service in &contract.services {
        let operation = &service.name;
        let call = controller::call_with_payload(contract, service, &quote!(self.controller))?;

        arms.extend(quote! {
            #operation => { #call }
        });
        operations.push(operation);
    }

    Ok(quote! {
        pub struct #ident<S> {
            controller: ::std::sync::Arc<#controllers::#controller<S>>,
        }

        impl<S: #services::#service_trait> #ident<S> {
            pub const OPERATIONS: &'static [&'static str] = &[#(#operations),*];

            pub const fn new(controller: ::std::sync::Arc<#controllers::#controller<S>>) -> Self {
                Self { controller }
            }

            /// Dispatch a JSON payload by operation name.
            pub fn dispatch(
                &self,
                ctx: &::pactum::runtime::RequestContext,
                operation: &str,
                payload: ::std::option::Option<&[u8]>,
            ) -> ::std::result::Result<
                ::std::option::Option<::std::vec::Vec<u8>>,
                ::pactum::runtime::HandlerError,
            > {
                let _ = &payload;
                match operation {
                    #arms
                    _ => ::std::result::Result::Err(
                        ::pactum::runtime::HandlerError::UnknownOperation(operation.to_string())
                    ),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::node::{ContractHeader, Message, Service};

    #[test]
    fn dispatches_each_operation_through_the_controller() {
        let contract = Contract {
            header: ContractHeader {
                generate_controller: true,
                ..ContractHeader::new("Groups")
            },
            messages: vec![Message::new("GroupReply")],
            services: vec![
                Service::new("getGroup").response("GroupReply"),
                Service::new("ping"),
            ],
            ..Contract::default()
        };

        let code = generate(
            &contract,
            &quote!(crate::generated::services::groups_service),
            &quote!(crate::generated::controllers::groups_controller),
        )
        .unwrap()
        .to_string();

        assert!(code.contains("OPERATIONS : & 'static [& 'static str] = & [\"getGroup\" , \"ping\"]"));
        assert!(code.contains("self . controller . get_group (ctx) ?"));
        assert!(code.contains("self . controller . ping (ctx) ? ;"));
    }
}

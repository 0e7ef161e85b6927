//! Controller generation.
//!
//! One `<Name>Controller<S>` per contract that asks for a controller or
//! boilerplate. Each service becomes a handler bound to its method and route
//! with optional auth guards and, when the cache module is present,
//! cache reads before GETs and invalidation after writes.

use crate::transpile::{
    ProviderKind, TranspileContext, TranspileError, Transpiler,
    naming::{self, CONTROLLERS, SERVICES},
};
use pactum_schema::node::{CacheOptions, Contract, Service};
use proc_macro2::TokenStream;
use quote::quote;

///
/// ControllerTranspiler
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ControllerTranspiler;

impl Transpiler for ControllerTranspiler {
    fn name(&self) -> &'static str {
        "controller"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        let mut modules = Vec::new();
        let cache_enabled = ctx.flags().cache;

        ctx.each_contract(self.name(), Contract::wants_controller, |ctx, contract| {
            let module = naming::module_name(contract, "controller");
            let services = naming::generated_path(
                ctx.config(),
                SERVICES,
                &naming::module_name(contract, "service"),
            )?;
            let tokens = generate(contract, &services, cache_enabled)?;
            ctx.write_source(CONTROLLERS, &module, &tokens)?;

            let item = naming::type_ident(contract.name(), "Controller")?;
            let path = naming::provider_path(ctx.config(), CONTROLLERS, &module, &item);
            ctx.provide(item.to_string(), ProviderKind::Controller, path);
            modules.push(module);

            Ok(())
        });

        if modules.is_empty() {
            return Ok(());
        }

        ctx.write_mod_file(CONTROLLERS, &modules)
    }
}

/// Whether any operation on the contract needs the authorization checker.
#[must_use]
pub fn needs_auth(contract: &Contract) -> bool {
    contract
        .services
        .iter()
        .any(|service| guarded(contract, service))
}

fn guarded(contract: &Contract, service: &Service) -> bool {
    contract.header.auth || contract.header.root_only || service.auth || service.root_only
}

/// `self.auth.check(..)?;` for a guarded operation, empty otherwise.
#[must_use]
pub fn guard(contract: &Contract, service: &Service) -> TokenStream {
    if !guarded(contract, service) {
        return quote!();
    }

    let operation = naming::operation_name(contract, service);
    let root_only = contract.header.root_only || service.root_only;

    quote! {
        self.auth.check(
            ctx,
            &::pactum::runtime::Access {
                operation: #operation,
                root_only: #root_only,
            },
        )?;
    }
}

/// Cache settings for a service: its own, else the contract's.
#[must_use]
pub fn cache_options<'a>(contract: &'a Contract, service: &'a Service) -> Option<&'a CacheOptions> {
    service
        .cache
        .as_ref()
        .or(contract.header.options.cache.as_ref())
}

/// Tokens for one contract's controller. `services` is the path of the
/// contract's generated service module.
pub fn generate(
    contract: &Contract,
    services: &TokenStream,
    cache_enabled: bool,
) -> Result<TokenStream, TranspileError> {
    let ident = naming::type_ident(contract.name(), "Controller")?;
    let service_trait = naming::type_ident(contract.name(), "Service")?;
    let with_auth = needs_auth(contract);
    let with_cache = cache_enabled
        && contract
            .services
            .iter()
            .any(|service| cache_options(contract, service).is_some());

    let mut routes = quote!();
    let mut handlers = quote!();
    let mut arms = quote!();
    for service in &contract.services {
        let method = service.method;
        let route = naming::route_path(contract, service);
        let operation = &service.name;
        routes.extend(quote! {
            ::pactum::runtime::Route {
                method: #method,
                path: #route,
                operation: #operation,
            },
        });

        handlers.extend(handler(contract, service, services, with_cache)?);
        arms.extend(dispatch_arm(contract, service)?);
    }

    // ------------------------------------------------------------------
    // Struct and constructor shapes
    // ------------------------------------------------------------------

    let auth_field = with_auth.then(|| {
        quote!(auth: ::std::sync::Arc<dyn ::pactum::runtime::AuthorizationChecker + Send + Sync>,)
    });
    let auth_arg = with_auth.then(|| {
        quote!(, auth: ::std::sync::Arc<dyn ::pactum::runtime::AuthorizationChecker + Send + Sync>)
    });
    let auth_init = with_auth.then(|| quote!(auth,));

    let cache_field = with_cache.then(|| {
        quote!(cache: ::std::option::Option<::std::sync::Arc<dyn ::pactum::runtime::Cache + Send + Sync>>,)
    });
    let cache_init = with_cache.then(|| quote!(cache: ::std::option::Option::None,));
    let cache_setter = with_cache.then(|| {
        quote! {
            #[must_use]
            pub fn with_cache(
                mut self,
                cache: ::std::sync::Arc<dyn ::pactum::runtime::Cache + Send + Sync>,
            ) -> Self {
                self.cache = ::std::option::Option::Some(cache);
                self
            }
        }
    });

    Ok(quote! {
        pub struct #ident<S> {
            service: S,
            #auth_field
            #cache_field
        }

        impl<S: #services::#service_trait> #ident<S> {
            pub const ROUTES: &'static [::pactum::runtime::Route] = &[#routes];

            pub fn new(service: S #auth_arg) -> Self {
                Self {
                    service,
                    #auth_init
                    #cache_init
                }
            }

            #cache_setter

            pub const fn service(&self) -> &S {
                &self.service
            }

            #handlers

            /// Dispatch a JSON payload by method and concrete request path.
            /// Params captured from the matched route are placed on the
            /// context handed to the handler.
            pub fn handle(
                &self,
                ctx: &::pactum::runtime::RequestContext,
                method: ::pactum::schema::types::Method,
                path: &str,
                payload: ::std::option::Option<&[u8]>,
            ) -> ::std::result::Result<
                ::std::option::Option<::std::vec::Vec<u8>>,
                ::pactum::runtime::HandlerError,
            > {
                let _ = &payload;
                let ::std::option::Option::Some((matched, params)) =
                    ::pactum::runtime::Route::resolve(Self::ROUTES, method, path)
                else {
                    return ::std::result::Result::Err(
                        ::pactum::runtime::HandlerError::UnknownOperation(
                            ::std::format!("{method} {path}")
                        )
                    );
                };
                let ctx = &ctx.with_params(params);

                match matched.operation {
                    #arms
                    operation => ::std::result::Result::Err(
                        ::pactum::runtime::HandlerError::UnknownOperation(
                            ::std::string::String::from(operation)
                        )
                    ),
                }
            }
        }
    })
}

// handler
fn handler(
    contract: &Contract,
    service: &Service,
    services: &TokenStream,
    with_cache: bool,
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

    let guard = guard(contract, service);
    let cache = if with_cache {
        cache_options(contract, service)
    } else {
        None
    };

    let body = match cache {
        // cache-read-before, cache-write-after
        Some(options) if service.method.is_read() && response.is_some() => {
            let prefix = &options.key;
            let operation = &service.name;
            let ttl = options.ttl;
            let key_request = if request.is_some() {
                quote!(::std::option::Option::Some(&request))
            } else {
                quote!(::std::option::Option::<&()>::None)
            };

            quote! {
                let key = ::pactum::runtime::cache_key(#prefix, #operation, #key_request)?;
                if let ::std::option::Option::Some(cache) = &self.cache
                    && let ::std::option::Option::Some(hit) =
                        ::pactum::runtime::cache_read::<#response_ty>(cache.as_ref(), &key)
                {
                    return ::std::result::Result::Ok(hit);
                }

                let response = self.service.#method(ctx #request_pass)?;
                if let ::std::option::Option::Some(cache) = &self.cache {
                    ::pactum::runtime::cache_write(cache.as_ref(), &key, &response, #ttl)?;
                }

                ::std::result::Result::Ok(response)
            }
        }

        // invalidate-after for writes
        Some(options) if !service.method.is_read() => {
            let prefix = &options.key;

            quote! {
                let response = self.service.#method(ctx #request_pass)?;
                if let ::std::option::Option::Some(cache) = &self.cache {
                    cache.invalidate_prefix(#prefix);
                }

                ::std::result::Result::Ok(response)
            }
        }

        _ => quote!(self.service.#method(ctx #request_pass)),
    };

    Ok(quote! {
        pub fn #method(
            &self,
            ctx: &::pactum::runtime::RequestContext
            #request_arg
        ) -> ::std::result::Result<#response_ty, ::pactum::runtime::HandlerError> {
            #guard
            #validate
            #body
        }
    })
}

// dispatch_arm
fn dispatch_arm(contract: &Contract, service: &Service) -> Result<TokenStream, TranspileError> {
    let operation = &service.name;
    let call = call_with_payload(contract, service, &quote!(self))?;

    Ok(quote! {
        #operation => { #call }
    })
}

/// Decode `payload`, call the handler on `receiver`, encode the response.
/// Shared with the gateway, which dispatches by operation name instead.
pub fn call_with_payload(
    contract: &Contract,
    service: &Service,
    receiver: &TokenStream,
) -> Result<TokenStream, TranspileError> {
    let method = naming::parse_ident(&service.function_name)?;
    let has_request = naming::service_message(contract, service, &service.request)?.is_some();
    let has_response = naming::service_message(contract, service, &service.response)?.is_some();

    let decode = has_request.then(|| quote!(let request = ::pactum::runtime::decode(payload)?;));
    let args = if has_request {
        quote!(ctx, request)
    } else {
        quote!(ctx)
    };

    let (call, reply) = if has_response {
        (
            quote!(let response = #receiver.#method(#args)?;),
            quote!(::pactum::runtime::encode(&response).map(::std::option::Option::Some)),
        )
    } else {
        (
            quote!(#receiver.#method(#args)?;),
            quote!(::std::result::Result::Ok(::std::option::Option::None)),
        )
    };

    Ok(quote! {
        #decode
        #call
        #reply
    })
}

//! Contract model and service trait generation.
//!
//! Every active contract gets `services/<stem>_service.rs` holding one struct
//! per message, the contract model struct, and the `<Name>Service` trait the
//! application implements. Controllers, gateways, and resolvers all call
//! through that trait.

use crate::transpile::{
    ProviderKind, TranspileContext, TranspileError, Transpiler,
    naming::{self, SERVICES},
};
use pactum_schema::{
    node::{Contract, Field, Message, Validation, ValidationRule},
    types::ProtoType,
};
use proc_macro2::TokenStream;
use quote::quote;

///
/// ServiceTranspiler
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceTranspiler;

impl Transpiler for ServiceTranspiler {
    fn name(&self) -> &'static str {
        "service"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        let mut modules = Vec::new();

        ctx.each_contract(self.name(), |_| true, |ctx, contract| {
            let module = naming::module_name(contract, "service");
            let tokens = generate(contract)?;
            ctx.write_source(SERVICES, &module, &tokens)?;

            let item = naming::type_ident(contract.name(), "Service")?;
            let path = naming::provider_path(ctx.config(), SERVICES, &module, &item);
            ctx.provide(item.to_string(), ProviderKind::Service, path);
            modules.push(module);

            Ok(())
        });

        if modules.is_empty() {
            return Ok(());
        }

        ctx.write_mod_file(SERVICES, &modules)
    }
}

/// Tokens for one contract's service file.
pub fn generate(contract: &Contract) -> Result<TokenStream, TranspileError> {
    let mut messages = quote!();
    for message in &contract.messages {
        messages.extend(message_struct(contract, message)?);
    }

    let model = model_struct(contract)?;
    let service = service_trait(contract)?;

    Ok(quote! {
        #messages
        #model
        #service
    })
}

// message_struct
fn message_struct(contract: &Contract, message: &Message) -> Result<TokenStream, TranspileError> {
    let ident = naming::type_ident(&message.name, "")?;
    let derive = naming::serde_derive();

    let mut fields = quote!();
    let mut checks = quote!();
    for property in &message.properties {
        let field_ident = naming::snake_ident(&property.name)?;
        let ty = naming::property_type(contract, message, property)?;
        let rename = naming::serde_rename(&property.name, &field_ident);
        let optional = if property.is_array() {
            quote!(#[serde(default)])
        } else if property.required {
            quote!()
        } else {
            quote!(#[serde(default, skip_serializing_if = "::std::option::Option::is_none")])
        };

        fields.extend(quote! {
            #rename
            #optional
            pub #field_ident: #ty,
        });

        // a scalar property mirroring a scalar contract field inherits its rules
        if let Some(field) = contract.get_field(&property.name)
            && !property.is_array()
            && !field.proto_repeated
            && ProtoType::from(property.ty.as_str()) == field.proto_type
        {
            let shape = Shape {
                ty: &field.proto_type,
                repeated: false,
                nullable: !property.required,
            };
            checks.extend(validation_calls(
                &field.validations,
                &property.name,
                &quote!(self.#field_ident),
                &shape,
            )?);
        }
    }

    let validate = validate_impl(&ident, &checks);

    Ok(quote! {
        #derive
        pub struct #ident {
            #fields
        }

        #validate
    })
}

// model_struct
fn model_struct(contract: &Contract) -> Result<TokenStream, TranspileError> {
    let name = contract.name();
    let ident = naming::type_ident(name, "Model")?;
    let derive = naming::serde_derive();

    let mut fields = quote!();
    let mut checks = quote!();
    let mut transforms = quote!();
    let mut plains = quote!();
    for field in &contract.fields {
        let key = &field.property_key;
        let field_ident = naming::snake_ident(key)?;
        let ty = naming::field_type(field)?;
        let rename = naming::serde_rename(key, &field_ident);
        let optional = field_attrs(field);

        fields.extend(quote! {
            #rename
            #optional
            pub #field_ident: #ty,
        });
        checks.extend(validation_calls(
            &field.validations,
            key,
            &quote!(self.#field_ident),
            &Shape::of(field),
        )?);

        if let Some(hook) = &field.transform {
            let hook = hook_path(hook)?;
            transforms.extend(quote! {
                self.#field_ident = #hook(self.#field_ident);
            });
        }
        if let Some(hook) = &field.to_plain {
            let hook = hook_path(hook)?;
            plains.extend(quote! {
                object.insert(::std::string::String::from(#key), #hook(&self.#field_ident));
            });
        }
    }

    let validate = validate_impl(&ident, &checks);

    Ok(quote! {
        #derive
        pub struct #ident {
            #fields
        }

        #validate

        impl #ident {
            pub const CONTRACT: &'static str = #name;

            /// Apply input transforms.
            #[allow(unused_mut)]
            #[must_use]
            pub fn transformed(mut self) -> Self {
                #transforms
                self
            }

            /// Plain JSON output with output hooks applied.
            #[allow(unused_variables)]
            pub fn to_plain(
                &self,
            ) -> ::std::result::Result<
                ::pactum::__reexports::serde_json::Value,
                ::pactum::__reexports::serde_json::Error,
            > {
                let mut plain = ::pactum::__reexports::serde_json::to_value(self)?;
                if let ::std::option::Option::Some(object) = plain.as_object_mut() {
                    #plains
                }

                ::std::result::Result::Ok(plain)
            }
        }
    })
}

// service_trait
fn service_trait(contract: &Contract) -> Result<TokenStream, TranspileError> {
    let ident = naming::type_ident(contract.name(), "Service")?;
    let boilerplate = !contract.header.module_contract;

    let mut methods = quote!();
    for service in &contract.services {
        let method = naming::parse_ident(&service.function_name)?;
        let request = naming::service_message(contract, service, &service.request)?;
        let response = naming::service_message(contract, service, &service.response)?;

        let request_arg = match request {
            Some(message) => {
                let ty = naming::type_ident(&message.name, "")?;
                quote!(, request: #ty)
            }
            None => quote!(),
        };
        let response_ty = match response {
            Some(message) => {
                let ty = naming::type_ident(&message.name, "")?;
                quote!(#ty)
            }
            None => quote!(()),
        };

        let signature = quote! {
            fn #method(
                &self,
                ctx: &::pactum::runtime::RequestContext
                #request_arg
            ) -> ::std::result::Result<#response_ty, ::pactum::runtime::HandlerError>
        };

        if boilerplate && service.create_boilerplate {
            let operation = naming::operation_name(contract, service);
            let unused = if request.is_some() {
                quote!(let _ = (ctx, request);)
            } else {
                quote!(let _ = ctx;)
            };

            methods.extend(quote! {
                #signature {
                    #unused
                    ::std::result::Result::Err(
                        ::pactum::runtime::HandlerError::NotImplemented(#operation)
                    )
                }
            });
        } else {
            methods.extend(quote!(#signature;));
        }
    }

    Ok(quote! {
        pub trait #ident: Send + Sync {
            #methods
        }
    })
}

fn field_attrs(field: &Field) -> TokenStream {
    if field.proto_repeated && !field.nullable {
        quote!(#[serde(default)])
    } else if field.nullable {
        quote!(#[serde(default, skip_serializing_if = "::std::option::Option::is_none")])
    } else {
        quote!()
    }
}

fn hook_path(hook: &str) -> Result<syn::Path, TranspileError> {
    syn::parse_str(hook).map_err(|_| TranspileError::InvalidPath {
        value: hook.to_string(),
    })
}

fn validate_impl(ident: &proc_macro2::Ident, checks: &TokenStream) -> TokenStream {
    quote! {
        impl ::pactum::runtime::Validate for #ident {
            #[allow(unused_mut)]
            fn validate(
                &self,
            ) -> ::std::result::Result<(), ::pactum::runtime::ValidationErrors> {
                let mut errors = ::pactum::runtime::ValidationErrors::new();
                #checks
                errors.result()
            }
        }
    }
}

///
/// Shape
///
/// How a validated value is laid out in the generated struct.
///

#[derive(Clone, Copy, Debug)]
pub struct Shape<'a> {
    pub ty: &'a ProtoType,
    pub repeated: bool,
    pub nullable: bool,
}

impl<'a> Shape<'a> {
    #[must_use]
    pub const fn of(field: &'a Field) -> Self {
        Self {
            ty: &field.proto_type,
            repeated: field.proto_repeated,
            nullable: field.nullable,
        }
    }
}

/// One runtime validation call per rule, against `value`. Element rules on a
/// repeated value loop over its items; absent optional lists are skipped.
pub fn validation_calls(
    rules: &[Validation],
    key: &str,
    value: &TokenStream,
    shape: &Shape<'_>,
) -> Result<TokenStream, TranspileError> {
    let mut tokens = quote!();

    for validation in rules {
        if !validation.rule.applies_to(shape.ty, shape.repeated) {
            return Err(TranspileError::InvalidValidation {
                field: key.to_string(),
                rule: format!("{:?}", validation.rule),
                ty: shape.ty.to_string(),
            });
        }

        let message = match &validation.message {
            Some(message) => quote!(::std::option::Option::Some(#message)),
            None => quote!(::std::option::Option::None),
        };

        let per_element = shape.repeated && validation.rule.per_element();
        let target = if per_element { quote!(item) } else { quote!(&#value) };
        let call = match &validation.rule {
            ValidationRule::NotEmpty => quote!(not_empty(&mut errors, #key, #target, #message)),
            ValidationRule::MinLength(n) => {
                quote!(min_length(&mut errors, #key, #target, #n, #message))
            }
            ValidationRule::MaxLength(n) => {
                quote!(max_length(&mut errors, #key, #target, #n, #message))
            }
            ValidationRule::Min(x) => quote!(min(&mut errors, #key, #target, #x, #message)),
            ValidationRule::Max(x) => quote!(max(&mut errors, #key, #target, #x, #message)),
            ValidationRule::OneOf(choices) => {
                quote!(one_of(&mut errors, #key, #target, &[#(#choices),*], #message))
            }
        };
        let call = quote!(::pactum::runtime::validate::#call;);

        if per_element {
            let items = if shape.nullable {
                quote!(#value.iter().flatten())
            } else {
                quote!(#value.iter())
            };
            tokens.extend(quote! {
                for item in #items {
                    #call
                }
            });
        } else {
            tokens.extend(call);
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::node::{ContractHeader, Property, Service};

    fn groups() -> Contract {
        Contract {
            header: ContractHeader::new("Groups"),
            fields: vec![
                Field::new("name", ProtoType::String)
                    .validation(ValidationRule::NotEmpty.into())
                    .transform("crate::hooks::trim"),
                Field::new("roles", ProtoType::String).repeated(true),
            ],
            messages: vec![
                Message::new("GroupRequest")
                    .property(Property::new("name", "string").required(true)),
                Message::new("GroupReply").property(Property::array_of("roles", "string")),
            ],
            services: vec![
                Service::new("createGroup")
                    .request("GroupRequest")
                    .response("GroupReply")
                    .create_boilerplate(true),
                Service::new("ping").create_boilerplate(false),
            ],
            ..Contract::default()
        }
    }

    #[test]
    fn generates_messages_model_and_trait() {
        let code = generate(&groups()).unwrap().to_string();

        assert!(code.contains("pub struct GroupRequest"));
        assert!(code.contains("pub struct GroupsModel"));
        assert!(code.contains("pub trait GroupsService"));
        assert!(code.contains("fn create_group"));
        assert!(code.contains("NotImplemented (\"Groups.createGroup\")"));
        assert!(code.contains("crate :: hooks :: trim (self . name)"));
    }

    #[test]
    fn message_inherits_field_rules() {
        let code = generate(&groups()).unwrap().to_string();

        // once for the model, once for the request message
        assert_eq!(code.matches("validate :: not_empty").count(), 2);
    }

    #[test]
    fn element_rules_loop_over_repeated_fields() {
        let mut contract = groups();
        contract.fields[1] = Field::new("roles", ProtoType::String)
            .repeated(true)
            .validation(ValidationRule::MaxLength(3).into())
            .validation(ValidationRule::OneOf(vec!["admin".into(), "user".into()]).into());
        contract.fields.push(
            Field::new("scores", ProtoType::Int32)
                .repeated(true)
                .nullable(true)
                .validation(ValidationRule::Min(0.0).into()),
        );

        let code = generate(&contract).unwrap().to_string();

        // length rules measure the whole list
        assert!(code.contains("max_length (& mut errors , \"roles\" , & self . roles , 3usize"));
        assert!(code.contains(
            "for item in self . roles . iter () { :: pactum :: runtime :: validate :: one_of (& mut errors , \"roles\" , item ,"
        ));
        assert!(code.contains(
            "for item in self . scores . iter () . flatten () { :: pactum :: runtime :: validate :: min (& mut errors , \"scores\" , item , 0f64"
        ));
    }

    #[test]
    fn mismatched_rule_is_an_error() {
        let mut contract = groups();
        contract.fields[1] = Field::new("roles", ProtoType::Int32)
            .repeated(true)
            .validation(ValidationRule::OneOf(vec!["a".into()]).into());

        assert!(matches!(
            generate(&contract),
            Err(TranspileError::InvalidValidation { .. })
        ));
    }

    #[test]
    fn module_contracts_get_no_boilerplate() {
        let mut contract = groups();
        contract.header.module_contract = true;

        let code = generate(&contract).unwrap().to_string();
        assert!(!code.contains("NotImplemented"));
    }

    #[test]
    fn bad_hook_path_is_an_error() {
        let mut contract = groups();
        contract.fields[0].transform = Some("not a path".to_string());

        assert!(matches!(
            generate(&contract),
            Err(TranspileError::InvalidPath { .. })
        ));
    }
}

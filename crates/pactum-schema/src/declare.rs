//! Contract declaration layer.
//!
//! A [`ContractBuilder`] collects a contract's header and ordered lists, checks
//! their shape, and registers them. Shape problems fail the declaration
//! immediately, naming the contract.

use crate::{
    MAX_CONTRACT_NAME_LEN, MAX_FIELD_NAME_LEN, MAX_INDEX_FIELDS,
    node::{ContractHeader, ContractOptions, Field, Index, Message, Service},
    registry::{Metadata, MetadataRegistry, RegisterMode, Target},
};
use convert_case::{Case, Casing};
use thiserror::Error as ThisError;

///
/// DeclareError
///

#[derive(Debug, ThisError, Eq, PartialEq)]
pub enum DeclareError {
    #[error("contract '{contract}' is already declared at '{existing}'")]
    DuplicateContract { contract: String, existing: String },

    #[error("contract name '{contract}' is invalid: {reason}")]
    InvalidName { contract: String, reason: String },

    #[error("contract '{contract}': {option} must be a type path, got '{value}'")]
    InvalidViewReference {
        contract: String,
        option: &'static str,
        value: String,
    },

    #[error("contract '{contract}', field '{field}': {reason}")]
    InvalidField {
        contract: String,
        field: String,
        reason: String,
    },

    #[error("contract '{contract}', service '{service}': {reason}")]
    InvalidService {
        contract: String,
        service: String,
        reason: String,
    },

    #[error("contract '{contract}', index '{index}': {reason}")]
    InvalidIndex {
        contract: String,
        index: String,
        reason: String,
    },

    #[error("contract '{contract}' extends unknown contract '{parent}'")]
    UnknownParent { contract: String, parent: String },
}

///
/// ContractBuilder
///

#[derive(Clone, Debug, Default)]
#[must_use]
pub struct ContractBuilder {
    header: ContractHeader,
    extends: Option<String>,
    fields: Vec<Field>,
    messages: Vec<Message>,
    services: Vec<Service>,
    indexes: Vec<Index>,
    mode: RegisterMode,
}

impl ContractBuilder {
    pub fn new(controller_name: impl Into<String>) -> Self {
        Self {
            header: ContractHeader::new(controller_name),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.header.namespace = namespace.into();
        self
    }

    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.header.sub_path = sub_path.into();
        self
    }

    pub fn proto(mut self, package: impl Into<String>, path: impl Into<String>) -> Self {
        self.header.proto_package = package.into();
        self.header.proto_path = path.into();
        self
    }

    pub const fn generate_controller(mut self, generate: bool) -> Self {
        self.header.generate_controller = generate;
        self
    }

    pub const fn generate_entities(mut self, generate: bool) -> Self {
        self.header.generate_entities = generate;
        self
    }

    pub const fn generate_boilerplates(mut self, generate: bool) -> Self {
        self.header.generate_boilerplates = generate;
        self
    }

    pub const fn auth(mut self, auth: bool) -> Self {
        self.header.auth = auth;
        self
    }

    pub const fn root_only(mut self, root_only: bool) -> Self {
        self.header.root_only = root_only;
        self
    }

    pub const fn is_public(mut self, is_public: bool) -> Self {
        self.header.is_public = is_public;
        self
    }

    pub const fn module_contract(mut self, module_contract: bool) -> Self {
        self.header.module_contract = module_contract;
        self
    }

    pub fn options(mut self, options: ContractOptions) -> Self {
        self.header.options = options;
        self
    }

    /// Inherit the lists of an already declared contract. Own declarations
    /// of the same key merge into (or override) the inherited ones.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub const fn override_existing(mut self, override_existing: bool) -> Self {
        self.mode = RegisterMode::from_override(override_existing);
        self
    }

    /// Validate and register the contract, returning its registry target.
    pub fn declare(self, registry: &mut MetadataRegistry) -> Result<Target, DeclareError> {
        let name = self.header.controller_name.clone();

        if let Some(existing) = registry.contract_path(&name) {
            return Err(DeclareError::DuplicateContract {
                contract: name,
                existing: existing.to_string(),
            });
        }
        self.check()?;

        let parent = match &self.extends {
            Some(parent) => Some(registry.contract(parent).ok_or_else(|| {
                DeclareError::UnknownParent {
                    contract: name.clone(),
                    parent: parent.clone(),
                }
            })?),
            None => None,
        };

        let target = Target::contract(self.header.path());
        registry.register(&target, Metadata::Contract(self.header), RegisterMode::Merge);

        // inherited nodes first so declaration order reads parent-then-child
        if let Some(parent) = parent {
            for field in parent.fields {
                registry.register(&target, Metadata::Field(field), RegisterMode::Merge);
            }
            for message in parent.messages {
                registry.register(&target, Metadata::Message(message), RegisterMode::Merge);
            }
            for index in parent.indexes {
                registry.register(&target, Metadata::Index(index), RegisterMode::Merge);
            }
            for service in parent.services {
                let member = Target::member(target.path.clone(), service.function_name.clone());
                registry.register(&member, Metadata::Service(service), RegisterMode::Merge);
            }
        }

        for field in self.fields {
            registry.register(&target, Metadata::Field(field), self.mode);
        }
        for message in self.messages {
            registry.register(&target, Metadata::Message(message), self.mode);
        }
        for index in self.indexes {
            registry.register(&target, Metadata::Index(index), self.mode);
        }
        for service in self.services {
            let member = Target::member(target.path.clone(), service.function_name.clone());
            registry.register(&member, Metadata::Service(service), self.mode);
        }

        tracing::debug!(contract = %name, target = %target, "contract declared");

        Ok(target)
    }

    // check
    // shape checks that need nothing beyond this declaration
    fn check(&self) -> Result<(), DeclareError> {
        let contract = &self.header.controller_name;

        validate_contract_name(contract).map_err(|reason| DeclareError::InvalidName {
            contract: contract.clone(),
            reason,
        })?;

        let options = &self.header.options;
        for (option, value) in [
            ("viewForm", &options.view_form),
            ("viewPage", &options.view_page),
        ] {
            if let Some(value) = value
                && !is_type_path(value)
            {
                return Err(DeclareError::InvalidViewReference {
                    contract: contract.clone(),
                    option,
                    value: value.clone(),
                });
            }
        }

        for field in &self.fields {
            check_field(field).map_err(|reason| DeclareError::InvalidField {
                contract: contract.clone(),
                field: field.property_key.clone(),
                reason,
            })?;
        }

        for service in &self.services {
            self.check_service(service)
                .map_err(|reason| DeclareError::InvalidService {
                    contract: contract.clone(),
                    service: service.name.clone(),
                    reason,
                })?;
        }

        for index in &self.indexes {
            check_index(index).map_err(|reason| DeclareError::InvalidIndex {
                contract: contract.clone(),
                index: index.name.clone(),
                reason,
            })?;
        }

        Ok(())
    }

    fn check_service(&self, service: &Service) -> Result<(), String> {
        validate_ident(&service.function_name)?;

        if !service.path.is_empty() && !service.path.starts_with('/') {
            return Err(format!("path '{}' must start with '/'", service.path));
        }

        // inherited messages are only known at declare time, so an unknown
        // name is tolerated when a parent is declared
        for (slot, message) in [("request", &service.request), ("response", &service.response)] {
            if message.is_empty() || self.extends.is_some() {
                continue;
            }
            if !self.messages.iter().any(|m| m.name == *message) {
                return Err(format!("{slot} message '{message}' is not declared"));
            }
        }

        Ok(())
    }
}

/// Contract names are non-empty ASCII PascalCase identifiers.
pub(crate) fn validate_contract_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.len() > MAX_CONTRACT_NAME_LEN {
        return Err(format!("exceeds max length {MAX_CONTRACT_NAME_LEN}"));
    }
    if !name.is_ascii() {
        return Err("must be ASCII".to_string());
    }
    if name.to_case(Case::Pascal) != name {
        return Err("must be PascalCase".to_string());
    }
    validate_ident(name)
}

/// Identifiers must be usable as Rust identifiers once snake_cased.
pub(crate) fn validate_ident(ident: &str) -> Result<(), String> {
    if ident.is_empty() {
        return Err("ident is empty".to_string());
    }

    let snake = ident.to_case(Case::Snake);
    if syn::parse_str::<syn::Ident>(&snake).is_err() {
        return Err(format!("'{ident}' is not a valid identifier"));
    }

    Ok(())
}

/// Hooks and view references must name a type or function path.
pub(crate) fn is_type_path(value: &str) -> bool {
    !value.trim().is_empty() && syn::parse_str::<syn::Path>(value).is_ok()
}

fn check_field(field: &Field) -> Result<(), String> {
    validate_ident(&field.property_key)?;

    if field.property_key.len() > MAX_FIELD_NAME_LEN {
        return Err(format!("name exceeds max length {MAX_FIELD_NAME_LEN}"));
    }

    for (hook, value) in [("transform", &field.transform), ("toPlain", &field.to_plain)] {
        if let Some(value) = value
            && !is_type_path(value)
        {
            return Err(format!("{hook} must be a function path, got '{value}'"));
        }
    }

    for validation in &field.validations {
        if !validation
            .rule
            .applies_to(&field.proto_type, field.proto_repeated)
            && !field.proto_type.is_custom()
        {
            let shape = if field.proto_repeated { "repeated " } else { "" };
            return Err(format!(
                "validation {:?} does not apply to {shape}type '{}'",
                validation.rule, field.proto_type
            ));
        }
    }

    if let Some(link) = &field.link
        && link.contract.trim().is_empty()
    {
        return Err("link must name a contract".to_string());
    }

    Ok(())
}

fn check_index(index: &Index) -> Result<(), String> {
    validate_ident(&index.name)?;

    if index.fields.is_empty() {
        return Err("index has no fields".to_string());
    }
    if index.fields.len() > MAX_INDEX_FIELDS {
        return Err(format!("index exceeds {MAX_INDEX_FIELDS} fields"));
    }

    Ok(())
}

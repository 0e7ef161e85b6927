use crate::node::{ContractOptions, Field, Index, Message, Service};
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::ops::Not;

///
/// ContractHeader
///
/// Scalar, contract-level metadata. Registered once per contract target;
/// a later registration replaces it.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractHeader {
    pub controller_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proto_package: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proto_path: String,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub generate_controller: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub generate_entities: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub generate_boilerplates: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub auth: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub root_only: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub is_public: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub module_contract: bool,

    #[serde(default)]
    pub options: ContractOptions,
}

impl ContractHeader {
    #[must_use]
    pub fn new(controller_name: impl Into<String>) -> Self {
        Self {
            controller_name: controller_name.into(),
            ..Self::default()
        }
    }

    /// Stable registry path: `namespace::ControllerName`, or just the name.
    #[must_use]
    pub fn path(&self) -> String {
        if self.namespace.is_empty() {
            self.controller_name.clone()
        } else {
            format!("{}::{}", self.namespace, self.controller_name)
        }
    }
}

///
/// Contract
///
/// A fully assembled contract: header plus its ordered lists. This is what
/// the registry hands to generation and what the manifest persists.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(flatten)]
    pub header: ContractHeader,

    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Contract {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.header.controller_name
    }

    #[must_use]
    pub fn get_field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.property_key == key)
    }

    #[must_use]
    pub fn get_message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn get_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// snake_case stem used for every generated file of this contract.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.name().to_case(Case::Snake)
    }

    /// Table or collection name: the schema-name option, else the file stem.
    #[must_use]
    pub fn table_name(&self) -> String {
        self.header
            .options
            .database_schema_name
            .clone()
            .unwrap_or_else(|| self.file_stem())
    }

    /// Whether any controller-style artifact is requested.
    #[must_use]
    pub const fn wants_controller(&self) -> bool {
        self.header.generate_controller || self.header.generate_boilerplates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProtoType;

    #[test]
    fn table_name_defaults_to_snake_case() {
        let mut contract = Contract {
            header: ContractHeader::new("UserGroups"),
            ..Contract::default()
        };
        assert_eq!(contract.table_name(), "user_groups");

        contract.header.options.database_schema_name = Some("groups_v2".to_string());
        assert_eq!(contract.table_name(), "groups_v2");
    }

    #[test]
    fn header_is_flattened_in_json() {
        let contract = Contract {
            header: ContractHeader {
                namespace: "Auth".to_string(),
                generate_controller: true,
                ..ContractHeader::new("Groups")
            },
            fields: vec![Field::new("name", ProtoType::String)],
            ..Contract::default()
        };

        let json = serde_json::to_value(&contract).unwrap();
        assert_eq!(json["controllerName"], "Groups");
        assert_eq!(json["generateController"], true);
        assert_eq!(json["fields"][0]["propertyKey"], "name");
        assert_eq!(contract.header.path(), "Auth::Groups");
    }
}

use crate::node::{ListNode, merge_opt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Not;

///
/// Message
///
/// Named request/response payload shape. Properties keep declaration order.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Message {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

impl Message {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of required properties, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }
}

impl ListNode for Message {
    fn key(&self) -> &str {
        &self.name
    }

    fn merge(&mut self, other: Self) {
        for property in other.properties {
            match self.properties.iter_mut().find(|p| p.name == property.name) {
                Some(existing) => {
                    existing.required |= property.required;
                    merge_opt(&mut existing.param_type, property.param_type);
                    merge_opt(&mut existing.array_type, property.array_type);
                    merge_opt(&mut existing.default, property.default);
                }
                None => self.properties.push(property),
            }
        }
    }
}

///
/// Property
///
/// `ty` is a proto type name, `array` (with `array_type`), or the name of
/// another message on the same contract.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParamType>,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn array_of(name: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ARRAY_TYPE.to_string(),
            array_type: Some(item.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub const fn param_type(mut self, param_type: ParamType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.ty == ARRAY_TYPE
    }
}

/// Property type name marking an array; the element type is `array_type`.
pub const ARRAY_TYPE: &str = "array";

///
/// ParamType
/// Where a request property travels when bound to an HTTP operation.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    Body,
    Path,
    Query,
}

impl ParamType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Path => "path",
            Self::Query => "query",
        }
    }
}

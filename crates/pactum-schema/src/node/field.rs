use crate::{
    node::{Link, ListNode, merge_opt},
    types::ProtoType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Not;

///
/// Field
///
/// One scalar or structured property of a contract.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub property_key: String,
    pub proto_type: ProtoType,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub index: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub proto_repeated: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub read_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_plain: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Validation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl Field {
    #[must_use]
    pub fn new(property_key: impl Into<String>, proto_type: impl Into<ProtoType>) -> Self {
        Self {
            property_key: property_key.into(),
            proto_type: proto_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    #[must_use]
    pub const fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    #[must_use]
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    #[must_use]
    pub const fn repeated(mut self, repeated: bool) -> Self {
        self.proto_repeated = repeated;
        self
    }

    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn transform(mut self, path: impl Into<String>) -> Self {
        self.transform = Some(path.into());
        self
    }

    #[must_use]
    pub fn to_plain(mut self, path: impl Into<String>) -> Self {
        self.to_plain = Some(path.into());
        self
    }

    #[must_use]
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    #[must_use]
    pub fn link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }

    /// Identity of the relation target, if this field points at another
    /// contract. Used to detect retargeted relations between versions.
    #[must_use]
    pub fn relation_target(&self) -> Option<&str> {
        self.link
            .as_ref()
            .map(|link| link.contract.as_str())
            .or(self.entity_type.as_deref())
            .or(self.object_type.as_deref())
    }
}

impl ListNode for Field {
    fn key(&self) -> &str {
        &self.property_key
    }

    fn merge(&mut self, other: Self) {
        self.nullable |= other.nullable;
        self.unique |= other.unique;
        self.index |= other.index;
        self.proto_repeated |= other.proto_repeated;
        self.read_only |= other.read_only;

        merge_opt(&mut self.default_value, other.default_value);
        merge_opt(&mut self.object_type, other.object_type);
        merge_opt(&mut self.entity_type, other.entity_type);
        merge_opt(&mut self.transform, other.transform);
        merge_opt(&mut self.to_plain, other.to_plain);
        merge_opt(&mut self.link, other.link);

        for validation in other.validations {
            if !self.validations.contains(&validation) {
                self.validations.push(validation);
            }
        }
    }
}

///
/// Validation
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Validation {
    pub rule: ValidationRule,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validation {
    #[must_use]
    pub const fn new(rule: ValidationRule) -> Self {
        Self {
            rule,
            message: None,
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<ValidationRule> for Validation {
    fn from(rule: ValidationRule) -> Self {
        Self::new(rule)
    }
}

///
/// ValidationRule
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum ValidationRule {
    NotEmpty,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    OneOf(Vec<String>),
}

impl ValidationRule {
    /// Whether the rule can apply to a field of the given type. On a
    /// repeated field, length rules measure the list and the other rules
    /// check every element.
    #[must_use]
    pub const fn applies_to(&self, ty: &ProtoType, repeated: bool) -> bool {
        match self {
            Self::NotEmpty | Self::MinLength(_) | Self::MaxLength(_) => {
                repeated || ty.is_text() || matches!(ty, ProtoType::Bytes)
            }
            Self::Min(_) | Self::Max(_) => ty.is_numeric(),
            Self::OneOf(_) => ty.is_text(),
        }
    }

    /// Whether the rule runs once per element of a repeated field.
    #[must_use]
    pub const fn per_element(&self) -> bool {
        matches!(self, Self::Min(_) | Self::Max(_) | Self::OneOf(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_existing_and_fills_gaps() {
        let mut field = Field::new("name", ProtoType::String)
            .default_value("anon")
            .validation(ValidationRule::NotEmpty.into());
        let later = Field::new("name", ProtoType::String)
            .unique(true)
            .default_value("other")
            .validation(ValidationRule::NotEmpty.into())
            .validation(ValidationRule::MaxLength(32).into());

        field.merge(later);

        assert!(field.unique);
        assert_eq!(field.default_value, Some(Value::from("anon")));
        assert_eq!(field.validations.len(), 2);
    }

    #[test]
    fn relation_target_prefers_link() {
        let field = Field::new("owner", ProtoType::String)
            .entity_type("UserEntity")
            .link(Link::new("Users", "id"));

        assert_eq!(field.relation_target(), Some("Users"));
    }

    #[test]
    fn numeric_rules_do_not_apply_to_text() {
        assert!(!ValidationRule::Min(1.0).applies_to(&ProtoType::String, false));
        assert!(ValidationRule::Max(10.0).applies_to(&ProtoType::Int32, false));
        assert!(ValidationRule::NotEmpty.applies_to(&ProtoType::String, false));
    }

    #[test]
    fn repeated_fields_measure_the_list_and_check_elements() {
        // list length works for any element type
        assert!(ValidationRule::NotEmpty.applies_to(&ProtoType::Int32, true));
        assert!(!ValidationRule::NotEmpty.applies_to(&ProtoType::Int32, false));

        // element rules still need a matching element type
        assert!(ValidationRule::OneOf(vec!["a".into()]).applies_to(&ProtoType::String, true));
        assert!(!ValidationRule::OneOf(vec!["a".into()]).applies_to(&ProtoType::Int32, true));
        assert!(ValidationRule::Min(0.0).per_element());
        assert!(!ValidationRule::MaxLength(3).per_element());
    }
}

use serde::{Deserialize, Serialize};
use std::ops::Not;

///
/// Link
///
/// Relation from a field to another contract. The target is named, never
/// embedded; it is resolved against the registry at generation time.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub contract: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    pub field: String,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub array: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub create_relationship: bool,
}

impl Link {
    #[must_use]
    pub fn new(contract: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            field: field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn entity_name(mut self, entity_name: impl Into<String>) -> Self {
        self.entity_name = Some(entity_name.into());
        self
    }

    #[must_use]
    pub const fn array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }

    #[must_use]
    pub const fn create_relationship(mut self, create: bool) -> Self {
        self.create_relationship = create;
        self
    }
}

use serde::{Deserialize, Serialize};
use std::ops::Not;

///
/// ContractOptions
///
/// Free-form extras carried by a contract. The database flags add implicit
/// columns to entities and migrations.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_schema_name: Option<String>,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub database_timestamps: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub database_user_action: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub database_fake_delete: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_form: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_page: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheOptions>,
}

///
/// CacheOptions
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CacheOptions {
    pub key: String,

    /// Time to live in seconds; zero means no expiry.
    #[serde(default)]
    pub ttl: u64,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub compress: bool,
}

impl CacheOptions {
    #[must_use]
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        Self {
            key: key.into(),
            ttl,
            compress: false,
        }
    }
}

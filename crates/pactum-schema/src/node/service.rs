use crate::{
    node::{CacheOptions, ListNode, merge_opt},
    types::Method,
};
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::ops::Not;

///
/// Service
///
/// One RPC/REST operation. `request`/`response` name a message on the same
/// contract; an empty name means "no body".
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub path: String,
    pub method: Method,

    #[serde(default)]
    pub request: String,

    #[serde(default)]
    pub response: String,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub auth: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub root_only: bool,

    pub function_name: String,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub create_boilerplate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheOptions>,
}

impl Service {
    /// New operation; the function name defaults to the snake_case name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let function_name = name.to_case(Case::Snake);

        Self {
            name,
            function_name,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn request(mut self, message: impl Into<String>) -> Self {
        self.request = message.into();
        self
    }

    #[must_use]
    pub fn response(mut self, message: impl Into<String>) -> Self {
        self.response = message.into();
        self
    }

    #[must_use]
    pub const fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub const fn root_only(mut self, root_only: bool) -> Self {
        self.root_only = root_only;
        self
    }

    #[must_use]
    pub fn function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = function_name.into();
        self
    }

    #[must_use]
    pub const fn create_boilerplate(mut self, create: bool) -> Self {
        self.create_boilerplate = create;
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: CacheOptions) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub const fn has_request(&self) -> bool {
        !self.request.is_empty()
    }

    #[must_use]
    pub const fn has_response(&self) -> bool {
        !self.response.is_empty()
    }
}

impl ListNode for Service {
    fn key(&self) -> &str {
        &self.name
    }

    fn merge(&mut self, other: Self) {
        self.auth |= other.auth;
        self.root_only |= other.root_only;
        self.create_boilerplate |= other.create_boilerplate;

        if self.path.is_empty() {
            self.path = other.path;
        }
        if self.request.is_empty() {
            self.request = other.request;
        }
        if self.response.is_empty() {
            self.response = other.response;
        }
        merge_opt(&mut self.cache, other.cache);
    }
}

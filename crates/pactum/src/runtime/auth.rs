use crate::runtime::HandlerError;
use std::collections::{BTreeMap, BTreeSet};

///
/// User
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct User {
    pub id: String,
    pub roles: BTreeSet<String>,
    pub root: bool,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    #[must_use]
    pub const fn root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }
}

///
/// RequestContext
///
/// Per-request state handed to every generated handler.
///

#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub user: Option<User>,
    pub request_id: Option<String>,

    /// `:param` values captured from the matched route.
    pub params: BTreeMap<String, String>,
}

impl RequestContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_user(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// A copy of this context carrying the given route params.
    #[must_use]
    pub fn with_params<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = self.clone();
        ctx.params = params
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();

        ctx
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

///
/// Access
///
/// What a guarded operation asks of the caller.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Access {
    /// `Contract.service`
    pub operation: &'static str,
    pub root_only: bool,
}

///
/// AuthorizationChecker
///

pub trait AuthorizationChecker {
    fn check(&self, ctx: &RequestContext, access: &Access) -> Result<(), HandlerError>;
}

///
/// RoleChecker
///
/// Requires a signed-in user, root for root-only operations, and any roles
/// configured for the operation.
///

#[derive(Clone, Debug, Default)]
pub struct RoleChecker {
    required: BTreeMap<String, BTreeSet<String>>,
}

impl RoleChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn require(mut self, operation: impl Into<String>, role: impl Into<String>) -> Self {
        self.required
            .entry(operation.into())
            .or_default()
            .insert(role.into());
        self
    }
}

impl AuthorizationChecker for RoleChecker {
    fn check(&self, ctx: &RequestContext, access: &Access) -> Result<(), HandlerError> {
        let user = ctx.user.as_ref().ok_or(HandlerError::Unauthorized)?;

        if access.root_only && !user.root {
            return Err(HandlerError::Forbidden(format!(
                "{} is restricted to root",
                access.operation
            )));
        }

        if let Some(roles) = self.required.get(access.operation)
            && !user.root
            && let Some(missing) = roles.iter().find(|role| !user.roles.contains(*role))
        {
            return Err(HandlerError::Forbidden(format!(
                "{} requires role '{missing}'",
                access.operation
            )));
        }

        Ok(())
    }
}

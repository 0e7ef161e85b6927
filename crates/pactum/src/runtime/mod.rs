//! Runtime interface.
//!
//! Everything generated code names through `::pactum::runtime`. These are
//! interfaces and small helpers only; serving requests, talking to a
//! database, and running GraphQL are left to the application.

mod auth;
mod cache;
mod codec;
mod entity;
mod error;
mod route;
pub mod validate;

pub use auth::{Access, AuthorizationChecker, RequestContext, RoleChecker, User};
pub use cache::{Cache, MemoryCache, cache_key, cache_read, cache_write};
pub use codec::{decode, encode};
pub use entity::{Backend, ColumnDef, EntityIndex, EntitySchema, RelationDef};
pub use error::HandlerError;
pub use route::Route;
pub use validate::{FieldError, Validate, ValidationErrors};

/// Calendar date as written on the wire (`YYYY-MM-DD`).
pub type Date = String;

/// Milliseconds since the unix epoch.
pub type Timestamp = i64;

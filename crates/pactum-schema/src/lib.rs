//! Contract metadata for Pactum: node types, the metadata registry, the
//! declaration layer, contract-set validation, and the migration operation
//! vocabulary shared by the generator and generated code.

pub mod declare;
pub mod error;
pub mod migration;
pub mod node;
pub mod registry;
pub mod types;
pub mod validate;

/// Maximum length for contract (controller) names.
pub const MAX_CONTRACT_NAME_LEN: usize = 64;

/// Maximum length for field property keys.
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// Maximum number of fields allowed in a single index.
pub const MAX_INDEX_FIELDS: usize = 8;

use crate::{declare::DeclareError, error::ErrorTree};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        declare::ContractBuilder,
        err,
        error::ErrorTree,
        node::*,
        registry::{MetadataRegistry, Metadata, RegisterMode, Target},
        types::{Method, OperationKind, ProtoType},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    DeclareError(#[from] DeclareError),

    #[error("validation failed: {0}")]
    Validation(ErrorTree),
}

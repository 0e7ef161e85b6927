//! Migration generator.
//!
//! A contract's persistence lifecycle is New (no previous snapshot), Changed
//! (previous snapshot differs), or Removed (current is gone). [`plan`] turns
//! a pair of snapshots into up/down operations, [`render`] turns a plan into
//! a Rust source file, and [`MigrationWriter`] lands it all-or-nothing under
//! a collision-free timestamped name.

pub mod column;
pub mod diff;
pub mod plan;
pub mod render;
pub mod writer;

pub use diff::{AlterRisk, ContractDiff, FieldChange, IndexChange, diff};
pub use plan::{ChangeKind, MigrationPlan, plan};
pub use render::render;
pub use writer::MigrationWriter;

use pactum_config::RepositoryBackend;
use std::{io, path::PathBuf};
use thiserror::Error as ThisError;

///
/// MigrateError
///

#[derive(Debug, ThisError)]
pub enum MigrateError {
    #[error(
        "contract '{contract}': field '{field}' has type '{ty}' with no {backend} column mapping"
    )]
    UnmappableType {
        contract: String,
        field: String,
        ty: String,
        backend: RepositoryBackend,
    },

    #[error("contract '{contract}': table renamed from '{from}' to '{to}'")]
    TableRenamed {
        contract: String,
        from: String,
        to: String,
    },

    #[error("failed to write migration '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

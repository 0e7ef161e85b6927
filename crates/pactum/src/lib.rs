//! ## Crate layout
//! - `schema`: contract node types, the metadata registry, and declaration.
//! - `build`: module registry, transpilers, migrations, and the manifest.
//! - `config`: generation configuration.
//! - `runtime`: the interface generated code is written against.
//!
//! Generated files only ever name items through `::pactum`, so an
//! application depends on this crate alone.

pub use pactum_build as build;
pub use pactum_config as config;
pub use pactum_schema as schema;

pub mod runtime;

/// re-exports
///
/// generated code reaches serde through here so applications do not need
/// to list it themselves
pub mod __reexports {
    pub use serde;
    pub use serde_json;
}

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        build::{Module, ModuleRegistry, Pipeline, PipelineReport, core_module, module::names},
        config::GenerateConfig,
        runtime::{
            AuthorizationChecker as _, Cache as _, EntitySchema as _, HandlerError,
            RequestContext, User, Validate as _,
        },
        schema::prelude::*,
    };
}

//! Generation side of Pactum: the module registry, the transpiler pipeline,
//! the migration generator, and the schema manifest writer.
//!
//! Everything here reads contract metadata; nothing here mutates the
//! metadata registry.

pub mod manifest;
pub mod migrate;
pub mod module;
pub mod output;
pub mod pipeline;
pub mod transpile;

pub use manifest::{Manifest, ManifestError, ManifestWriter};
pub use module::{Module, ModuleFlags, ModuleRegistry, Registration};
pub use pipeline::{Failure, Pipeline, PipelineError, PipelineReport};
pub use transpile::{
    Provider, ProviderKind, TranspileContext, TranspileError, Transpiler,
    controller::ControllerTranspiler, entity::EntityTranspiler, gateway::GatewayTranspiler,
    migration::MigrationTranspiler, openapi::OpenApiTranspiler, resolver::ResolverTranspiler,
    service::ServiceTranspiler,
};

/// First line of every generated source file.
pub const GENERATED_HEADER: &str = "// @generated by pactum. Do not edit by hand.";

/// Name of the module carrying the built-in transpilers.
pub const CORE_MODULE: &str = "pactum";

/// The built-in transpilers in their run order. Entity names are set before
/// resolvers read them, and migrations run last so a contract that failed
/// anywhere earlier is not diffed.
#[must_use]
pub fn core_module() -> Module {
    Module::new(CORE_MODULE)
        .transpiler(ServiceTranspiler)
        .transpiler(ControllerTranspiler)
        .transpiler(GatewayTranspiler)
        .transpiler(EntityTranspiler)
        .transpiler(ResolverTranspiler)
        .transpiler(OpenApiTranspiler::default())
        .transpiler(MigrationTranspiler::new())
}

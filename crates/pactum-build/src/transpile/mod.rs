//! Transpilers.
//!
//! Each transpiler reads the active contract list and the module flags from a
//! shared [`TranspileContext`] and writes one category of artifact. Failures
//! scoped to a single contract are recorded on the context and generation
//! moves on to the next contract.

pub mod controller;
pub mod entity;
pub mod gateway;
pub mod migration;
pub mod naming;
pub mod openapi;
pub mod resolver;
pub mod service;

use crate::{
    GENERATED_HEADER, ModuleFlags, manifest::Manifest, migrate::MigrateError,
    output::ArtifactWriter, pipeline::Failure,
};
use pactum_config::GenerateConfig;
use pactum_schema::node::Contract;
use proc_macro2::TokenStream;
use quote::quote;
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// TranspileError
///

#[derive(Debug, ThisError)]
pub enum TranspileError {
    #[error("field '{field}' has type '{ty}' with no mapping")]
    UnmappableType { field: String, ty: String },

    #[error("field '{field}' links to '{target}', which has no generated entity")]
    UnresolvedLink { field: String, target: String },

    #[error("message '{message}' property '{property}' has unresolved type '{ty}'")]
    UnresolvedType {
        message: String,
        property: String,
        ty: String,
    },

    #[error("service '{service}' references undeclared message '{message}'")]
    UnknownMessage { service: String, message: String },

    #[error("field '{field}': validation {rule} does not apply to '{ty}'")]
    InvalidValidation {
        field: String,
        rule: String,
        ty: String,
    },

    #[error("'{value}' is not a valid Rust identifier")]
    InvalidIdent { value: String },

    #[error("'{value}' is not a valid Rust path")]
    InvalidPath { value: String },

    #[error("failed to write '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Migrate(#[from] MigrateError),
}

///
/// Transpiler
///
/// Transpilers run sequentially in module order; later ones may read state
/// that earlier ones left on the context (entity names, providers).
///

pub trait Transpiler {
    fn name(&self) -> &'static str;

    /// Generate this transpiler's artifacts. An `Err` means the transpiler
    /// as a whole could not finish; per-contract problems are recorded on
    /// the context instead.
    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError>;
}

///
/// ProviderKind
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderKind {
    Controller,
    Entity,
    Gateway,
    Migration,
    Resolver,
    Service,
}

///
/// Provider
///
/// A generated item the running application should load.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    pub kind: ProviderKind,

    /// Rust path of the generated item.
    pub module_path: String,
}

impl Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.module_path)
    }
}

///
/// TranspileContext
///

pub struct TranspileContext<'a> {
    contracts: &'a [Contract],
    flags: ModuleFlags,
    config: &'a GenerateConfig,
    previous: Option<&'a Manifest>,
    entity_names: BTreeMap<String, String>,
    providers: Vec<Provider>,
    failures: Vec<Failure>,
    failed: BTreeSet<String>,
    modules: BTreeSet<String>,
    writer: ArtifactWriter,
}

impl<'a> TranspileContext<'a> {
    #[must_use]
    pub fn new(
        contracts: &'a [Contract],
        flags: ModuleFlags,
        config: &'a GenerateConfig,
        previous: Option<&'a Manifest>,
    ) -> Self {
        Self {
            contracts,
            flags,
            config,
            previous,
            entity_names: BTreeMap::new(),
            providers: Vec::new(),
            failures: Vec::new(),
            failed: BTreeSet::new(),
            modules: BTreeSet::new(),
            writer: ArtifactWriter::new(),
        }
    }

    #[must_use]
    pub const fn contracts(&self) -> &'a [Contract] {
        self.contracts
    }

    #[must_use]
    pub const fn flags(&self) -> ModuleFlags {
        self.flags
    }

    #[must_use]
    pub const fn config(&self) -> &'a GenerateConfig {
        self.config
    }

    #[must_use]
    pub const fn previous(&self) -> Option<&'a Manifest> {
        self.previous
    }

    #[must_use]
    pub fn contract(&self, name: &str) -> Option<&'a Contract> {
        self.contracts.iter().find(|c| c.name() == name)
    }

    // ------------------------------------------------------------------
    // Entity names
    // ------------------------------------------------------------------

    pub fn set_entity_name(&mut self, contract: &str, entity: impl Into<String>) {
        self.entity_names.insert(contract.to_string(), entity.into());
    }

    #[must_use]
    pub fn entity_name(&self, contract: &str) -> Option<&str> {
        self.entity_names.get(contract).map(String::as_str)
    }

    pub fn remove_entity_name(&mut self, contract: &str) {
        self.entity_names.remove(contract);
    }

    // ------------------------------------------------------------------
    // Failures
    // ------------------------------------------------------------------

    /// Record a failure and log it with its contract and transpiler.
    pub fn record(&mut self, transpiler: &str, contract: Option<&str>, message: impl Display) {
        let message = message.to_string();
        match contract {
            Some(contract) => {
                tracing::warn!(transpiler, contract, error = %message, "contract skipped");
                self.failed.insert(contract.to_string());
            }
            None => tracing::warn!(transpiler, error = %message, "transpiler failed"),
        }

        self.failures.push(Failure {
            transpiler: transpiler.to_string(),
            contract: contract.map(ToString::to_string),
            message,
        });
    }

    /// Mark a contract as failed before any transpiler runs.
    pub fn mark_failed(&mut self, contract: &str) {
        self.failed.insert(contract.to_string());
    }

    #[must_use]
    pub fn is_failed(&self, contract: &str) -> bool {
        self.failed.contains(contract)
    }

    /// Run `f` for every contract passing `filter`, recording errors against
    /// the contract instead of propagating them. Contracts that already
    /// failed are skipped, so no artifact references a module that was
    /// never written.
    pub fn each_contract<P, F>(&mut self, transpiler: &'static str, filter: P, mut f: F)
    where
        P: Fn(&Contract) -> bool,
        F: FnMut(&mut Self, &'a Contract) -> Result<(), TranspileError>,
    {
        let contracts = self.contracts;

        for contract in contracts.iter().filter(|c| filter(c)) {
            if self.is_failed(contract.name()) {
                continue;
            }
            if let Err(e) = f(self, contract) {
                self.record(transpiler, Some(contract.name()), e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn provide(&mut self, name: impl Into<String>, kind: ProviderKind, module_path: String) {
        self.providers.push(Provider {
            name: name.into(),
            kind,
            module_path,
        });
    }

    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Write a generated source file at `source_root/<subdir>/<module>.rs`.
    pub fn write_source(
        &mut self,
        subdir: &str,
        module: &str,
        tokens: &TokenStream,
    ) -> Result<PathBuf, TranspileError> {
        let path = self
            .config
            .source_root
            .join(subdir)
            .join(format!("{module}.rs"));
        self.write_file(&path, &render_file(tokens))?;

        Ok(path)
    }

    /// Write `mod.rs` for a generated subdirectory listing `modules`, sorted.
    pub fn write_mod_file(&mut self, subdir: &str, modules: &[String]) -> Result<(), TranspileError> {
        let mut sorted = modules
            .iter()
            .map(|m| naming::parse_ident(m))
            .collect::<Result<Vec<_>, _>>()?;
        sorted.sort_by_key(ToString::to_string);
        sorted.dedup();

        let path = self.config.source_root.join(subdir).join("mod.rs");
        self.write_file(&path, &render_file(&quote!(#(pub mod #sorted;)*)))?;
        self.modules.insert(subdir.to_string());

        Ok(())
    }

    /// Write `mod.rs` at the source root listing every subdirectory that got
    /// a `mod.rs` during this run.
    pub fn write_root_mod_file(&mut self) -> Result<(), TranspileError> {
        if self.modules.is_empty() {
            return Ok(());
        }

        // nested subdirectories (a configured `db/migrations`) are left for
        // the application to wire up
        let mods = self
            .modules
            .iter()
            .filter_map(|m| naming::parse_ident(m).ok());
        let path = self.config.source_root.join("mod.rs");
        self.write_file(&path, &render_file(&quote!(#(pub mod #mods;)*)))
    }

    /// Register a subdirectory module written outside [`Self::write_mod_file`].
    pub fn register_module(&mut self, subdir: &str) {
        self.modules.insert(subdir.to_string());
    }

    pub fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), TranspileError> {
        self.writer.write(path, contents).map_err(|source| TranspileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn record_written(&mut self, path: PathBuf) {
        self.writer.record(path);
    }

    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        self.writer.written()
    }

    /// Consume the context, returning written paths, providers, and failures.
    #[must_use]
    pub fn finish(self) -> (Vec<PathBuf>, Vec<Provider>, Vec<Failure>) {
        (self.writer.into_written(), self.providers, self.failures)
    }
}

/// Header line plus the stringified tokens.
#[must_use]
pub fn render_file(tokens: &TokenStream) -> String {
    format!("{GENERATED_HEADER}\n\n{tokens}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::node::ContractHeader;

    fn contracts() -> Vec<Contract> {
        ["Groups", "Roles"]
            .into_iter()
            .map(|name| Contract {
                header: ContractHeader::new(name),
                ..Contract::default()
            })
            .collect()
    }

    #[test]
    fn each_contract_records_and_continues() {
        let contracts = contracts();
        let config = GenerateConfig::default();
        let mut ctx = TranspileContext::new(&contracts, ModuleFlags::default(), &config, None);

        let mut seen = Vec::new();
        ctx.each_contract("test", |_| true, |_, contract| {
            seen.push(contract.name().to_string());
            if contract.name() == "Groups" {
                return Err(TranspileError::InvalidPath {
                    value: "x y".to_string(),
                });
            }
            Ok(())
        });

        assert_eq!(seen, vec!["Groups", "Roles"]);
        assert!(ctx.is_failed("Groups"));
        assert!(!ctx.is_failed("Roles"));

        let (_, _, failures) = ctx.finish();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].contract.as_deref(), Some("Groups"));
        assert_eq!(failures[0].transpiler, "test");
    }

    #[test]
    fn each_contract_skips_failed_contracts() {
        let contracts = contracts();
        let config = GenerateConfig::default();
        let mut ctx = TranspileContext::new(&contracts, ModuleFlags::default(), &config, None);
        ctx.mark_failed("Groups");

        let mut seen = Vec::new();
        ctx.each_contract("test", |_| true, |_, contract| {
            seen.push(contract.name().to_string());
            Ok(())
        });

        assert_eq!(seen, vec!["Roles"]);
    }

    #[test]
    fn mod_file_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = contracts();
        let config = GenerateConfig::default().rooted_at(dir.path());
        let mut ctx = TranspileContext::new(&contracts, ModuleFlags::default(), &config, None);

        ctx.write_mod_file("services", &["roles_service".to_string(), "groups_service".to_string()])
            .unwrap();
        ctx.write_root_mod_file().unwrap();

        let text = std::fs::read_to_string(config.source_root.join("services/mod.rs")).unwrap();
        assert!(text.starts_with(GENERATED_HEADER));
        assert!(text.contains("pub mod groups_service ; pub mod roles_service ;"));

        let root = std::fs::read_to_string(config.source_root.join("mod.rs")).unwrap();
        assert!(root.contains("pub mod services ;"));
    }
}

//! Generation pipeline.
//!
//! One run resolves the active contracts, validates them as a set, runs every
//! registered transpiler in module load order, and finally persists the
//! schema manifest. Only failing to create the output roots or to read the
//! previous manifest aborts the run; everything else lands in the report.

use crate::{
    ModuleFlags, ModuleRegistry,
    manifest::{Manifest, ManifestError, ManifestWriter},
    transpile::{Provider, TranspileContext},
};
use pactum_config::GenerateConfig;
use pactum_schema::{node::Contract, registry::MetadataRegistry, validate::validate_contracts};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fmt::{self, Display},
    fs, io,
    path::PathBuf,
};
use thiserror::Error as ThisError;

/// Failures that are not owned by a transpiler use this name.
const PIPELINE: &str = "pipeline";

///
/// PipelineError
///

#[derive(Debug, ThisError)]
pub enum PipelineError {
    #[error("cannot create output directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot load previous manifest: {0}")]
    PreviousManifest(#[from] ManifestError),
}

///
/// Failure
///
/// One recorded problem. `contract` is empty for failures that hit a whole
/// transpiler rather than a single contract.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Failure {
    pub transpiler: String,
    pub contract: Option<String>,
    pub message: String,
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.contract {
            Some(contract) => write!(f, "[{}] {contract}: {}", self.transpiler, self.message),
            None => write!(f, "[{}] {}", self.transpiler, self.message),
        }
    }
}

///
/// PipelineReport
///

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub written: Vec<PathBuf>,
    pub providers: Vec<Provider>,
    pub failures: Vec<Failure>,
    pub manifest: Option<PathBuf>,
    pub flags: ModuleFlags,
}

impl PipelineReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of every contract with at least one failure.
    #[must_use]
    pub fn failed_contracts(&self) -> BTreeSet<&str> {
        self.failures
            .iter()
            .filter_map(|f| f.contract.as_deref())
            .collect()
    }
}

///
/// Pipeline
///

pub struct Pipeline<'a> {
    registry: &'a MetadataRegistry,
    modules: &'a ModuleRegistry,
    config: &'a GenerateConfig,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub const fn new(
        registry: &'a MetadataRegistry,
        modules: &'a ModuleRegistry,
        config: &'a GenerateConfig,
    ) -> Self {
        Self {
            registry,
            modules,
            config,
        }
    }

    pub fn run(&self) -> Result<PipelineReport, PipelineError> {
        let span = tracing::info_span!("pipeline");
        let _enter = span.enter();

        for dir in [&self.config.output_dir, &self.config.source_root] {
            fs::create_dir_all(dir).map_err(|source| PipelineError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }

        let flags = self.modules.flags().with_overrides(self.config);
        let previous =
            Manifest::load_previous(&self.config.output_dir, &self.config.schema.file_stem)?;

        // Phase 1: resolve and validate the active contracts
        let mut unknown = Vec::new();
        let mut resolved = Vec::new();
        for name in self.modules.active_contracts() {
            match self.registry.contract(name) {
                Some(contract) => resolved.push(contract),
                None => unknown.push(name.to_string()),
            }
        }

        let errors = validate_contracts(&resolved);
        let invalid: BTreeSet<String> = errors.routes().map(ToString::to_string).collect();
        let contracts: Vec<Contract> = resolved
            .into_iter()
            .filter(|c| !invalid.contains(c.name()))
            .collect();

        let mut ctx = TranspileContext::new(&contracts, flags, self.config, previous.as_ref());
        for name in &unknown {
            ctx.record(PIPELINE, Some(name.as_str()), "contract is not registered");
        }
        for (route, message) in errors.flatten() {
            let contract = route.split('.').next().filter(|c| !c.is_empty());
            ctx.record("validate", contract, format!("{route}: {message}"));
        }

        tracing::info!(
            contracts = contracts.len(),
            skipped = unknown.len() + invalid.len(),
            "contracts resolved"
        );

        // Phase 2: transpilers, in module load order
        for transpiler in self.modules.transpilers() {
            let span = tracing::info_span!("transpiler", name = transpiler.name());
            let _enter = span.enter();

            if let Err(e) = transpiler.run(&mut ctx) {
                ctx.record(transpiler.name(), None, e);
            }
        }

        if let Err(e) = ctx.write_root_mod_file() {
            ctx.record(PIPELINE, None, e);
        }

        // Phase 3: manifest
        let mut manifest = None;
        if self.config.schema.enabled {
            let snapshot = self.snapshot(&ctx, &contracts, previous.as_ref(), flags);
            let writer = ManifestWriter::new(&self.config.output_dir, &self.config.schema.file_stem);

            match writer.write_manifest(&snapshot) {
                Ok(path) => manifest = Some(path),
                Err(e) => ctx.record("manifest", None, e),
            }
        }

        let (written, providers, failures) = ctx.finish();
        let report = PipelineReport {
            written,
            providers,
            failures,
            manifest,
            flags,
        };

        if report.is_success() {
            tracing::info!(written = report.written.len(), "generation finished");
        } else {
            tracing::warn!(
                written = report.written.len(),
                failures = report.failures.len(),
                "generation finished with failures"
            );
        }

        Ok(report)
    }

    // snapshot
    // successful contracts as they are now; failed ones keep their last
    // persisted entry so the next run still diffs against it
    fn snapshot(
        &self,
        ctx: &TranspileContext<'_>,
        contracts: &[Contract],
        previous: Option<&Manifest>,
        flags: ModuleFlags,
    ) -> Manifest {
        let mut snapshot = Manifest::new(contracts.iter().filter(|c| !ctx.is_failed(c.name())), flags);

        if let Some(previous) = previous {
            for name in self.modules.active_contracts() {
                if ctx.is_failed(name)
                    && let Some(contract) = previous.contract(name)
                {
                    snapshot.contracts.insert(name.to_string(), contract.clone());
                }
            }
        }

        snapshot
    }
}

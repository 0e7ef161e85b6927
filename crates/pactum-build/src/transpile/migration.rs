//! Migration transpiler.
//!
//! Compares the previous manifest snapshot with the current contracts and
//! writes one migration per New, Changed, or Removed contract. Runs only
//! with the repository module present and migrations enabled.

use crate::{
    migrate::{MigrationWriter, plan},
    transpile::{ProviderKind, TranspileContext, TranspileError, Transpiler},
};
use pactum_schema::node::Contract;

///
/// MigrationTranspiler
///

#[derive(Clone, Copy, Debug, Default)]
pub struct MigrationTranspiler {
    timestamp: Option<u64>,
}

impl MigrationTranspiler {
    #[must_use]
    pub const fn new() -> Self {
        Self { timestamp: None }
    }

    /// Fixed timestamp (milliseconds) for file names; reproducible runs.
    #[must_use]
    pub const fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }
}

impl Transpiler for MigrationTranspiler {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        let config = ctx.config();
        if !ctx.flags().repository || !config.migrations.enabled {
            return Ok(());
        }

        let backend = config.repository.backend;
        let mut writer = MigrationWriter::new(config.migrations_dir());
        if let Some(ts) = self.timestamp {
            writer = writer.with_timestamp(ts);
        }

        let previous = |name: &str| {
            ctx.previous()
                .and_then(|manifest| manifest.contracts.get(name))
                .filter(|contract| contract.header.generate_entities)
        };
        let current = |name: &str| {
            ctx.contracts()
                .iter()
                .find(|c| c.name() == name && c.header.generate_entities)
        };

        // Phase 1: current contracts, declaration order
        let mut pairs: Vec<(&str, Option<&Contract>, Option<&Contract>)> = Vec::new();
        for contract in ctx.contracts() {
            if contract.header.generate_entities && !ctx.is_failed(contract.name()) {
                pairs.push((contract.name(), previous(contract.name()), Some(contract)));
            }
        }

        // Phase 2: removals, in manifest order; failed contracts are not
        // treated as removed
        if let Some(manifest) = ctx.previous() {
            for (name, prev) in &manifest.contracts {
                if prev.header.generate_entities
                    && current(name).is_none()
                    && !ctx.is_failed(name)
                {
                    pairs.push((name, Some(prev), None));
                }
            }
        }

        let module_root = format!(
            "{}::{}",
            config.generated_module,
            config.migrations.dir.display().to_string().replace(['/', '\\'], "::")
        );
        let mut written = false;
        for (name, prev, cur) in pairs {
            let result = plan(prev, cur, backend).and_then(|plan| match plan {
                Some(plan) => writer.write(&plan).map(|path| Some((plan, path))),
                None => Ok(None),
            });

            match result {
                Ok(Some((plan, path))) => {
                    if plan.data_loss_possible {
                        tracing::warn!(contract = name, path = %path.display(), "migration may lose data");
                    }
                    let module = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    ctx.provide(
                        name,
                        ProviderKind::Migration,
                        format!("{module_root}::m{module}"),
                    );
                    ctx.record_written(path);
                    written = true;
                }
                Ok(None) => {}
                Err(e) => ctx.record(self.name(), Some(name), e),
            }
        }

        if written {
            let index = writer.write_index()?;
            ctx.record_written(index);
        }

        if writer.dir().join("mod.rs").exists()
            && let Some(dir) = config.migrations.dir.to_str()
        {
            ctx.register_module(dir);
        }

        Ok(())
    }
}

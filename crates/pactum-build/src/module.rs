//! Module registry.
//!
//! Modules group contracts, providers, controllers, and transpilers under a
//! name. Module presence is what transpilers branch on: `has_module("cache")`
//! decides whether cache calls are emitted, and so on.

use crate::transpile::Transpiler;
use pactum_config::GenerateConfig;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// Well-known module names that generation branches on.
pub mod names {
    pub const AUTH: &str = "auth";
    pub const CACHE: &str = "cache";
    pub const GRAPHQL: &str = "graphql";
    pub const OPENAPI: &str = "openapi";
    pub const REPOSITORY: &str = "repository";
    pub const RPC: &str = "rpc";
    pub const VAULT: &str = "vault";
}

///
/// Module
///

#[must_use]
pub struct Module {
    name: String,
    contracts: Vec<String>,
    providers: Vec<String>,
    controllers: Vec<String>,
    transpilers: Vec<Box<dyn Transpiler>>,
    configs: Vec<String>,
    submodules: Vec<Module>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contracts: Vec::new(),
            providers: Vec::new(),
            controllers: Vec::new(),
            transpilers: Vec::new(),
            configs: Vec::new(),
            submodules: Vec::new(),
        }
    }

    /// Add a contract by controller name.
    pub fn contract(mut self, name: impl Into<String>) -> Self {
        self.contracts.push(name.into());
        self
    }

    pub fn contracts<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contracts.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.providers.push(name.into());
        self
    }

    pub fn controller(mut self, name: impl Into<String>) -> Self {
        self.controllers.push(name.into());
        self
    }

    pub fn transpiler(mut self, transpiler: impl Transpiler + 'static) -> Self {
        self.transpilers.push(Box::new(transpiler));
        self
    }

    /// Configuration keys this module reads.
    pub fn config(mut self, key: impl Into<String>) -> Self {
        self.configs.push(key.into());
        self
    }

    pub fn submodule(mut self, module: Self) -> Self {
        self.submodules.push(module);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn contract_names(&self) -> &[String] {
        &self.contracts
    }

    #[must_use]
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    #[must_use]
    pub fn controllers(&self) -> &[String] {
        &self.controllers
    }

    #[must_use]
    pub fn configs(&self) -> &[String] {
        &self.configs
    }

    pub fn transpilers(&self) -> impl Iterator<Item = &dyn Transpiler> {
        self.transpilers.iter().map(AsRef::as_ref)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("contracts", &self.contracts)
            .field("providers", &self.providers)
            .field("controllers", &self.controllers)
            .field(
                "transpilers",
                &self.transpilers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("configs", &self.configs)
            .finish_non_exhaustive()
    }
}

///
/// Registration
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Registration {
    Added,

    /// A module of the same name was already registered and has been
    /// replaced in place. Callers treat this as a reload signal.
    Replaced,
}

///
/// ModuleRegistry
///

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    positions: BTreeMap<String, usize>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module and, before it, its submodules. Returns how the
    /// top-level module landed.
    pub fn register(&mut self, mut module: Module) -> Registration {
        for submodule in std::mem::take(&mut module.submodules) {
            self.register(submodule);
        }

        let name = module.name.clone();
        if let Some(pos) = self.positions.get(&name) {
            tracing::warn!(module = %name, "module re-registered; replacing previous entry");
            self.modules[*pos] = module;

            Registration::Replaced
        } else {
            tracing::debug!(module = %name, "module registered");
            self.positions.insert(name, self.modules.len());
            self.modules.push(module);

            Registration::Added
        }
    }

    #[must_use]
    pub fn has_module(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.positions.get(name).map(|pos| &self.modules[*pos])
    }

    /// Modules in load order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Contract names across all modules, in load order, first occurrence wins.
    #[must_use]
    pub fn active_contracts(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();

        self.modules
            .iter()
            .flat_map(|m| m.contracts.iter())
            .filter(|name| seen.insert(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Every transpiler, modules in load order, each module's own order kept.
    pub fn transpilers(&self) -> impl Iterator<Item = &dyn Transpiler> {
        self.modules.iter().flat_map(Module::transpilers)
    }

    #[must_use]
    pub fn flags(&self) -> ModuleFlags {
        ModuleFlags {
            auth: self.has_module(names::AUTH),
            graphql: self.has_module(names::GRAPHQL),
            rpc: self.has_module(names::RPC),
            openapi: self.has_module(names::OPENAPI),
            cache: self.has_module(names::CACHE),
            repository: self.has_module(names::REPOSITORY),
            vault: self.has_module(names::VAULT),
        }
    }
}

///
/// ModuleFlags
///
/// Presence of the optional modules generation branches on; persisted in the
/// schema manifest.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModuleFlags {
    pub auth: bool,
    pub graphql: bool,
    pub rpc: bool,
    pub openapi: bool,
    pub cache: bool,
    pub repository: bool,
    pub vault: bool,
}

impl ModuleFlags {
    /// Apply forced values from configuration.
    #[must_use]
    pub fn with_overrides(mut self, config: &GenerateConfig) -> Self {
        for (name, slot) in [
            (names::AUTH, &mut self.auth),
            (names::GRAPHQL, &mut self.graphql),
            (names::RPC, &mut self.rpc),
            (names::OPENAPI, &mut self.openapi),
            (names::CACHE, &mut self.cache),
            (names::REPOSITORY, &mut self.repository),
            (names::VAULT, &mut self.vault),
        ] {
            if let Some(forced) = config.module_override(name) {
                *slot = forced;
            }
        }

        self
    }
}

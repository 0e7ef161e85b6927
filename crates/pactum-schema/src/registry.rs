//! Metadata registry.
//!
//! Associates a [`Target`] (a contract, or a contract member) with typed
//! metadata. Scalar metadata is last-writer-wins; list metadata appends, and a
//! second registration of the same list key merges into the first unless the
//! caller asks to override it.

use crate::node::{Contract, ContractHeader, Field, Index, ListNode, Message, Service};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

///
/// Target
///
/// Stable identifier for metadata: a contract path, optionally narrowed to a
/// member (an operation on that contract).
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Target {
    pub path: String,
    pub member: Option<String>,
}

impl Target {
    #[must_use]
    pub fn contract(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            member: None,
        }
    }

    #[must_use]
    pub fn member(path: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            member: Some(member.into()),
        }
    }

    #[must_use]
    pub const fn is_member(&self) -> bool {
        self.member.is_some()
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}::{member}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

///
/// Metadata
///

#[derive(Clone, Debug, PartialEq)]
pub enum Metadata {
    Contract(ContractHeader),
    Field(Field),
    Message(Message),
    Service(Service),
    Index(Index),
}

impl Metadata {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Contract(_) => "contract",
            Self::Field(_) => "field",
            Self::Message(_) => "message",
            Self::Service(_) => "service",
            Self::Index(_) => "index",
        }
    }
}

///
/// RegisterMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RegisterMode {
    #[default]
    Merge,
    Override,
}

impl RegisterMode {
    #[must_use]
    pub const fn from_override(override_existing: bool) -> Self {
        if override_existing {
            Self::Override
        } else {
            Self::Merge
        }
    }
}

///
/// TargetMeta
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetMeta {
    pub contract: Option<ContractHeader>,
    pub fields: Vec<Field>,
    pub messages: Vec<Message>,
    pub services: Vec<Service>,
    pub indexes: Vec<Index>,
}

impl TargetMeta {
    const EMPTY: Self = Self {
        contract: None,
        fields: Vec::new(),
        messages: Vec::new(),
        services: Vec::new(),
        indexes: Vec::new(),
    };

    fn apply(&mut self, metadata: Metadata, mode: RegisterMode) {
        match metadata {
            Metadata::Contract(header) => self.contract = Some(header),
            Metadata::Field(node) => upsert(&mut self.fields, node, mode),
            Metadata::Message(node) => upsert(&mut self.messages, node, mode),
            Metadata::Service(node) => upsert(&mut self.services, node, mode),
            Metadata::Index(node) => upsert(&mut self.indexes, node, mode),
        }
    }
}

static EMPTY_META: TargetMeta = TargetMeta::EMPTY;

// upsert
// merge or replace in place so the original declaration position is kept
fn upsert<T: ListNode>(list: &mut Vec<T>, node: T, mode: RegisterMode) {
    match list.iter_mut().find(|existing| existing.key() == node.key()) {
        Some(existing) => match mode {
            RegisterMode::Merge => existing.merge(node),
            RegisterMode::Override => *existing = node,
        },
        None => list.push(node),
    }
}

///
/// MetadataRegistry
///
/// Owned per context rather than global; tests build their own.
///

#[derive(Clone, Debug, Default)]
pub struct MetadataRegistry {
    entries: Vec<(Target, TargetMeta)>,
    positions: BTreeMap<Target, usize>,
    contract_paths: BTreeMap<String, String>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach metadata to a target.
    pub fn register(&mut self, target: &Target, metadata: Metadata, mode: RegisterMode) {
        tracing::trace!(target = %target, kind = metadata.kind(), "register metadata");

        if let Metadata::Contract(header) = &metadata {
            self.contract_paths
                .insert(header.controller_name.clone(), target.path.clone());
        }

        let pos = match self.positions.get(target) {
            Some(pos) => *pos,
            None => {
                self.entries.push((target.clone(), TargetMeta::default()));
                let pos = self.entries.len() - 1;
                self.positions.insert(target.clone(), pos);
                pos
            }
        };

        self.entries[pos].1.apply(metadata, mode);
    }

    /// Metadata for a target; unregistered targets read as empty.
    #[must_use]
    pub fn get(&self, target: &Target) -> &TargetMeta {
        self.positions
            .get(target)
            .map_or(&EMPTY_META, |pos| &self.entries[*pos].1)
    }

    /// Every registered target in registration order.
    pub fn get_all(&self) -> impl Iterator<Item = (&Target, &TargetMeta)> {
        self.entries.iter().map(|(target, meta)| (target, meta))
    }

    #[must_use]
    pub fn contains_contract(&self, name: &str) -> bool {
        self.contract_paths.contains_key(name)
    }

    /// Registry path of the contract with the given controller name.
    #[must_use]
    pub fn contract_path(&self, name: &str) -> Option<&str> {
        self.contract_paths.get(name).map(String::as_str)
    }

    /// Assemble a contract by controller name. Operations come from member
    /// targets under the contract path, in registration order.
    #[must_use]
    pub fn contract(&self, name: &str) -> Option<Contract> {
        let path = self.contract_paths.get(name)?;
        let meta = self.get(&Target::contract(path.as_str()));
        let header = meta.contract.clone()?;

        let mut services = meta.services.clone();
        for (target, member_meta) in &self.entries {
            if target.is_member() && target.path == *path {
                for service in &member_meta.services {
                    upsert(&mut services, service.clone(), RegisterMode::Merge);
                }
            }
        }

        Some(Contract {
            header,
            fields: meta.fields.clone(),
            messages: meta.messages.clone(),
            services,
            indexes: meta.indexes.clone(),
        })
    }

    /// All contracts in declaration order.
    #[must_use]
    pub fn contracts(&self) -> Vec<Contract> {
        self.entries
            .iter()
            .filter_map(|(target, meta)| {
                let header = meta.contract.as_ref()?;
                if target.is_member() {
                    return None;
                }
                self.contract(&header.controller_name)
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything. Only meant for test harness resets.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.contract_paths.clear();
    }
}

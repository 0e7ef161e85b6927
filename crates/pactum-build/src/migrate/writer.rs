//! Migration file output.

use crate::{
    migrate::{MigrateError, MigrationPlan, render},
    output,
    transpile::render_file,
};
use convert_case::{Case, Casing};
use proc_macro2::Ident;
use quote::{format_ident, quote};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

// upper bound on timestamp bumps per write
const MAX_NAME_ATTEMPTS: u64 = 1_000;

///
/// MigrationWriter
///
/// Files are named `<millis>_<contract stem>.rs`. A taken name bumps the
/// timestamp instead of overwriting, so concurrent plans in one directory
/// never clobber each other and existing files are never touched.
///

#[derive(Clone, Debug)]
pub struct MigrationWriter {
    dir: PathBuf,
    timestamp: Option<u64>,
}

impl MigrationWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timestamp: None,
        }
    }

    /// Use a fixed timestamp (milliseconds) instead of the clock.
    #[must_use]
    pub const fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one migration, all-or-nothing, returning its path.
    pub fn write(&self, plan: &MigrationPlan) -> Result<PathBuf, MigrateError> {
        let contents = render(plan);
        let stem = plan.contract.to_case(Case::Snake);
        let start = self.timestamp.unwrap_or_else(now_millis);

        let mut last = None;
        for ts in start..start.saturating_add(MAX_NAME_ATTEMPTS) {
            let path = self.dir.join(format!("{ts}_{stem}.rs"));

            match output::write_atomic_new(&path, &contents) {
                Ok(()) => return Ok(path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last = Some((path, e)),
                Err(source) => return Err(MigrateError::Io { path, source }),
            }
        }

        let (path, source) = last.unwrap_or_else(|| {
            (
                self.dir.clone(),
                io::Error::from(io::ErrorKind::AlreadyExists),
            )
        });

        Err(MigrateError::Io { path, source })
    }

    /// Regenerate `mod.rs` listing every migration file in the directory,
    /// oldest first.
    pub fn write_index(&self) -> Result<PathBuf, MigrateError> {
        let path = self.dir.join("mod.rs");
        let io_err = |source| MigrateError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let file_name = entry.map_err(io_err)?.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(stem) = name.strip_suffix(".rs")
                && stem != "mod"
                && stem.starts_with(|c: char| c.is_ascii_digit())
                && stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                names.push(stem.to_string());
            }
        }
        names.sort_by_key(|name| (timestamp_of(name), name.clone()));

        let files: Vec<_> = names.iter().map(|name| format!("{name}.rs")).collect();
        let mods: Vec<Ident> = names.iter().map(|name| format_ident!("m{}", name)).collect();
        let tokens = quote! {
            #(
                #[path = #files]
                pub mod #mods;
            )*

            /// Every migration as `(name, up, down)`, oldest first.
            pub const MIGRATIONS: &[(
                &str,
                fn() -> ::std::vec::Vec<::pactum::schema::migration::MigrationOp>,
                fn() -> ::std::vec::Vec<::pactum::schema::migration::MigrationOp>,
            )] = &[#((#names, #mods::up, #mods::down)),*];
        };

        output::write_atomic(&path, &render_file(&tokens)).map_err(|source| MigrateError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

// timestamp_of
// numeric prefix of a migration stem; digit counts differ across eras
fn timestamp_of(stem: &str) -> Option<u64> {
    stem.split_once('_')
        .map_or(stem, |(ts, _)| ts)
        .parse()
        .ok()
}

fn now_millis() -> u64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();

    u64::try_from(nanos / 1_000_000).unwrap_or_default()
}

//! Up/down operation planning.

use crate::migrate::{MigrateError, column, diff};
use pactum_config::RepositoryBackend;
use pactum_schema::{migration::MigrationOp, node::Contract};
use std::fmt::{self, Display};

///
/// ChangeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeKind {
    New,
    Changed,
    Removed,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Changed => "changed",
            Self::Removed => "removed",
        };

        f.write_str(s)
    }
}

///
/// MigrationPlan
///

#[derive(Clone, Debug, PartialEq)]
pub struct MigrationPlan {
    pub contract: String,
    pub table: String,
    pub kind: ChangeKind,
    pub up: Vec<MigrationOp>,
    pub down: Vec<MigrationOp>,

    /// Set when any operation may lose stored data. Emission is never
    /// blocked; callers decide what to do with the flag.
    pub data_loss_possible: bool,
}

/// Plan the migration between two snapshots of one contract. Returns
/// `Ok(None)` when nothing changed.
pub fn plan(
    previous: Option<&Contract>,
    current: Option<&Contract>,
    backend: RepositoryBackend,
) -> Result<Option<MigrationPlan>, MigrateError> {
    let (contract, kind, up, data_loss_possible) = match (previous, current) {
        (None, None) => return Ok(None),

        (None, Some(cur)) => {
            let up = vec![MigrationOp::CreateTable {
                table: cur.table_name(),
                columns: column::columns(backend, cur)?,
                indexes: column::indexes(cur),
            }];

            (cur, ChangeKind::New, up, false)
        }

        // down rebuilds the table from the last known shape
        (Some(prev), None) => {
            let up = vec![MigrationOp::DropTable {
                table: prev.table_name(),
                columns: column::columns(backend, prev)?,
                indexes: column::indexes(prev),
            }];

            (prev, ChangeKind::Removed, up, true)
        }

        (Some(prev), Some(cur)) => {
            // every field of both versions must map before anything is planned
            column::columns(backend, prev)?;
            column::columns(backend, cur)?;

            if prev.table_name() != cur.table_name() {
                return Err(MigrateError::TableRenamed {
                    contract: cur.name().to_string(),
                    from: prev.table_name(),
                    to: cur.table_name(),
                });
            }

            let diff = diff(prev, cur);
            if diff.is_empty() {
                return Ok(None);
            }

            let table = cur.table_name();
            let mut up = Vec::new();

            for field in &diff.added_fields {
                up.push(MigrationOp::AddColumn {
                    table: table.clone(),
                    column: column::column(backend, cur, field)?,
                });
            }
            for field in &diff.dropped_fields {
                up.push(MigrationOp::DropColumn {
                    table: table.clone(),
                    column: column::column(backend, prev, field)?,
                });
            }
            for change in &diff.modified_fields {
                up.push(MigrationOp::AlterColumn {
                    table: table.clone(),
                    from: column::column(backend, prev, &change.from)?,
                    to: column::column(backend, cur, &change.to)?,
                });
            }
            for index in &diff.added_indexes {
                up.push(MigrationOp::CreateIndex {
                    table: table.clone(),
                    index: index.clone(),
                });
            }
            for index in &diff.dropped_indexes {
                up.push(MigrationOp::DropIndex {
                    table: table.clone(),
                    index: index.clone(),
                });
            }
            for change in &diff.modified_indexes {
                up.push(MigrationOp::ModifyIndex {
                    table: table.clone(),
                    from: change.from.clone(),
                    to: change.to.clone(),
                });
            }

            (cur, ChangeKind::Changed, up, diff.data_loss_possible())
        }
    };

    let down = MigrationOp::invert_all(&up);

    Ok(Some(MigrationPlan {
        contract: contract.name().to_string(),
        table: contract.table_name(),
        kind,
        up,
        down,
        data_loss_possible,
    }))
}

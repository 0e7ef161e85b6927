//! Migration source rendering.

use crate::{GENERATED_HEADER, migrate::MigrationPlan};
use pactum_schema::migration::MigrationOp;
use quote::quote;

/// Render a plan as a Rust source file exporting `up()` and `down()`, with a
/// readable summary of the operations in the leading comment.
#[must_use]
pub fn render(plan: &MigrationPlan) -> String {
    let contract = &plan.contract;
    let table = &plan.table;
    let data_loss = plan.data_loss_possible;
    let up = &plan.up;
    let down = &plan.down;

    let tokens = quote! {
        pub const CONTRACT: &str = #contract;
        pub const TABLE: &str = #table;
        pub const DATA_LOSS_POSSIBLE: bool = #data_loss;

        #[must_use]
        pub fn up() -> ::std::vec::Vec<::pactum::schema::migration::MigrationOp> {
            vec![#(#up),*]
        }

        #[must_use]
        pub fn down() -> ::std::vec::Vec<::pactum::schema::migration::MigrationOp> {
            vec![#(#down),*]
        }
    };

    let mut lines = vec![
        GENERATED_HEADER.to_string(),
        "//".to_string(),
        format!("// {contract}: {} (table {table})", plan.kind),
    ];
    if data_loss {
        lines.push("// WARNING: this migration may lose data".to_string());
    }
    describe(&mut lines, "up", up);
    describe(&mut lines, "down", down);
    lines.push(String::new());
    lines.push(tokens.to_string());

    let mut out = lines.join("\n");
    out.push('\n');

    out
}

fn describe(lines: &mut Vec<String>, label: &str, ops: &[MigrationOp]) {
    lines.push("//".to_string());
    lines.push(format!("// {label}:"));
    lines.extend(ops.iter().map(|op| format!("//   {op}")));
}

mod contract;
mod field;
mod index;
mod link;
mod message;
mod options;
mod service;

pub use contract::*;
pub use field::*;
pub use index::*;
pub use link::*;
pub use message::*;
pub use options::*;
pub use service::*;

///
/// ListNode
///
/// A node stored in one of a contract's ordered lists. The key is the node's
/// identity within that list; `merge` folds a second declaration of the same
/// key into the first instead of duplicating it.
///

pub trait ListNode {
    fn key(&self) -> &str;

    fn merge(&mut self, other: Self);
}

// merge_opt
// keep what is already declared, fill gaps from the later declaration
pub(crate) fn merge_opt<T>(slot: &mut Option<T>, other: Option<T>) {
    if slot.is_none() {
        *slot = other;
    }
}

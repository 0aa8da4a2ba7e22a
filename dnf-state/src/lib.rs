//! Hierarchical progress, cancellation and lock-ownership tracking shared by
//! every long-running dnf-core operation (repo loading, resolving, committing).

mod action;
mod state;

pub use action::{Action, ProgressObserver};
pub use state::State;

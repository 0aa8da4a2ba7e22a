//! The pool of interned solvables, the repositories that own them, and the
//! visibility maps (excludes/includes/modular excludes) a query or resolver
//! filters against.

mod bitmap;
mod cache;
mod metadata;
mod repo;
mod sack;
mod solvable;

pub use bitmap::Bitmap;
pub use metadata::{InMemoryMetadataSource, RepoMetadataSource};
pub use repo::{CachePaths, Repo, RepoId, RepoKind, RepoState};
pub use sack::{LoadFlags, Sack};
pub use solvable::{Solvable, SolvableId, SolvableRecord};

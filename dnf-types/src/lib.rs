//! Value types shared across dnf-core: package and module identity tuples,
//! version comparison, and relational dependency expressions.
//!
//! None of these types know about a sack, a pool, or a repository; they are
//! pure data plus parsing and ordering.

mod arch;
mod error;
mod name;
mod nevra;
mod nsvcap;
mod reldep;
mod version;

pub use arch::Arch;
pub use error::Error;
pub use name::Name;
pub use nevra::{nevra_evr_matches, Nevra, NevraForm};
pub use nsvcap::{Nsvcap, NsvcapForm};
pub use reldep::Reldep;
pub use version::{rpmvercmp, Epoch, Evr, VerString, VersionComparison};

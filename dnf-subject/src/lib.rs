//! Turns a raw, user-supplied string into plausible structured package or
//! module identifiers (§4.6), and resolves one to an actual query against a
//! [`dnf_sack::Sack`].

mod subject;

pub use subject::{get_best_solution, Subject};

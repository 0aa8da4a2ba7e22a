//! The §4.4 transaction state machine: turns a resolved [`dnf_solve::Goal`]
//! into RPM operations, bracketed by free-space and trust checks and
//! recorded in an append-only history store.

mod fetcher;
mod history;
mod rpmdb_version;
mod transaction;
mod trust;

pub use fetcher::{InMemoryPackageFetcher, PackageFetcher};
pub use history::{History, HistoryAction, HistoryItem, TransactionOutcome, TransactionRecord};
pub use rpmdb_version::RpmdbVersion;
pub use transaction::{Transaction, TransactionFlags};
pub use trust::{InMemoryTrustStore, TrustStore};

//! Wires the sack, module container, resolver driver and transaction
//! executor into the end-to-end flow of §2's data-flow diagram:
//!
//! ```text
//! repo metadata files + installed RPM database
//!         │
//!         ▼
//!    Sack ──loads──► Pool of solvables
//!         │                │
//!         │                ▼
//!         │         Module Container (visibility filter)
//!         ▼                ▼
//!    Query ◄── excludes/includes/modular filter ──► visible solvable set
//!         │
//!         ▼
//!    user Subject string ──► Selector / Goal ──► SAT solver (external)
//!                                                       │
//!                                                       ▼
//!                                                Transaction plan
//!                                     gpg check / test-run / real commit
//!                                                       │
//!                                                       ▼
//!                                    history store, then invalidate sack
//! ```
//!
//! This crate owns no logic of its own beyond [`globals_init`] and
//! [`Config`]; every component lives in its own crate and is re-exported
//! here under a namespaced module so a caller depends on `dnf-core` alone.

mod config;
mod globals;

pub use config::Config;
pub use globals::{globals_init, is_initialized};

/// Value types: NEVRA/NSVCAP/Reldep/EVR and version comparison.
pub mod types {
    pub use dnf_types::{
        nevra_evr_matches, rpmvercmp, Arch, Epoch, Error, Evr, Name, Nevra, NevraForm, Nsvcap,
        NsvcapForm, Reldep, VerString, VersionComparison,
    };
}

/// Shared traits and the crate-wide error taxonomy.
pub mod common {
    pub use dnf_common::{
        Arched, Error, GenericPackageMetadata, HasConflicts, HasObsoletes, HasProvides,
        HasRequires, HasWeakDependencies, Installed, ModuleErrorKind, Named, Versioned,
    };
}

/// The §4.8 process-wide lock manager.
pub mod lock {
    pub use dnf_lock::{LockManager, LockMode, LockType};
}

/// The §4.7 hierarchical progress/cancellation tree.
pub mod state {
    pub use dnf_state::{Action, ProgressObserver, State};
}

/// §4.6 Subject/Nevra/Nsvcap parsing and resolution against a sack.
pub mod subject {
    pub use dnf_subject::{get_best_solution, Subject};
}

/// The §4.1 pool of solvables, repositories, and visibility maps.
pub mod sack {
    pub use dnf_sack::{
        Bitmap, CachePaths, InMemoryMetadataSource, LoadFlags, Repo, RepoId, RepoKind, RepoState,
        RepoMetadataSource, Sack, Solvable, SolvableId, SolvableRecord,
    };
}

/// The §4.5 filter pipeline and the selector layered on it.
pub mod query {
    pub use dnf_query::{arch_preference, ComparisonKind, Filter, FilterKey, FilterValue, Query, Selector};
}

/// The §4.2 module state machine and the visibility filter it produces.
pub mod module {
    pub use dnf_module::{
        read_state_dir, InMemoryModuleMetadataSource, ModuleContainer, ModuleDefaults,
        ModuleDocument, ModuleMetadataSource, ModuleProblem, ModuleRecord, ModuleState,
        RpmFilterPlan,
    };
}

/// The §4.3 dependency resolver driver.
pub mod solve {
    pub use dnf_solve::{CandidateRecord, DepSpec, Goal, JobTarget, ResolvedAction, RunFlags};
}

/// The §6 external RPM adapter contract and its in-memory reference
/// implementation.
pub mod rpm {
    pub use dnf_rpm::{InMemoryRpmBackend, InstalledPackage, RpmBackend, TransactionProblem};
}

/// The §4.4 transaction state machine and the §3 history store.
pub mod transaction {
    pub use dnf_transaction::{
        History, HistoryAction, HistoryItem, InMemoryPackageFetcher, InMemoryTrustStore,
        PackageFetcher, RpmdbVersion, Transaction, TransactionFlags, TransactionOutcome,
        TransactionRecord, TrustStore,
    };
}

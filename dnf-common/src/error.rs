//! The crate-wide error taxonomy shared by every dnf-core component.

use std::path::PathBuf;

use fluent_i18n::t;

/// Module error sub-kinds (§4.2).
///
/// `Info` and `ErrorInDefaults` are soft: the module container logs them and
/// keeps going. Everything else is fatal to the operation that raised it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ModuleErrorKind {
    /// No error; used only as a placeholder in bulk problem reports.
    NoError,
    /// Informational notice, not fatal.
    Info,
    /// A default stream/profile could not be resolved; logged and skipped.
    ErrorInDefaults,
    /// A generic module-subsystem error.
    Error,
    /// A module dependency could not be resolved.
    CannotResolveModules,
    /// A module spec string (NSVCAP) could not be resolved against any known module.
    CannotResolveModuleSpec,
    /// Two or more streams of the same module were requested enabled simultaneously.
    CannotEnableMultipleStreams,
    /// The same module's state was modified more than once in a single transaction.
    CannotModifyMultipleTimesModuleState,
}

/// The error type produced by dnf-core components.
///
/// Every variant here corresponds to one of the error kinds the system is
/// specified to produce; there is no "catch-all" variant precisely so that
/// callers can match exhaustively on policy (surface vs. log-and-continue).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An invariant was violated, or the solver/RPM backend returned something unexpected.
    #[error("{msg}", msg = t!("error-internal", { "context" => context }))]
    Internal {
        /// A short description of what was expected.
        context: String,
    },

    /// A local file exists but is malformed.
    #[error("{msg}", msg = t!("error-file-invalid", { "path" => path.display().to_string(), "reason" => reason }))]
    FileInvalid {
        /// The offending file.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// An expected file or directory is absent.
    #[error("{msg}", msg = t!("error-file-not-found", { "path" => path.display().to_string() }))]
    FileNotFound {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// An optional extension (e.g. a GPG backend) is unavailable; callers may downgrade.
    #[error("{msg}", msg = t!("error-no-capability", { "capability" => capability }))]
    NoCapability {
        /// The name of the missing capability.
        capability: String,
    },

    /// A lock is held by another process or is stale.
    #[error("{msg}", msg = t!("error-cannot-get-lock", { "lock" => lock, "holder" => holder.clone().unwrap_or_default() }))]
    CannotGetLock {
        /// A human-readable name for the contested lock.
        lock: String,
        /// The holder's command line, if it could be determined.
        holder: Option<String>,
    },

    /// An external fetcher (repo downloader) failed.
    #[error("{msg}", msg = t!("error-cannot-fetch-source", { "source_name" => source_name, "reason" => reason }))]
    CannotFetchSource {
        /// The repository or URL that could not be fetched.
        source_name: String,
        /// The underlying failure.
        reason: String,
    },

    /// A repository is disabled, unreachable, or its metadata cannot be read.
    #[error("{msg}", msg = t!("error-repo-not-available", { "repo_id" => repo_id, "reason" => reason }))]
    RepoNotAvailable {
        /// The affected repository id.
        repo_id: String,
        /// Why it is unavailable.
        reason: String,
    },

    /// Writing a local cache entry failed; the caller may downgrade to running uncached.
    #[error("{msg}", msg = t!("error-cannot-write-cache", { "path" => path.display().to_string(), "source" => source.to_string() }))]
    CannotWriteCache {
        /// The cache path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// GPG signature verification failed for a package or repository metadata file.
    #[error("{msg}", msg = t!("error-gpg-signature-invalid", { "subject" => subject }))]
    GpgSignatureInvalid {
        /// The package or metadata file whose signature failed to verify.
        subject: String,
    },

    /// A selector combined mutually exclusive filters.
    #[error("{msg}", msg = t!("error-bad-selector", { "reason" => reason }))]
    BadSelector {
        /// Why the selector is invalid.
        reason: String,
    },

    /// The resolver reported the goal is unsatisfiable.
    #[error("{msg}", msg = t!("error-no-solution", { "problem_count" => problems.len().to_string() }))]
    NoSolution {
        /// Formatted problem descriptions, one per unsatisfiable rule chain.
        problems: Vec<String>,
    },

    /// A subject string resolved to an empty package set.
    #[error("{msg}", msg = t!("error-package-not-found", { "subject" => subject }))]
    PackageNotFound {
        /// The subject string that did not resolve.
        subject: String,
    },

    /// An architecture token is unknown or unsupported in this context.
    #[error("{msg}", msg = t!("error-invalid-architecture", { "arch" => arch }))]
    InvalidArchitecture {
        /// The offending architecture token.
        arch: String,
    },

    /// There is not enough free space for the planned download or install.
    #[error("{msg}", msg = t!("error-no-space", { "needed" => needed.to_string(), "available" => available.to_string() }))]
    NoSpace {
        /// Bytes required.
        needed: u64,
        /// Bytes actually available.
        available: u64,
    },

    /// The RPM database is in an inconsistent (interrupted) state.
    #[error("{msg}", msg = t!("error-unfinished-transaction", {}))]
    UnfinishedTransaction,

    /// A protected package (e.g. the running kernel) would be removed by the plan.
    #[error("{msg}", msg = t!("error-removal-of-protected-pkg", { "nevra" => nevra }))]
    RemovalOfProtectedPkg {
        /// The protected package's NEVRA string.
        nevra: String,
    },

    /// The operation was cooperatively cancelled at a step boundary.
    #[error("{msg}", msg = t!("error-cancelled", {}))]
    Cancelled,

    /// A module-subsystem error (§4.2); see [`ModuleErrorKind`] for which sub-kinds are fatal.
    #[error("{msg}", msg = t!("error-module", { "kind" => kind.to_string(), "detail" => detail }))]
    ModuleError {
        /// Which module-subsystem error this is.
        kind: ModuleErrorKind,
        /// Additional detail (module/stream name, etc.).
        detail: String,
    },

    /// A value type failed to parse or validate.
    #[error(transparent)]
    Types(#[from] dnf_types::Error),

    /// A generic I/O failure not covered by a more specific variant above.
    #[error("{msg}", msg = t!("error-io", { "context" => context, "source" => source.to_string() }))]
    Io {
        /// What was being attempted.
        context: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this error represents cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

//! Error type for `dnf-types`.

/// Errors that occur while constructing or parsing value types.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A package or module name contains characters outside the allowed set.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// An architecture token is empty.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// An epoch could not be parsed as a non-negative integer.
    #[error("invalid epoch: {0}")]
    InvalidEpoch(String),

    /// A version or release component is empty or contains disallowed characters.
    #[error("invalid version component: {0}")]
    InvalidVersionComponent(String),

    /// A full NEVRA string did not match any of the known forms.
    #[error("'{0}' does not match any known NEVRA form")]
    InvalidNevra(String),

    /// A Reldep string was malformed.
    #[error("invalid reldep: {0}")]
    InvalidReldep(String),

    /// A module (NSVCAP) string did not match any of the 16 known forms.
    #[error("'{0}' does not match any known module form")]
    InvalidNsvcap(String),

    /// A module version was not a valid unsigned 64-bit integer.
    #[error("invalid module version: {0}")]
    InvalidModuleVersion(String),
}

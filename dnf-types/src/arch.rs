//! CPU architecture tokens.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::Error;

/// The set of architectures a sack is generally expected to know about.
///
/// This is informative, not exhaustive: [`Arch::new`] accepts any non-empty
/// alphanumeric token so that third-party or future arches are not rejected
/// outright. [`Arch::is_known`] reports whether the token is one dnf-core
/// ships baked-in knowledge of (used by [`crate::Nevra`] possibility
/// filtering, which requires a match against "one of the sack's known
/// arches" per the subject-parsing contract).
const KNOWN_ARCHES: &[&str] = &[
    "x86_64",
    "i686",
    "i586",
    "i486",
    "i386",
    "aarch64",
    "armv7hl",
    "armv7hnl",
    "armv6hl",
    "ppc64le",
    "ppc64",
    "s390x",
    "riscv64",
    "noarch",
    "src",
];

/// An architecture token, e.g. `x86_64` or `noarch`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Arch(String);

impl Arch {
    /// Creates a new [`Arch`] from a token.
    pub fn new(arch: impl Into<String>) -> Result<Self, Error> {
        let arch = arch.into();
        if !arch.is_empty() && arch.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            Ok(Self(arch))
        } else {
            Err(Error::InvalidArchitecture(arch))
        }
    }

    /// Returns the architecture as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is one of the architectures dnf-core has baked-in knowledge of.
    pub fn is_known(&self) -> bool {
        KNOWN_ARCHES.contains(&self.0.as_str())
    }

    /// Returns `true` if this is the special `src` (source package) architecture.
    pub fn is_src(&self) -> bool {
        self.0 == "src"
    }

    /// Returns `true` if this is the special `noarch` architecture.
    pub fn is_noarch(&self) -> bool {
        self.0 == "noarch"
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::new(s)
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_arches_detected() {
        assert!(Arch::new("x86_64").unwrap().is_known());
        assert!(!Arch::new("mips").unwrap().is_known());
    }

    #[test]
    fn rejects_empty() {
        assert!(Arch::new("").is_err());
    }
}

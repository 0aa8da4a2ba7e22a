//! Package and module names.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::Error;

/// Returns `true` if every byte of `s` is allowed in an RPM package or module name.
///
/// Mirrors the permissive character class RPM itself uses for package names:
/// alphanumerics plus `-._+`. A leading `-` or `.` is allowed, since RPM
/// source/binary package names commonly start with digits.
fn is_valid_name_str(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'+'))
}

/// A package name, e.g. `glibc` or `kernel-devel`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`], validating the character set.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if is_valid_name_str(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidName(name))
        }
    }

    /// Returns the name as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::new(s)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_rpm_names() {
        assert!(Name::new("glibc").is_ok());
        assert!(Name::new("kernel-devel").is_ok());
        assert!(Name::new("perl(Foo::Bar)").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Name::new(""), Err(Error::InvalidName(String::new())));
    }
}

//! The `<count>:<hex>` rpmdb version checksum (§6), typed rather than passed
//! around as a bare string.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use dnf_common::Error;

/// A parsed rpmdb version checksum: the number of installed packages and the
/// SHA-1 hex digest over their sorted header checksums.
///
/// [`dnf_rpm::RpmBackend::rpmdb_version`] already renders this format as a
/// plain `String`; this type exists so a [`crate::History`] record can
/// compare and display pre/post checksums without re-parsing the string each
/// time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RpmdbVersion(pub u64, pub String);

impl RpmdbVersion {
    /// The package count half of the checksum.
    pub fn count(&self) -> u64 {
        self.0
    }

    /// The hex digest half of the checksum.
    pub fn digest(&self) -> &str {
        &self.1
    }
}

impl Display for RpmdbVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl FromStr for RpmdbVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, digest) = s.split_once(':').ok_or_else(|| Error::FileInvalid {
            path: std::path::PathBuf::from(s),
            reason: "rpmdb version checksum is missing the ':' separator".to_string(),
        })?;
        let count: u64 = count.parse().map_err(|_| Error::FileInvalid {
            path: std::path::PathBuf::from(s),
            reason: format!("rpmdb version checksum has a non-numeric count: {count:?}"),
        })?;
        Ok(RpmdbVersion(count, digest.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        let version: RpmdbVersion = "42:deadbeef".parse().unwrap();
        assert_eq!(version, RpmdbVersion(42, "deadbeef".to_string()));
        assert_eq!(version.to_string(), "42:deadbeef");
    }

    #[test]
    fn rejects_a_string_with_no_separator() {
        assert!("deadbeef".parse::<RpmdbVersion>().is_err());
    }

    #[test]
    fn rejects_a_non_numeric_count() {
        assert!("abc:deadbeef".parse::<RpmdbVersion>().is_err());
    }
}

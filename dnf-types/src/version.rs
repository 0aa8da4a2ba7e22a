//! Epoch/version/release values and RPM's `rpmvercmp` ordering.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::Error;

/// Compares two version (or release) strings using RPM's segment-wise comparison.
///
/// Strings are split into alternating runs of digits and letters; separator
/// characters (anything that is neither alphanumeric nor `~`) are skipped. A
/// numeric segment always outranks an alphabetic one at the same position. A
/// leading `~` makes a segment sort *before* anything, including the end of
/// string, which is how RPM represents pre-releases (`1.0~rc1` < `1.0`).
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let ac: Vec<char> = a.chars().collect();
    let bc: Vec<char> = b.chars().collect();
    let mut i = 0usize;
    let mut j = 0usize;

    loop {
        while i < ac.len() && !(ac[i].is_ascii_alphanumeric() || ac[i] == '~') {
            i += 1;
        }
        while j < bc.len() && !(bc[j].is_ascii_alphanumeric() || bc[j] == '~') {
            j += 1;
        }

        let a_tilde = i < ac.len() && ac[i] == '~';
        let b_tilde = j < bc.len() && bc[j] == '~';
        if a_tilde || b_tilde {
            if a_tilde && !b_tilde {
                return Ordering::Less;
            }
            if !a_tilde && b_tilde {
                return Ordering::Greater;
            }
            i += 1;
            j += 1;
            continue;
        }

        if i >= ac.len() || j >= bc.len() {
            break;
        }

        let seg_i = i;
        let seg_j = j;
        let is_num = ac[i].is_ascii_digit();

        if is_num {
            while i < ac.len() && ac[i].is_ascii_digit() {
                i += 1;
            }
            while j < bc.len() && bc[j].is_ascii_digit() {
                j += 1;
            }
        } else {
            while i < ac.len() && ac[i].is_ascii_alphabetic() {
                i += 1;
            }
            while j < bc.len() && bc[j].is_ascii_alphabetic() {
                j += 1;
            }
        }

        if seg_j == j {
            // `b`'s segment at this position is of the other kind (or exhausted):
            // numeric segments always outrank alphabetic ones.
            return if is_num { Ordering::Greater } else { Ordering::Less };
        }

        if is_num {
            let one: &str = &a[char_byte_offset(a, seg_i)..char_byte_offset(a, i)];
            let two: &str = &b[char_byte_offset(b, seg_j)..char_byte_offset(b, j)];
            let one_trim = one.trim_start_matches('0');
            let two_trim = two.trim_start_matches('0');
            match one_trim.len().cmp(&two_trim.len()) {
                Ordering::Equal => {}
                other => return other,
            }
            match one_trim.cmp(two_trim) {
                Ordering::Equal => {}
                other => return other,
            }
        } else {
            let one: &str = &a[char_byte_offset(a, seg_i)..char_byte_offset(a, i)];
            let two: &str = &b[char_byte_offset(b, seg_j)..char_byte_offset(b, j)];
            match one.cmp(two) {
                Ordering::Equal => {}
                other => return other,
            }
        }
    }

    while i < ac.len() && !ac[i].is_ascii_alphanumeric() {
        i += 1;
    }
    while j < bc.len() && !bc[j].is_ascii_alphanumeric() {
        j += 1;
    }

    match (i < ac.len(), j < bc.len()) {
        (false, false) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

fn char_byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(s.len())
}

/// A package epoch.
///
/// Unset is distinct from zero: an explicit `0:` epoch and an absent epoch
/// compare equal against a fully-resolved [`Evr`] (which always has a
/// concrete epoch, defaulting absent to `0`), but an unset epoch sorts
/// strictly lower than *any* set epoch when two partially-parsed
/// [`crate::Nevra`] values are compared against each other directly. See
/// [`Epoch::rpm_value`] vs. the derived [`Ord`] impl.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Epoch(Option<u32>);

impl Epoch {
    /// The unset epoch.
    pub const UNSET: Epoch = Epoch(None);

    /// Creates an explicit epoch value.
    pub fn new(value: u32) -> Self {
        Epoch(Some(value))
    }

    /// Returns `true` if this epoch was never specified.
    pub fn is_unset(&self) -> bool {
        self.0.is_none()
    }

    /// The value RPM uses when comparing against a concrete package: absent epochs default to 0.
    pub fn rpm_value(&self) -> u32 {
        self.0.unwrap_or(0)
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Epoch::UNSET
    }
}

impl FromStr for Epoch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Epoch::new)
            .map_err(|_| Error::InvalidEpoch(s.to_string()))
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "(unset)"),
        }
    }
}

/// Ordering for two partially-parsed epochs: unset sorts below any set value.
impl Ord for Epoch {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(&b),
        }
    }
}

impl PartialOrd for Epoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A version or release string component (e.g. `1.2.3` or `3.fc40`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VerString(String);

impl VerString {
    /// Creates a new version/release component, rejecting the empty string.
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        if value.is_empty() || value.bytes().any(|b| b == b':' || b == b'-') {
            return Err(Error::InvalidVersionComponent(value));
        }
        Ok(VerString(value))
    }

    /// Returns the component as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VerString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerString::new(s)
    }
}

impl Display for VerString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for VerString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VerString {
    fn cmp(&self, other: &Self) -> Ordering {
        rpmvercmp(&self.0, &other.0)
    }
}

/// A full, concrete `(epoch, version, release)` triple, as owned by a solvable.
///
/// Unlike [`crate::Nevra`], every field is mandatory: a package interned into
/// the pool always has a resolved epoch (defaulting to `0`), version and
/// release.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Evr {
    /// The package epoch (`0` if the package declared none).
    pub epoch: u32,
    /// The upstream version.
    pub version: VerString,
    /// The packager release.
    pub release: VerString,
}

impl Evr {
    /// Creates a new [`Evr`].
    pub fn new(epoch: u32, version: VerString, release: VerString) -> Self {
        Self {
            epoch,
            version,
            release,
        }
    }
}

impl Display for Evr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}-{}", self.version, self.release)
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.release.cmp(&other.release))
    }
}

/// A relational operator used in a [`crate::Reldep`] or version requirement.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
pub enum VersionComparison {
    /// `=` / `==`
    #[strum(serialize = "=")]
    Eq,
    /// `<`
    #[strum(serialize = "<")]
    Lt,
    /// `>`
    #[strum(serialize = ">")]
    Gt,
    /// `<=`
    #[strum(serialize = "<=")]
    Le,
    /// `>=`
    #[strum(serialize = ">=")]
    Ge,
    /// `!=`
    #[strum(serialize = "!=")]
    Ne,
    /// No comparison: any version satisfies.
    #[strum(serialize = "")]
    Any,
}

impl VersionComparison {
    /// Parses the comparison token used in reldep and subject grammars.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "=" | "==" => Some(Self::Eq),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            "!=" => Some(Self::Ne),
            "" => Some(Self::Any),
            _ => None,
        }
    }

    /// Returns `true` if `ordering` (candidate compared to requirement) satisfies `self`.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
            Self::Le => ordering != Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Ne => ordering != Ordering::Equal,
            Self::Any => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0", "1.1", Ordering::Less)]
    #[case("1.0", "1.0", Ordering::Equal)]
    #[case("1.0.1", "1.0", Ordering::Greater)]
    #[case("1.0a", "1.0b", Ordering::Less)]
    #[case("1.0~rc1", "1.0", Ordering::Less)]
    #[case("1.0~rc1", "1.0~rc2", Ordering::Less)]
    #[case("2", "10", Ordering::Less)]
    #[case("1.0009", "1.9", Ordering::Equal)]
    #[case("1.009", "1.5", Ordering::Greater)]
    fn rpmvercmp_cases(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(rpmvercmp(a, b), expected, "{a} vs {b}");
    }

    #[test]
    fn epoch_unset_sorts_below_any_set_value() {
        assert!(Epoch::UNSET < Epoch::new(0));
        assert_eq!(Epoch::UNSET.rpm_value(), Epoch::new(0).rpm_value());
    }

    #[test]
    fn evr_orders_by_epoch_then_version_then_release() {
        let a = Evr::new(0, VerString::new("1.0").unwrap(), VerString::new("1").unwrap());
        let b = Evr::new(1, VerString::new("0.1").unwrap(), VerString::new("1").unwrap());
        assert!(a < b);
    }
}

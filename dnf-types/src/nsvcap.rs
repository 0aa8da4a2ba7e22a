//! Module identifiers: `name[:stream[:version[:context]]][::arch][/profile]`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::{Error, Name};

/// Which of the 16 positional module-identifier forms a [`Nsvcap`] was parsed from.
///
/// Variant order matches the canonical `NSVCAP_FORM_REGEX` table this parser
/// is grounded on: most information-bearing form first, down to a bare name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
pub enum NsvcapForm {
    /// `name:stream:version:context::arch/profile`
    Nsvcap,
    /// `name:stream:version:context::arch`
    Nsvca,
    /// `name:stream:version::arch/profile`
    Nsvap,
    /// `name:stream:version::arch`
    Nsva,
    /// `name:stream::arch/profile`
    Nsap,
    /// `name:stream::arch`
    Nsa,
    /// `name:stream:version:context/profile`
    Nsvcp,
    /// `name:stream:version/profile`
    Nsvp,
    /// `name:stream:version:context`
    Nsvc,
    /// `name:stream:version`
    Nsv,
    /// `name:stream/profile`
    Nsp,
    /// `name:stream`
    Ns,
    /// `name::arch/profile`
    Nap,
    /// `name::arch`
    Na,
    /// `name/profile`
    Np,
    /// `name`
    N,
}

/// A parsed module (NSVCAP) identifier.
///
/// Every field past `name` is optional. `version` is a plain [`u64`] rather
/// than a sentinel-bearing signed type: absence is represented by `None`,
/// not by a negative "not set" value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nsvcap {
    /// The module name.
    pub name: Name,
    /// The module stream.
    pub stream: Option<String>,
    /// The module build version.
    pub version: Option<u64>,
    /// The module build context (a short content hash).
    pub context: Option<String>,
    /// The module architecture.
    pub arch: Option<String>,
    /// The module profile.
    pub profile: Option<String>,
    /// Which of the 16 positional forms this value was parsed from.
    pub form: NsvcapForm,
}

impl Nsvcap {
    /// Parses a module identifier string.
    ///
    /// Rather than trying 16 near-identical regexes, this exploits the fact
    /// that the 16 forms are mutually exclusive by construction of their
    /// delimiters: a profile (if present) is always introduced by the last
    /// `/` in the string; an arch (if present) is always introduced by a
    /// literal `::`; and whatever colon-delimited fields remain before that
    /// point are name, stream, version and context, in that positional
    /// order. Trying all 16 forms and picking the one that matches is
    /// therefore equivalent to this single structural decomposition.
    pub fn parse(input: &str) -> Result<Self, Error> {
        if input.is_empty() {
            return Err(Error::InvalidNsvcap(input.to_string()));
        }

        let (before_profile, profile) = match input.rsplit_once('/') {
            Some((base, "")) => (base, None),
            Some((base, profile)) => (base, Some(profile.to_string())),
            None => (input, None),
        };

        let (base, arch) = match before_profile.split_once("::") {
            Some((base, arch)) if !arch.is_empty() => (base, Some(arch.to_string())),
            Some(_) => return Err(Error::InvalidNsvcap(input.to_string())),
            None => (before_profile, None),
        };

        let mut fields = base.splitn(4, ':');
        let name_part = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidNsvcap(input.to_string()))?;
        let name = Name::new(name_part).map_err(|_| Error::InvalidNsvcap(input.to_string()))?;
        let stream = fields.next().map(str::to_string);
        let version = fields
            .next()
            .map(|v| v.parse::<u64>().map_err(|_| Error::InvalidModuleVersion(v.to_string())))
            .transpose()?;
        let context = fields.next().map(str::to_string);

        let form = form_for(stream.is_some(), version.is_some(), context.is_some(), arch.is_some(), profile.is_some());

        Ok(Nsvcap {
            name,
            stream,
            version,
            context,
            arch,
            profile,
            form,
        })
    }
}

fn form_for(has_stream: bool, has_version: bool, has_context: bool, has_arch: bool, has_profile: bool) -> NsvcapForm {
    use NsvcapForm::*;
    match (has_stream, has_version, has_context, has_arch, has_profile) {
        (true, true, true, true, true) => Nsvcap,
        (true, true, true, true, false) => Nsvca,
        (true, true, false, true, true) => Nsvap,
        (true, true, false, true, false) => Nsva,
        (true, false, false, true, true) => Nsap,
        (true, false, false, true, false) => Nsa,
        (true, true, true, false, true) => Nsvcp,
        (true, true, false, false, true) => Nsvp,
        (true, true, true, false, false) => Nsvc,
        (true, true, false, false, false) => Nsv,
        (true, false, false, false, true) => Nsp,
        (true, false, false, false, false) => Ns,
        (false, false, false, true, true) => Nap,
        (false, false, false, true, false) => Na,
        (false, false, false, false, true) => Np,
        (false, false, false, false, false) => N,
        // unreachable given the positional splitn(4, ':') feed, which can never
        // produce a context without a version or a version without a stream.
        _ => N,
    }
}

impl FromStr for Nsvcap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Nsvcap::parse(s)
    }
}

impl Display for Nsvcap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(stream) = &self.stream {
            write!(f, ":{stream}")?;
            if let Some(version) = &self.version {
                write!(f, ":{version}")?;
                if let Some(context) = &self.context {
                    write!(f, ":{context}")?;
                }
            }
        }
        if let Some(arch) = &self.arch {
            write!(f, "::{arch}")?;
        }
        if let Some(profile) = &self.profile {
            write!(f, "/{profile}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("postgresql", NsvcapForm::N)]
    #[case("postgresql/server", NsvcapForm::Np)]
    #[case("postgresql:10", NsvcapForm::Ns)]
    #[case("postgresql:10/server", NsvcapForm::Nsp)]
    #[case("postgresql:10:20190425103920", NsvcapForm::Nsv)]
    #[case("postgresql:10:20190425103920:c0ffee", NsvcapForm::Nsvc)]
    #[case("postgresql:10:20190425103920/server", NsvcapForm::Nsvp)]
    #[case("postgresql:10:20190425103920:c0ffee/server", NsvcapForm::Nsvcp)]
    #[case("postgresql::x86_64", NsvcapForm::Na)]
    #[case("postgresql::x86_64/server", NsvcapForm::Nap)]
    #[case("postgresql:10::x86_64", NsvcapForm::Nsa)]
    #[case("postgresql:10::x86_64/server", NsvcapForm::Nsap)]
    #[case("postgresql:10:20190425103920::x86_64", NsvcapForm::Nsva)]
    #[case("postgresql:10:20190425103920::x86_64/server", NsvcapForm::Nsvap)]
    #[case("postgresql:10:20190425103920:c0ffee::x86_64", NsvcapForm::Nsvca)]
    #[case("postgresql:10:20190425103920:c0ffee::x86_64/server", NsvcapForm::Nsvcap)]
    fn parses_all_sixteen_forms(#[case] input: &str, #[case] expected_form: NsvcapForm) {
        let parsed = Nsvcap::parse(input).unwrap();
        assert_eq!(parsed.form, expected_form);
        assert_eq!(parsed.name.as_str(), "postgresql");
    }

    #[test]
    fn rejects_empty_arch_after_double_colon() {
        assert!(Nsvcap::parse("postgresql::").is_err());
    }
}

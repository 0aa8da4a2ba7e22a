//! The NEVRA (name-epoch-version-release-arch) package identity tuple and its
//! subject-parsing "possibility" forms.

use std::fmt::{self, Display, Formatter};

use crate::{Arch, Epoch, Error, Evr, Name, VerString};

/// Which of the five NEVRA forms a [`Nevra`] was parsed as, or is being
/// proposed as a possibility for.
///
/// Order here is deliberately the literal, most-specific-first order used
/// throughout the NEVRA subject grammar: `NEVRA`, `NA`, `NAME`, `NEVR`,
/// `NEV`. This is the order [`Nevra::possibilities`] yields candidates in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
pub enum NevraForm {
    /// `name-epoch:version-release.arch`
    Nevra,
    /// `name.arch`
    Na,
    /// `name`
    Name,
    /// `name-epoch:version-release`
    Nevr,
    /// `name-epoch:version`
    Nev,
}

/// A parsed `name-[epoch:]version-release.arch` package identity.
///
/// Every field but `name` is optional: a [`Nevra`] parsed from a bare name,
/// or from one of the other four forms, leaves the remaining fields unset.
/// This is distinct from [`Evr`], which always carries fully-resolved
/// version information for an interned solvable.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nevra {
    /// The package name.
    pub name: Name,
    /// The package epoch, if the input specified one.
    pub epoch: Epoch,
    /// The upstream version, if the input specified one.
    pub version: Option<VerString>,
    /// The packager release, if the input specified one.
    pub release: Option<VerString>,
    /// The architecture, if the input specified one.
    pub arch: Option<Arch>,
    /// Which grammar form this value was produced from.
    pub form: NevraForm,
}

impl Nevra {
    /// Parses `input` against a single named NEVRA form.
    ///
    /// This never guesses: callers that do not already know which form
    /// applies should use [`Nevra::possibilities`] instead.
    pub fn parse_as(input: &str, form: NevraForm) -> Result<Self, Error> {
        match form {
            NevraForm::Name => {
                let name = Name::new(input)?;
                Ok(Nevra {
                    name,
                    epoch: Epoch::UNSET,
                    version: None,
                    release: None,
                    arch: None,
                    form,
                })
            }
            NevraForm::Na => {
                let (name_part, arch_part) = input
                    .rsplit_once('.')
                    .ok_or_else(|| Error::InvalidNevra(input.to_string()))?;
                Ok(Nevra {
                    name: Name::new(name_part)?,
                    epoch: Epoch::UNSET,
                    version: None,
                    release: None,
                    arch: Some(Arch::new(arch_part)?),
                    form,
                })
            }
            NevraForm::Nevra => {
                let (rest, arch_part) = input
                    .rsplit_once('.')
                    .ok_or_else(|| Error::InvalidNevra(input.to_string()))?;
                let (name, epoch, version, release) = split_n_evr(rest, input)?;
                Ok(Nevra {
                    name,
                    epoch,
                    version: Some(version),
                    release: Some(release),
                    arch: Some(Arch::new(arch_part)?),
                    form,
                })
            }
            NevraForm::Nevr => {
                let (name, epoch, version, release) = split_n_evr(input, input)?;
                Ok(Nevra {
                    name,
                    epoch,
                    version: Some(version),
                    release: Some(release),
                    arch: None,
                    form,
                })
            }
            NevraForm::Nev => {
                let (name_part, ev_part) = input
                    .rsplit_once('-')
                    .ok_or_else(|| Error::InvalidNevra(input.to_string()))?;
                let (epoch, version) = split_epoch_version(ev_part)?;
                Ok(Nevra {
                    name: Name::new(name_part)?,
                    epoch,
                    version: Some(version),
                    release: None,
                    arch: None,
                    form,
                })
            }
        }
    }

    /// Enumerates every NEVRA form `input` could plausibly be, in
    /// most-specific-first order: `NEVRA`, `NA`, `NAME`, `NEVR`, `NEV`.
    ///
    /// A caller (typically the subject resolver) tries each possibility in
    /// turn against the sack until one resolves to a real package.
    pub fn possibilities(input: &str) -> Vec<Nevra> {
        [
            NevraForm::Nevra,
            NevraForm::Na,
            NevraForm::Name,
            NevraForm::Nevr,
            NevraForm::Nev,
        ]
        .into_iter()
        .filter_map(|form| Nevra::parse_as(input, form).ok())
        .collect()
    }
}

/// Splits `rest` (the name-epoch:version-release portion with arch already
/// removed, if any) into its name/epoch/version/release parts.
fn split_n_evr(rest: &str, whole: &str) -> Result<(Name, Epoch, VerString, VerString), Error> {
    let (name_and_ev, release_part) = rest
        .rsplit_once('-')
        .ok_or_else(|| Error::InvalidNevra(whole.to_string()))?;
    let (name_part, ev_part) = name_and_ev
        .rsplit_once('-')
        .ok_or_else(|| Error::InvalidNevra(whole.to_string()))?;
    let (epoch, version) = split_epoch_version(ev_part)?;
    let release = VerString::new(release_part).map_err(|_| Error::InvalidNevra(whole.to_string()))?;
    Ok((Name::new(name_part)?, epoch, version, release))
}

/// Splits an `[epoch:]version` token.
fn split_epoch_version(ev_part: &str) -> Result<(Epoch, VerString), Error> {
    match ev_part.split_once(':') {
        Some((epoch_part, version_part)) => {
            let epoch = epoch_part
                .parse::<Epoch>()
                .map_err(|_| Error::InvalidNevra(ev_part.to_string()))?;
            let version =
                VerString::new(version_part).map_err(|_| Error::InvalidNevra(ev_part.to_string()))?;
            Ok((epoch, version))
        }
        None => {
            let version = VerString::new(ev_part).map_err(|_| Error::InvalidNevra(ev_part.to_string()))?;
            Ok((Epoch::UNSET, version))
        }
    }
}

impl Display for Nevra {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "-")?;
            if !self.epoch.is_unset() {
                write!(f, "{}:", self.epoch)?;
            }
            write!(f, "{version}")?;
            if let Some(release) = &self.release {
                write!(f, "-{release}")?;
            }
        }
        if let Some(arch) = &self.arch {
            write!(f, ".{arch}")?;
        }
        Ok(())
    }
}

/// Compares a [`Nevra`]'s version fields against a fully-resolved [`Evr`].
///
/// Per the unset-epoch comparison rule (see [`Epoch::rpm_value`]), a `Nevra`
/// with no epoch is treated as epoch `0` here, not as "less than anything".
pub fn nevra_evr_matches(nevra: &Nevra, evr: &Evr) -> bool {
    let epoch_matches = nevra.epoch.rpm_value() == evr.epoch;
    let version_matches = nevra
        .version
        .as_ref()
        .is_none_or(|v| v == &evr.version);
    let release_matches = nevra
        .release
        .as_ref()
        .is_none_or(|r| r == &evr.release);
    epoch_matches && version_matches && release_matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_nevra() {
        let n = Nevra::parse_as("foo-1:2.0-3.fc40.x86_64", NevraForm::Nevra).unwrap();
        assert_eq!(n.name.as_str(), "foo");
        assert_eq!(n.epoch, Epoch::new(1));
        assert_eq!(n.version.unwrap().as_str(), "2.0");
        assert_eq!(n.release.unwrap().as_str(), "3.fc40");
        assert_eq!(n.arch.unwrap().as_str(), "x86_64");
    }

    #[test]
    fn parses_bare_name() {
        let n = Nevra::parse_as("glibc", NevraForm::Name).unwrap();
        assert_eq!(n.name.as_str(), "glibc");
        assert!(n.version.is_none());
    }

    #[test]
    fn possibilities_are_most_specific_first() {
        let forms: Vec<NevraForm> = Nevra::possibilities("foo-1.0-1.x86_64")
            .into_iter()
            .map(|n| n.form)
            .collect();
        assert_eq!(forms.first(), Some(&NevraForm::Nevra));
    }

    #[test]
    fn bare_name_possibility_list_contains_name_form() {
        let forms: Vec<NevraForm> = Nevra::possibilities("glibc").into_iter().map(|n| n.form).collect();
        assert!(forms.contains(&NevraForm::Name));
    }
}

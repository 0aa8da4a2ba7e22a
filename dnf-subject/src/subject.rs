use dnf_common::Error;
use dnf_query::{ComparisonKind, Filter, FilterKey, FilterValue, Query};
use dnf_sack::Sack;
use dnf_types::{Nevra, NevraForm, Nsvcap, NsvcapForm, Reldep};

/// A raw, user-supplied string awaiting structured interpretation.
///
/// Parsing a [`Subject`] never fails: every possibility method simply yields
/// fewer candidates (possibly none) for a string that matches no grammar.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subject(String);

impl Subject {
    /// Wraps a raw string as a subject.
    pub fn new(input: impl Into<String>) -> Self {
        Subject(input.into())
    }

    /// Returns the raw subject string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Enumerates every NEVRA interpretation of this subject, most specific
    /// first (`NEVRA`, `NA`, `NAME`, `NEVR`, `NEV`).
    ///
    /// If `forms` is given, only those forms are considered. If `sack` is
    /// given, a candidate is kept only if its name actually exists there
    /// (glob-aware) and its architecture is either `src` or one the sack's
    /// considered solvables actually carry; the sack's considered set must
    /// already be fresh (see [`Sack::make_considered_ready`]).
    pub fn nevra_possibilities(&self, forms: Option<&[NevraForm]>, sack: Option<&Sack>) -> Vec<Nevra> {
        Nevra::possibilities(&self.0)
            .into_iter()
            .filter(|n| forms.is_none_or(|forms| forms.contains(&n.form)))
            .filter(|n| sack.is_none_or(|sack| is_real_nevra(sack, n)))
            .collect()
    }

    /// Enumerates the module-identifier interpretation(s) of this subject,
    /// most specific first.
    ///
    /// The module grammar's 16 positional forms are mutually exclusive by
    /// construction (see [`Nsvcap::parse`]), so there is at most one
    /// possibility, unlike the overlapping NEVRA forms; this still returns a
    /// `Vec` to keep the same shape as [`Subject::nevra_possibilities`].
    pub fn module_form_possibilities(&self, forms: Option<&[NsvcapForm]>, sack: Option<&Sack>) -> Vec<Nsvcap> {
        Nsvcap::parse(&self.0)
            .into_iter()
            .filter(|n| forms.is_none_or(|forms| forms.contains(&n.form)))
            .filter(|n| sack.is_none_or(|sack| is_real_module_name(sack, n)))
            .collect()
    }
}

fn is_real_nevra(sack: &Sack, nevra: &Nevra) -> bool {
    if let Some(arch) = &nevra.arch {
        if !arch.is_src() && !sack.known_arches().contains(arch.as_str()) {
            return false;
        }
    }
    name_exists(sack, nevra.name.as_str())
}

fn is_real_module_name(sack: &Sack, nsvcap: &Nsvcap) -> bool {
    name_exists(sack, nsvcap.name.as_str())
}

fn name_exists(sack: &Sack, name: &str) -> bool {
    let Ok(filter) = Filter::new(FilterKey::Name, ComparisonKind::Glob, FilterValue::Str(name.to_string())) else {
        return false;
    };
    !Query::new(sack).filter(filter).run().is_empty()
}

fn nevra_query<'a>(sack: &'a Sack, nevra: &Nevra) -> Result<Query<'a>, Error> {
    let mut query = Query::new(sack).filter(Filter::new(
        FilterKey::Name,
        ComparisonKind::Eq,
        FilterValue::Str(nevra.name.as_str().to_string()),
    )?);
    if let Some(arch) = &nevra.arch {
        query = query.filter(Filter::new(FilterKey::Arch, ComparisonKind::Eq, FilterValue::Str(arch.as_str().to_string()))?);
    }
    if !nevra.epoch.is_unset() {
        query = query.filter(Filter::new(FilterKey::Epoch, ComparisonKind::Eq, FilterValue::Num(nevra.epoch.rpm_value() as i64))?);
    }
    if let Some(version) = &nevra.version {
        query = query.filter(Filter::new(FilterKey::Version, ComparisonKind::Eq, FilterValue::Str(version.as_str().to_string()))?);
    }
    if let Some(release) = &nevra.release {
        query = query.filter(Filter::new(FilterKey::Release, ComparisonKind::Eq, FilterValue::Str(release.as_str().to_string()))?);
    }
    Ok(query)
}

fn empty_query(sack: &Sack) -> Result<Query<'_>, Error> {
    Ok(Query::new(sack).filter(Filter::new(FilterKey::Empty, ComparisonKind::Eq, FilterValue::Bool(true))?))
}

/// Resolves `subject` to a query, per §4.6: tries each NEVRA possibility
/// (filtered for realness against `sack`) in order, then a `provides` match,
/// then (if `with_filenames`) a file-location match; returns an empty query
/// rather than erroring if nothing matches.
///
/// `sack`'s considered set must already be fresh.
pub fn get_best_solution<'a>(
    subject: &Subject,
    sack: &'a Sack,
    forms: Option<&[NevraForm]>,
    with_nevra: bool,
    with_provides: bool,
    with_filenames: bool,
) -> Result<Query<'a>, Error> {
    if with_nevra {
        for nevra in subject.nevra_possibilities(forms, Some(sack)) {
            let query = nevra_query(sack, &nevra)?;
            if !query.run().is_empty() {
                return Ok(query);
            }
        }
    }

    if with_provides {
        let query = Query::new(sack).filter(Filter::new(
            FilterKey::Provides,
            ComparisonKind::Eq,
            FilterValue::Reldep(Reldep::unconstrained(subject.as_str())),
        )?);
        if !query.run().is_empty() {
            return Ok(query);
        }
    }

    if with_filenames {
        // `FilterKey::File` never matches in this workspace (filelists are not
        // solvable-indexed); `location` is the closest available per-solvable
        // file-path field.
        let query = Query::new(sack).filter(Filter::new(
            FilterKey::Location,
            ComparisonKind::Substr,
            FilterValue::Str(subject.as_str().to_string()),
        )?);
        if !query.run().is_empty() {
            return Ok(query);
        }
    }

    empty_query(sack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnf_sack::{InMemoryMetadataSource, LoadFlags, SolvableRecord};
    use testresult::TestResult;

    fn record(name: &str, arch: &str) -> SolvableRecord {
        SolvableRecord {
            name: name.to_string(),
            version: "1.0".to_string(),
            release: "1".to_string(),
            arch: arch.to_string(),
            ..SolvableRecord::default()
        }
    }

    #[test]
    fn nevra_possibilities_are_most_specific_first() {
        let subject = Subject::new("foo-1.0-1.x86_64");
        let forms: Vec<NevraForm> = subject.nevra_possibilities(None, None).into_iter().map(|n| n.form).collect();
        assert_eq!(forms.first(), Some(&NevraForm::Nevra));
    }

    #[test]
    fn real_filtering_drops_names_absent_from_the_sack() -> TestResult {
        let mut sack = Sack::new();
        let source = InMemoryMetadataSource::new("cksum", vec![record("curl", "x86_64")]);
        sack.load_repo("fedora", &source, LoadFlags::default())?;
        sack.make_considered_ready();

        let subject = Subject::new("curl-1.0-1.x86_64");
        assert!(!subject.nevra_possibilities(None, Some(&sack)).is_empty());

        let missing = Subject::new("nonexistent-1.0-1.x86_64");
        assert!(missing.nevra_possibilities(None, Some(&sack)).is_empty());
        Ok(())
    }

    #[test]
    fn get_best_solution_falls_back_to_provides() -> TestResult {
        let mut sack = Sack::new();
        let mut pkg = record("bar", "x86_64");
        pkg.provides = vec!["webserver".to_string()];
        let source = InMemoryMetadataSource::new("cksum", vec![pkg]);
        sack.load_repo("fedora", &source, LoadFlags::default())?;
        sack.make_considered_ready();

        let subject = Subject::new("webserver");
        let query = get_best_solution(&subject, &sack, None, true, true, false)?;
        assert_eq!(query.run().len(), 1);
        Ok(())
    }

    #[test]
    fn get_best_solution_returns_empty_query_on_no_match() -> TestResult {
        let sack = Sack::new();
        let subject = Subject::new("nothing-at-all");
        let query = get_best_solution(&subject, &sack, None, true, true, true)?;
        assert!(query.run().is_empty());
        Ok(())
    }
}

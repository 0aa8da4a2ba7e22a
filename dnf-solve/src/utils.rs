//! Small free functions shared by the provider and the goal driver: the
//! reldep-evr parser and the candidate tie-break comparator.

use std::cmp::Ordering;
use std::collections::HashSet;

use dnf_common::Error;
use dnf_sack::{Sack, SolvableId};
use dnf_types::VerString;
use resolvo::utils::Pool;
use resolvo::SolvableId as ResolvoSolvableId;

use crate::types::{CandidateRecord, DepSpec};

/// Splits a reldep's raw `evr` string (`"1:2.34-1"`, `"2.34-1"`, or just
/// `"2.34"`) into `(epoch, version, release)`, leaving `release` unset when
/// the string didn't carry one.
///
/// Mirrors the split used by [`dnf_types::Nevra`] parsing, generalized to
/// tolerate a missing release since reldeps (unlike full NEVRAs) routinely
/// omit it.
pub fn parse_partial_evr(text: &str) -> Result<(u32, VerString, Option<VerString>), Error> {
    let (epoch_and_version, release) = match text.rsplit_once('-') {
        Some((ev, rel)) => (ev, Some(VerString::new(rel)?)),
        None => (text, None),
    };
    let (epoch, version) = match epoch_and_version.split_once(':') {
        Some((epoch, version)) => (epoch.parse::<u32>().unwrap_or(0), version),
        None => (0, epoch_and_version),
    };
    Ok((epoch, VerString::new(version)?, release))
}

/// Orders candidates for a given name the way the solver should prefer them:
/// locked or soft-locked (already installed) first, then the highest
/// version, then native over compatible over `noarch`, then the System repo
/// over any configured repo (ties broken by repo priority), and finally real
/// packages over the virtual provides that happen to share a version.
pub fn sort_candidates(sack: &Sack, pool: &Pool<DepSpec, String>, installed_names: &HashSet<String>, solvables: &mut [ResolvoSolvableId]) {
    solvables.sort_by(|&a, &b| {
        let record_a = &pool.resolve_solvable(a).record;
        let record_b = &pool.resolve_solvable(b).record;
        soft_locked(sack, installed_names, record_a)
            .cmp(&soft_locked(sack, installed_names, record_b))
            .then_with(|| record_a.version(sack).cmp(&record_b.version(sack)))
            .then_with(|| arch_rank(sack, record_a).cmp(&arch_rank(sack, record_b)))
            .then_with(|| repo_priority(sack, record_a).cmp(&repo_priority(sack, record_b)))
            .then_with(|| is_real(record_a).cmp(&is_real(record_b)))
            .reverse()
    });
}

fn soft_locked(sack: &Sack, installed_names: &HashSet<String>, record: &CandidateRecord) -> bool {
    installed_names.contains(sack.solvable(record.owner()).name.as_str())
}

fn is_real(record: &CandidateRecord) -> bool {
    !record.is_virtual()
}

fn arch_rank(sack: &Sack, record: &CandidateRecord) -> u8 {
    let owner = sack.solvable(record.owner());
    dnf_query::arch_preference(sack, owner.arch.as_str())
}

fn repo_priority(sack: &Sack, record: &CandidateRecord) -> i32 {
    let owner = sack.solvable(record.owner());
    let repo = &sack.repos()[owner.source_repo_id.index()];
    if repo.is_system() {
        i32::MAX
    } else {
        repo.priority
    }
}

/// Resolves `id` to the name of its sack solvable, used to translate a set
/// of exclude/lock/favor targets into the names a provider keys decisions by.
pub fn solvable_name(sack: &Sack, id: SolvableId) -> String {
    sack.solvable(id).name.as_str().to_string()
}

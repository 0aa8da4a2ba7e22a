//! Turns a raw resolvo solution back into a name-sorted, explainable list of
//! package actions, diffed against what was installed before the goal ran.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use dnf_sack::SolvableId;
use dnf_types::Reldep;
use resolvo::SolvableId as ResolvoSolvableId;

use crate::provider::DnfDependencyProvider;
use crate::types::CandidateRecord;

/// One action the transaction executor must perform for a single package,
/// per §4.4's action classification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedAction {
    /// A package not previously installed must be installed.
    Install {
        /// The package to install.
        id: SolvableId,
    },
    /// An installed package must be upgraded to a newer EVR.
    Upgraded {
        /// The new package to install.
        to: SolvableId,
        /// The installed package it replaces.
        from: SolvableId,
    },
    /// An installed package must be downgraded to an older EVR.
    Downgraded {
        /// The new package to install.
        to: SolvableId,
        /// The installed package it replaces.
        from: SolvableId,
    },
    /// An installed package must be removed because another chosen package
    /// conflicts with it or obsoletes it.
    Removed {
        /// The installed package being removed.
        id: SolvableId,
        /// The `Conflicts`/`Obsoletes` declarations (from packages in the
        /// new state) that forced this removal, flagged `true` when the
        /// relation is an obsoletion rather than a plain conflict.
        forced_by: HashMap<Reldep, bool>,
    },
    /// An installed package is no longer required by anything in the new
    /// state but wasn't forced out by a conflict; left in place unless the
    /// caller requested `clean_deps`/`ALLOW_UNINSTALL` handling.
    NoLongerRequired {
        /// The installed package.
        id: SolvableId,
    },
    /// An installed package stays exactly as it is.
    Unchanged {
        /// The installed package.
        id: SolvableId,
    },
}

impl ResolvedAction {
    /// The package this action concerns: the new package for installs and
    /// upgrades/downgrades, the installed one otherwise.
    pub fn package(&self) -> SolvableId {
        match *self {
            ResolvedAction::Install { id } => id,
            ResolvedAction::Upgraded { to, .. } => to,
            ResolvedAction::Downgraded { to, .. } => to,
            ResolvedAction::Removed { id, .. } => id,
            ResolvedAction::NoLongerRequired { id } => id,
            ResolvedAction::Unchanged { id } => id,
        }
    }

    /// `false` for [`ResolvedAction::Unchanged`] and
    /// [`ResolvedAction::NoLongerRequired`], which need no transaction step.
    pub fn is_required(&self) -> bool {
        !matches!(self, ResolvedAction::Unchanged { .. } | ResolvedAction::NoLongerRequired { .. })
    }
}

impl Display for ResolvedAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedAction::Install { id } => write!(f, "install {id:?}"),
            ResolvedAction::Upgraded { to, from } => write!(f, "upgrade {from:?} -> {to:?}"),
            ResolvedAction::Downgraded { to, from } => write!(f, "downgrade {from:?} -> {to:?}"),
            ResolvedAction::Removed { id, forced_by } => write!(f, "remove {id:?} ({} conflicting relation(s))", forced_by.len()),
            ResolvedAction::NoLongerRequired { id } => write!(f, "{id:?} no longer required"),
            ResolvedAction::Unchanged { id } => write!(f, "{id:?} unchanged"),
        }
    }
}

/// Diffs `raw_solution` (every real, resolvo-chosen solvable) against the
/// system repo's installed set, classifying each package per §4.4.
pub(crate) fn diff(provider: &DnfDependencyProvider<'_>, installed: &[SolvableId], raw_solution: &[ResolvoSolvableId]) -> Vec<ResolvedAction> {
    let mut remaining: Vec<SolvableId> = installed.to_vec();
    let mut actions = Vec::new();
    let mut new_names = HashMap::new();

    for &resolvo_id in raw_solution {
        let record = &provider.pool.resolve_solvable(resolvo_id).record;
        let CandidateRecord::Real(new_id) = record else {
            continue;
        };
        let new_solvable = provider.sack.solvable(*new_id);

        let matched = remaining.iter().position(|&old_id| provider.sack.solvable(old_id).name == new_solvable.name);
        match matched {
            Some(index) => {
                let old_id = remaining.remove(index);
                let old_solvable = provider.sack.solvable(old_id);
                actions.push(match new_solvable.evr.cmp(&old_solvable.evr) {
                    std::cmp::Ordering::Equal => ResolvedAction::Unchanged { id: old_id },
                    std::cmp::Ordering::Greater => ResolvedAction::Upgraded { to: *new_id, from: old_id },
                    std::cmp::Ordering::Less => ResolvedAction::Downgraded { to: *new_id, from: old_id },
                });
            }
            None => {
                actions.push(ResolvedAction::Install { id: *new_id });
            }
        }
        new_names.insert(new_solvable.name.as_str().to_string(), ());
    }

    for old_id in remaining {
        let old_solvable = provider.sack.solvable(old_id);
        let own_relation = Reldep::unconstrained(old_solvable.name.as_str());
        let own_exact = Reldep::constrained(old_solvable.name.as_str(), dnf_types::VersionComparison::Eq, old_solvable.evr.to_string());

        let mut forced_by: HashMap<Reldep, bool> = HashMap::new();
        for key in [&own_relation, &own_exact] {
            if let Some(declarers) = provider.conflicts_map.get(key) {
                for (declarer, is_obsolete) in declarers {
                    if new_names.contains_key(&declarer_name(declarer)) {
                        forced_by.insert(declarer.clone(), *is_obsolete);
                    }
                }
            }
        }

        actions.push(if forced_by.is_empty() {
            ResolvedAction::NoLongerRequired { id: old_id }
        } else {
            ResolvedAction::Removed { id: old_id, forced_by }
        });
    }

    actions.sort_by_key(|action| provider.sack.solvable(action.package()).name.clone());
    actions
}

fn declarer_name(declarer: &Reldep) -> String {
    declarer.name.clone()
}

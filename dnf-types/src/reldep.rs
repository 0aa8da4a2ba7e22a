//! `name[ op evr]` relational dependency expressions, e.g. `libc.so.6(GLIBC_2.2.5)(64bit)`
//! or `glibc >= 2.34`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use winnow::ascii::space0;
use winnow::combinator::{alt, opt, preceded};
use winnow::token::take_while;
use winnow::Parser;

use crate::{Error, VersionComparison};

/// A single relational dependency: a provided/required name, optionally
/// constrained by a version comparison.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Reldep {
    /// The dependency name (a package name, a virtual `Provides`, or a rich-dep string).
    pub name: String,
    /// The comparison operator, [`VersionComparison::Any`] if the reldep is unconstrained.
    pub comparison: VersionComparison,
    /// The comparison target, e.g. `2.34` or `1:2.34-1`. Empty when `comparison` is `Any`.
    pub evr: String,
}

impl Reldep {
    /// Creates an unconstrained reldep (bare name, any version satisfies).
    pub fn unconstrained(name: impl Into<String>) -> Self {
        Reldep {
            name: name.into(),
            comparison: VersionComparison::Any,
            evr: String::new(),
        }
    }

    /// Creates a version-constrained reldep.
    pub fn constrained(name: impl Into<String>, comparison: VersionComparison, evr: impl Into<String>) -> Self {
        Reldep {
            name: name.into(),
            comparison,
            evr: evr.into(),
        }
    }
}

fn op_token(input: &mut &str) -> winnow::Result<VersionComparison> {
    alt(("<=", ">=", "==", "!=", "<", ">", "="))
        .parse_next(input)
        .map(|tok| VersionComparison::parse_token(tok).expect("token set matches parse_token arms"))
}

fn reldep_parser(input: &mut &str) -> winnow::Result<Reldep> {
    let name: &str = take_while(1.., |c: char| !c.is_whitespace() && !matches!(c, '<' | '>' | '=' | '!'))
        .parse_next(input)?;
    let rest = opt(preceded((space0, ), (op_token, space0, take_while(1.., |c: char| !c.is_whitespace()))))
        .parse_next(input)?;
    Ok(match rest {
        Some((comparison, _, evr)) => Reldep::constrained(name, comparison, evr),
        None => Reldep::unconstrained(name),
    })
}

impl FromStr for Reldep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidReldep(s.to_string()));
        }
        let mut input = trimmed;
        reldep_parser(&mut input).map_err(|_| Error::InvalidReldep(s.to_string()))
    }
}

impl Display for Reldep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.comparison {
            VersionComparison::Any => write!(f, "{}", self.name),
            _ => write!(f, "{} {} {}", self.name, self.comparison, self.evr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("glibc", "glibc", VersionComparison::Any, "")]
    #[case("glibc >= 2.34", "glibc", VersionComparison::Ge, "2.34")]
    #[case("glibc>=2.34", "glibc", VersionComparison::Ge, "2.34")]
    #[case("foo = 1:2.0-3", "foo", VersionComparison::Eq, "1:2.0-3")]
    fn parses_reldeps(#[case] input: &str, #[case] name: &str, #[case] cmp: VersionComparison, #[case] evr: &str) {
        let r: Reldep = input.parse().unwrap();
        assert_eq!(r.name, name);
        assert_eq!(r.comparison, cmp);
        assert_eq!(r.evr, evr);
    }

    #[test]
    fn rejects_empty() {
        assert!("".parse::<Reldep>().is_err());
    }
}

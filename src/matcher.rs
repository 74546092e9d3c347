//! Tag selection strategies
//!
//! A [`TagMatcher`] decides whether a tag name takes part in a bulk listing
//! or deletion. Construction validates the configuration up front, so
//! [`TagMatcher::matches`] is total: malformed tag names simply do not match.
//!
//! Version ranges compare by SemVer 2.0.0 precedence alone. Unlike Cargo
//! requirements, `<2.0.0` includes `1.5.0-3` and `2.0.0-0`.

use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{ReleaseError, Result};

/// Predicate over tag names
#[derive(Debug, Clone)]
pub enum TagMatcher {
    /// Tag name is a member of a fixed set
    Exact(HashSet<String>),

    /// Tag name matches any of the expressions (unanchored)
    Regex(Vec<Regex>),

    /// Tag name, minus an optional leading `v`, is a version inside any of the ranges
    SemVer(Vec<VersionRange>),
}

impl TagMatcher {
    /// Match tags by literal name
    pub fn exact<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagMatcher::Exact(tags.into_iter().map(Into::into).collect())
    }

    /// Match tags by regular expressions, OR-ed together
    pub fn regex<I, S>(expressions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let regexps = expressions
            .into_iter()
            .map(|expr| {
                let expr = expr.as_ref();
                Regex::new(expr).map_err(|source| ReleaseError::InvalidPattern {
                    pattern: expr.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TagMatcher::Regex(regexps))
    }

    /// Match tags by semantic-version ranges, OR-ed together
    ///
    /// Each range string may itself hold `||`-separated alternatives.
    /// Comparators inside an alternative are AND-ed and may be separated by
    /// whitespace or commas (`>=1.0.0 <2.0.0`). A bare version means `=`.
    pub fn semver<I, S>(ranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut alternatives = Vec::new();
        for range in ranges {
            let range = range.as_ref();
            for alternative in range.split("||") {
                let parsed = VersionRange::parse(alternative).map_err(|reason| ReleaseError::InvalidRange {
                    range: range.to_string(),
                    reason,
                })?;
                alternatives.push(parsed);
            }
        }
        Ok(TagMatcher::SemVer(alternatives))
    }

    /// Whether `tag` is selected by this matcher
    pub fn matches(&self, tag: &str) -> bool {
        match self {
            TagMatcher::Exact(tags) => tags.contains(tag),
            TagMatcher::Regex(regexps) => regexps.iter().any(|re| re.is_match(tag)),
            TagMatcher::SemVer(ranges) => match parse_tag_version(tag) {
                Some(version) => ranges.iter().any(|range| range.contains(&version)),
                None => false,
            },
        }
    }

    /// Short name of the strategy for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            TagMatcher::Exact(_) => "exact",
            TagMatcher::Regex(_) => "regex",
            TagMatcher::SemVer(_) => "semver",
        }
    }
}

/// Parse a tag as SemVer 2.0.0 after stripping a single leading `v`
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    // Longest operators first so ">=" is not read as ">"
    const SYMBOLS: [(&'static str, Op); 8] = [
        (">=", Op::Ge),
        ("<=", Op::Le),
        ("!=", Op::Ne),
        ("==", Op::Eq),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("=", Op::Eq),
        ("!", Op::Ne),
    ];

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn parse(token: &str) -> std::result::Result<Self, String> {
        let (op, rest) = Op::SYMBOLS
            .iter()
            .find_map(|(symbol, op)| token.strip_prefix(*symbol).map(|rest| (*op, rest)))
            .unwrap_or((Op::Eq, token));
        let version = Version::parse(rest).map_err(|e| format!("'{}': {}", token, e))?;
        Ok(Self { op, version })
    }

    fn accepts(&self, version: &Version) -> bool {
        self.op.accepts(precedence(version, &self.version))
    }
}

/// A set of comparators that must all hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    comparators: Vec<Comparator>,
}

impl VersionRange {
    /// Parse one `||`-free alternative such as `>= 1.0.0, <2.0.0-0`
    fn parse(alternative: &str) -> std::result::Result<Self, String> {
        let mut comparators = Vec::new();
        let mut pending_op = String::new();

        for token in alternative.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            // Operator written apart from its version, e.g. ">= 1.0.0"
            if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '!')) {
                pending_op.push_str(token);
                continue;
            }
            let token = format!("{}{}", std::mem::take(&mut pending_op), token);
            comparators.push(Comparator::parse(&token)?);
        }

        if !pending_op.is_empty() {
            return Err(format!("operator '{}' has no version", pending_op));
        }
        if comparators.is_empty() {
            return Err("empty range".to_string());
        }
        Ok(Self { comparators })
    }

    /// Whether `version` satisfies every comparator
    pub fn contains(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.accepts(version))
    }
}

/// SemVer 2.0.0 precedence; build metadata is ignored
fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

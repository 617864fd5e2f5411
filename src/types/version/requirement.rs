use super::{parse_version, PkgVersion};
use anyhow::{bail, format_err, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::*,
    combinator::eof,
    error::{context, ErrorKind, ParseError},
    multi::separated_list0,
    sequence::*,
    IResult,
};
use std::cmp::Ordering::*;
use std::convert::TryFrom;
use std::fmt;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Comparator {
    Compatible,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Specifier {
    Compare(Comparator, PkgVersion),
    /// `==X.*` or, if negated, `!=X.*`
    Wildcard { negated: bool, prefix: PkgVersion },
    /// `===string`
    Arbitrary(String),
}

impl Specifier {
    /// Check if a PkgVersion satisfies this single clause
    pub fn within(&self, ver: &PkgVersion) -> bool {
        match self {
            Specifier::Compare(op, target) => match op {
                Comparator::Equal => version_equal(ver, target),
                Comparator::NotEqual => !version_equal(ver, target),
                Comparator::LessEqual => ver <= target,
                Comparator::GreaterEqual => ver >= target,
                Comparator::Less => ver < target,
                Comparator::Greater => ver > target,
                Comparator::Compatible => {
                    let prefix_len = target.release.len() - 1;
                    ver >= target && ver.has_release_prefix(target.epoch, &target.release[..prefix_len])
                }
            },
            Specifier::Wildcard { negated, prefix } => {
                let matched = ver.has_release_prefix(prefix.epoch, &prefix.release);
                matched != *negated
            }
            Specifier::Arbitrary(s) => ver.to_string().eq_ignore_ascii_case(s),
        }
    }
}

/// `==` ignores the candidate's local label unless the target has one
fn version_equal(ver: &PkgVersion, target: &PkgVersion) -> bool {
    if target.local.is_empty() {
        ver.base() == *target
    } else {
        ver == target
    }
}

/// Bounds derived from a set of specifiers. The bool represents if the bound is inclusive.
#[derive(Debug, Default, Clone)]
pub struct Bounds {
    pub lower: Option<(PkgVersion, bool)>,
    pub upper: Option<(PkgVersion, bool)>,
    pub excluded: Vec<Specifier>,
    pub arbitrary: Vec<String>,
}

impl Bounds {
    fn tighten_lower(&mut self, new: (PkgVersion, bool)) {
        match &self.lower {
            Some(this) => {
                if this.0 < new.0 || (this.0 == new.0 && this.1 && !new.1) {
                    // Either new is stricter than this (higher lower-bound),
                    // or same bound but new is not inclusive
                    self.lower = Some(new);
                }
            }
            None => self.lower = Some(new),
        }
    }

    fn tighten_upper(&mut self, new: (PkgVersion, bool)) {
        match &self.upper {
            Some(this) => {
                if this.0 > new.0 || (this.0 == new.0 && this.1 && !new.1) {
                    self.upper = Some(new);
                }
            }
            None => self.upper = Some(new),
        }
    }

    /// The only version allowed by the bounds, if both bounds meet
    pub fn pinned(&self) -> Option<&PkgVersion> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) if lower.1 && upper.1 && lower.0 == upper.0 => Some(&lower.0),
            _ => None,
        }
    }
}

/// A comma separated list of version specifiers. Empty means any version.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct VersionRequirement {
    pub specifiers: Vec<Specifier>,
}

impl VersionRequirement {
    /// Check if this VersionRequirement accepts arbitary version
    pub fn is_arbitary(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Check if this VersionRequirement pins exactly one version with `==`
    pub fn is_pinned(&self) -> bool {
        self.specifiers.iter().any(|s| {
            matches!(s, Specifier::Compare(Comparator::Equal, _) | Specifier::Arbitrary(_))
        })
    }

    pub fn bounds(&self) -> Bounds {
        let mut res = Bounds::default();
        for spec in &self.specifiers {
            match spec {
                Specifier::Compare(op, ver) => match op {
                    Comparator::GreaterEqual => res.tighten_lower((ver.clone(), true)),
                    Comparator::Greater => res.tighten_lower((ver.clone(), false)),
                    Comparator::LessEqual => res.tighten_upper((ver.clone(), true)),
                    Comparator::Less => res.tighten_upper((ver.clone(), false)),
                    Comparator::Equal => {
                        res.tighten_lower((ver.clone(), true));
                        res.tighten_upper((ver.clone(), true));
                    }
                    Comparator::Compatible => {
                        res.tighten_lower((ver.clone(), true));
                        if let Some(ceiling) = ver.prefix_ceiling(ver.release.len() - 1) {
                            res.tighten_upper((ceiling, false));
                        }
                    }
                    Comparator::NotEqual => res.excluded.push(spec.clone()),
                },
                Specifier::Wildcard { negated, prefix } => {
                    if *negated {
                        res.excluded.push(spec.clone());
                    } else {
                        let len = prefix.release.len();
                        res.tighten_lower((prefix.prefix_floor(len), true));
                        if let Some(ceiling) = prefix.prefix_ceiling(len) {
                            res.tighten_upper((ceiling, false));
                        }
                    }
                }
                Specifier::Arbitrary(s) => {
                    if !res.arbitrary.iter().any(|a| a.eq_ignore_ascii_case(s)) {
                        res.arbitrary.push(s.clone());
                    }
                }
            }
        }
        res
    }

    /// Validate if this VersionRequirement can be satisfied by some PkgVersion
    pub fn valid(&self) -> bool {
        let bounds = self.bounds();
        match bounds.arbitrary.len() {
            0 => (),
            1 => {
                let others: Vec<&Specifier> = self
                    .specifiers
                    .iter()
                    .filter(|s| !matches!(s, Specifier::Arbitrary(_)))
                    .collect();
                return match PkgVersion::try_from(bounds.arbitrary[0].as_str()) {
                    Ok(ver) => others.iter().all(|s| s.within(&ver)),
                    // Not a version at all, nothing else can match it
                    Err(_) => others.is_empty(),
                };
            }
            _ => return false,
        }

        // `==V` also accepts `V+local`, so a satisfying version is one of the
        // pinned targets or a bound sharing their base
        let pins: Vec<&PkgVersion> = self
            .specifiers
            .iter()
            .filter_map(|s| match s {
                Specifier::Compare(Comparator::Equal, ver) => Some(ver),
                _ => None,
            })
            .collect();
        if !pins.is_empty() {
            let bound_versions = [&bounds.lower, &bounds.upper];
            return pins
                .iter()
                .copied()
                .chain(bound_versions.iter().filter_map(|b| b.as_ref().map(|b| &b.0)))
                .any(|candidate| self.within(candidate));
        }

        if let (Some(lower), Some(upper)) = (&bounds.lower, &bounds.upper) {
            match lower.0.cmp(&upper.0) {
                Greater => return false,
                Equal => {
                    // must be both inclusive to be valid
                    if !(lower.1 && upper.1) {
                        return false;
                    }
                }
                Less => (),
            }
        }

        match bounds.pinned() {
            Some(pinned) => bounds.excluded.iter().all(|spec| spec.within(pinned)),
            None => true,
        }
    }

    /// Check if a PkgVersion satisfies this VersionRequirement
    pub fn within(&self, ver: &PkgVersion) -> bool {
        self.specifiers.iter().all(|s| s.within(ver))
    }

    /// Create a new VersionRequirement that satisfies both original requirements
    pub fn combine(&self, other: &VersionRequirement) -> Result<VersionRequirement> {
        let mut new = self.clone();
        for spec in &other.specifiers {
            if !new.specifiers.contains(spec) {
                new.specifiers.push(spec.clone());
            }
        }

        if !new.valid() {
            bail!("Cannot merge version requirements {} and {}", self, other);
        }

        Ok(new)
    }
}

fn comparator(i: &str) -> IResult<&str, &str> {
    alt((
        tag("==="),
        tag("~="),
        tag("=="),
        tag("!="),
        tag("<="),
        tag(">="),
        tag("<"),
        tag(">"),
    ))(i)
}

fn specifier(i: &str) -> IResult<&str, Specifier> {
    let (i, op) = context("parsing compare literal", comparator)(i)?;
    let (i, _) = space0(i)?;
    if op == "===" {
        let (i, s) = take_till1(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == ')')(i)?;
        return Ok((i, Specifier::Arbitrary(s.to_owned())));
    }

    let (i, ver) = context("parsing version in VersionRequirement", parse_version)(i)?;
    if op == "==" || op == "!=" {
        if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>(".*")(i) {
            if !ver.is_plain_release() {
                return Err(nom::Err::Failure(nom::error::Error::from_error_kind(
                    i,
                    ErrorKind::Verify,
                )));
            }
            let res = Specifier::Wildcard {
                negated: op == "!=",
                prefix: ver,
            };
            return Ok((rest, res));
        }
    }

    let op = match op {
        "~=" => {
            // ~= needs at least two release segments
            if ver.release.len() < 2 {
                return Err(nom::Err::Failure(nom::error::Error::from_error_kind(
                    i,
                    ErrorKind::Verify,
                )));
            }
            Comparator::Compatible
        }
        "==" => Comparator::Equal,
        "!=" => Comparator::NotEqual,
        "<=" => Comparator::LessEqual,
        ">=" => Comparator::GreaterEqual,
        "<" => Comparator::Less,
        ">" => Comparator::Greater,
        _ => unreachable!(),
    };

    Ok((i, Specifier::Compare(op, ver)))
}

/// Use `nom` to parse a VersionRequirement string
pub fn parse_version_requirement(i: &str) -> IResult<&str, VersionRequirement> {
    let (i, specifiers) = separated_list0(tuple((space0, char(','), space0)), specifier)(i)?;
    Ok((i, VersionRequirement { specifiers }))
}

impl TryFrom<&str> for VersionRequirement {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        let s = s.trim();
        let (i, ver_req) = parse_version_requirement(s)
            .map_err(|e| format_err!("Malformed version requirement {}: {}", s, e))?;
        eof::<_, nom::error::Error<&str>>(i)
            .map_err(|_| format_err!("Malformed version requirement {}: unexpected {}", s, i))?;
        if !ver_req.valid() {
            bail!("Version requirement {} can never be satisfied", s)
        }
        Ok(ver_req)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Comparator::Compatible => "~=",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::LessEqual => "<=",
            Comparator::GreaterEqual => ">=",
            Comparator::Less => "<",
            Comparator::Greater => ">",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Specifier::Compare(op, ver) => write!(f, "{}{}", op, ver),
            Specifier::Wildcard { negated, prefix } => {
                let op = if *negated { "!=" } else { "==" };
                write!(f, "{}{}.*", op, prefix)
            }
            Specifier::Arbitrary(s) => write!(f, "==={}", s),
        }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let specs: Vec<String> = self.specifiers.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", specs.join(","))
    }
}

use super::parse_version;

use anyhow::{format_err, Result};
use nom::combinator::eof;
use std::convert::TryFrom;
use std::fmt;

/// PEP 440 style version.
#[derive(Clone, Debug)]
pub struct PkgVersion {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreRelease, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Vec<LocalSegment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

/// Segment of a local version label. Alphabetic segments sort before numeric ones.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Alphabetic(String),
    Number(u64),
}

impl PkgVersion {
    pub fn new(release: Vec<u64>) -> Self {
        PkgVersion {
            epoch: 0,
            release,
            pre: None,
            post: None,
            dev: None,
            local: Vec::new(),
        }
    }

    /// Same version without the local label
    pub fn base(&self) -> PkgVersion {
        PkgVersion {
            local: Vec::new(),
            ..self.clone()
        }
    }

    /// Only a release segment, no pre/post/dev/local parts
    pub fn is_plain_release(&self) -> bool {
        self.pre.is_none() && self.post.is_none() && self.dev.is_none() && self.local.is_empty()
    }

    /// The earliest version starting with `release[..len]`, i.e. `X.Y.dev0`
    pub fn prefix_floor(&self, len: usize) -> PkgVersion {
        let mut release: Vec<u64> = self.release.iter().take(len).copied().collect();
        while release.len() < len {
            release.push(0);
        }
        PkgVersion {
            epoch: self.epoch,
            release,
            pre: None,
            post: None,
            dev: Some(0),
            local: Vec::new(),
        }
    }

    /// The earliest version after every version starting with `release[..len]`.
    /// None if the last segment can't be bumped.
    pub fn prefix_ceiling(&self, len: usize) -> Option<PkgVersion> {
        let mut res = self.prefix_floor(len);
        if let Some(last) = res.release.last_mut() {
            *last = last.checked_add(1)?;
        }
        Some(res)
    }

    /// Whether the release segment starts with `prefix`, padding with zeros
    pub fn has_release_prefix(&self, epoch: u64, prefix: &[u64]) -> bool {
        if self.epoch != epoch {
            return false;
        }
        prefix
            .iter()
            .enumerate()
            .all(|(pos, seg)| self.release.get(pos).copied().unwrap_or(0) == *seg)
    }
}

impl TryFrom<&str> for PkgVersion {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self> {
        let s = s.trim();
        let (i, res) = parse_version(s).map_err(|e| format_err!("Malformed version {}: {}", s, e))?;
        eof::<_, nom::error::Error<&str>>(i)
            .map_err(|_| format_err!("Malformed version {}: trailing characters {}", s, i))?;
        Ok(res)
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PreRelease::Alpha => write!(f, "a"),
            PreRelease::Beta => write!(f, "b"),
            PreRelease::Rc => write!(f, "rc"),
        }
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LocalSegment::Alphabetic(s) => write!(f, "{}", s),
            LocalSegment::Number(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, num)) = &self.pre {
            write!(f, "{}{}", kind, num)?;
        }
        if let Some(num) = self.post {
            write!(f, ".post{}", num)?;
        }
        if let Some(num) = self.dev {
            write!(f, ".dev{}", num)?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(|s| s.to_string()).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pkg_ver_from_str() {
        let source = vec!["2023.10.1", "1!0.9b2.post3.dev4+ubuntu.2", "V1.0-1"];
        let result = vec![
            PkgVersion::new(vec![2023, 10, 1]),
            PkgVersion {
                epoch: 1,
                release: vec![0, 9],
                pre: Some((PreRelease::Beta, 2)),
                post: Some(3),
                dev: Some(4),
                local: vec![
                    LocalSegment::Alphabetic("ubuntu".to_string()),
                    LocalSegment::Number(2),
                ],
            },
            PkgVersion {
                post: Some(1),
                ..PkgVersion::new(vec![1, 0])
            },
        ];

        for (pos, e) in source.iter().enumerate() {
            let parsed = PkgVersion::try_from(*e).unwrap();
            assert_eq!(parsed.to_string(), result[pos].to_string());
            assert_eq!(parsed.local, result[pos].local);
        }
    }

    #[test]
    fn pkg_ver_display_normalizes() {
        let tests = vec![
            ("1.0-alpha.1", "1.0a1"),
            ("1.0.PREVIEW2", "1.0rc2"),
            ("1.0c3", "1.0rc3"),
            ("1.0rev4", "1.0.post4"),
            ("1.0.post", "1.0.post0"),
            ("1.0-dev", "1.0.dev0"),
            ("0!1.2+Local-Build_7", "1.2+local.build.7"),
        ];

        for (input, output) in tests {
            assert_eq!(PkgVersion::try_from(input).unwrap().to_string(), output);
        }
    }

    #[test]
    fn pkg_ver_malformed() {
        for input in ["", "abc", "1.0 garbage", "1.0+", "1..0", "-1"] {
            assert!(PkgVersion::try_from(input).is_err(), "{} should fail", input);
        }
    }

    #[test]
    fn pkg_ver_prefix() {
        let v = PkgVersion::try_from("1.4.5").unwrap();
        assert_eq!(v.prefix_floor(2).to_string(), "1.4.dev0");
        assert_eq!(v.prefix_ceiling(2).unwrap().to_string(), "1.5.dev0");
        let max = PkgVersion::try_from("18446744073709551615.2").unwrap();
        assert!(max.prefix_ceiling(1).is_none());
        assert!(v.has_release_prefix(0, &[1, 4]));
        assert!(!v.has_release_prefix(0, &[1, 5]));
        assert!(PkgVersion::try_from("1").unwrap().has_release_prefix(0, &[1, 0, 0]));
    }
}

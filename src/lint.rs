use crate::{
    resolve::{IncludeKind, Location, ManifestSet, ResolvedEntry, UnnamedEntry},
    types::{
        config::{Config, Level, LintConfig},
        Entry,
    },
};

use console::style;
use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn from_level(level: Level) -> Option<Self> {
        match level {
            Level::Allow => None,
            Level::Warn => Some(Severity::Warning),
            Level::Error => Some(Severity::Error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    ParseError(String),
    MissingInclude { target: PathBuf, reason: String },
    RemoteInclude(String),
    IncludeCycle(Vec<PathBuf>),
    ConflictingRequirement {
        name: String,
        previous: Location,
        reason: String,
    },
    DuplicateRequirement { name: String, previous: Location },
    MissingExpectedInclude(PathBuf),
    UnpinnedRequirement(String),
    IncompleteHashes { name: String, reason: &'static str },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::ParseError(msg) => write!(f, "{}", msg),
            DiagnosticKind::MissingInclude { target, reason } => {
                write!(f, "Cannot include {}: {}", target.display(), reason)
            }
            DiagnosticKind::RemoteInclude(url) => {
                write!(f, "Remote manifest {} is not checked", url)
            }
            DiagnosticKind::IncludeCycle(paths) => {
                let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "Include cycle between {}", paths.join(", "))
            }
            DiagnosticKind::ConflictingRequirement {
                name,
                previous,
                reason,
            } => write!(f, "{} conflicts with {}: {}", name, previous, reason),
            DiagnosticKind::DuplicateRequirement { name, previous } => {
                write!(f, "{} is already listed at {}", name, previous)
            }
            DiagnosticKind::MissingExpectedInclude(base) => {
                write!(f, "Does not include {}", base.display())
            }
            DiagnosticKind::UnpinnedRequirement(name) => {
                write!(f, "{} has no version constraint", name)
            }
            DiagnosticKind::IncompleteHashes { name, reason } => {
                write!(f, "{} {} while hash-checking is in use", name, reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    fn new(severity: Severity, location: Location, kind: DiagnosticKind) -> Self {
        Diagnostic {
            severity,
            location,
            kind,
        }
    }

    pub fn prefix(&self) -> String {
        match self.severity {
            Severity::Error => style("ERROR").red().bold().to_string(),
            Severity::Warning => style("WARNING").yellow().bold().to_string(),
        }
    }

    pub fn show(&self) {
        crate::msg!(
            &self.prefix(),
            "{} {}",
            style(&self.location).bold(),
            self.kind
        );
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Base manifests `root` must include: those given on the command line plus those from config
pub fn expected_includes(config: &Config, root: &Path, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut res: Vec<PathBuf> = extra.to_vec();
    for expect in &config.expect {
        if same_file(&expect.manifest, root) {
            res.extend(expect.includes.iter().cloned());
        }
    }
    res
}

pub fn lint(set: &ManifestSet, config: &LintConfig, expected: &[PathBuf]) -> Vec<Diagnostic> {
    let mut res = Vec::new();

    for manifest in set.manifests() {
        for err in manifest.errors() {
            res.push(Diagnostic::new(
                Severity::Error,
                Location::new(manifest.path(), err.no),
                DiagnosticKind::ParseError(err.message.clone()),
            ));
        }
    }

    check_includes(set, config, expected, &mut res);

    let entries = set.entries();
    check_duplicates(&entries, config, &mut res);
    check_unpinned(&entries, config, &mut res);
    check_hashes(&entries, &set.unnamed_entries(), &mut res);

    res.sort_by(|a, b| a.location.cmp(&b.location).then(b.severity.cmp(&a.severity)));
    res
}

fn check_includes(
    set: &ManifestSet,
    config: &LintConfig,
    expected: &[PathBuf],
    res: &mut Vec<Diagnostic>,
) {
    for missing in set.missing() {
        res.push(Diagnostic::new(
            Severity::Error,
            missing.location.clone(),
            DiagnosticKind::MissingInclude {
                target: missing.target.clone(),
                reason: missing.reason.clone(),
            },
        ));
    }

    if let Some(severity) = Severity::from_level(config.remote_includes) {
        for remote in set.remote() {
            res.push(Diagnostic::new(
                severity,
                remote.location.clone(),
                DiagnosticKind::RemoteInclude(remote.url.clone()),
            ));
        }
    }

    for cycle in set.cycles() {
        res.push(Diagnostic::new(
            Severity::Error,
            Location::new(&cycle[0], 0),
            DiagnosticKind::IncludeCycle(cycle),
        ));
    }

    let root = set.root().path();
    for base in expected {
        if !set.includes(root, base) {
            res.push(Diagnostic::new(
                Severity::Error,
                Location::new(root, 0),
                DiagnosticKind::MissingExpectedInclude(base.clone()),
            ));
        }
    }
}

/// Why two entries for the same package cannot both hold, if they can't
fn conflict(prev: &ResolvedEntry, this: &ResolvedEntry) -> Option<String> {
    match (&prev.request.url, &this.request.url) {
        (Some(a), Some(b)) if a != b => {
            return Some(format!("different sources {} and {}", a, b));
        }
        (Some(_), Some(_)) => return None,
        _ => (),
    }

    match prev.request.version.combine(&this.request.version) {
        Ok(_) => None,
        Err(_) => Some(format!(
            "{} and {} cannot both be satisfied",
            display_req(prev),
            display_req(this)
        )),
    }
}

fn display_req(entry: &ResolvedEntry) -> String {
    if entry.request.version.is_arbitary() {
        "any version".to_owned()
    } else {
        entry.request.version.to_string()
    }
}

fn check_duplicates(entries: &[ResolvedEntry], config: &LintConfig, res: &mut Vec<Diagnostic>) {
    let duplicate_severity = Severity::from_level(config.duplicates);
    let mut seen: HashMap<String, Vec<&ResolvedEntry>> = HashMap::new();

    for entry in entries {
        let name = entry.request.normalized_name();
        let previous = seen.entry(name).or_default();
        for prev in previous.iter() {
            // Without evaluating markers, entries for different environments never clash
            if prev.request.marker != entry.request.marker {
                continue;
            }

            if let Some(reason) = conflict(prev, entry) {
                res.push(Diagnostic::new(
                    Severity::Error,
                    entry.location.clone(),
                    DiagnosticKind::ConflictingRequirement {
                        name: entry.request.name.clone(),
                        previous: prev.location.clone(),
                        reason,
                    },
                ));
                break;
            }

            // Repeating a constraint is normal
            if prev.kind == IncludeKind::Requirement && entry.kind == IncludeKind::Requirement {
                if let Some(severity) = duplicate_severity {
                    res.push(Diagnostic::new(
                        severity,
                        entry.location.clone(),
                        DiagnosticKind::DuplicateRequirement {
                            name: entry.request.name.clone(),
                            previous: prev.location.clone(),
                        },
                    ));
                }
                break;
            }
        }
        previous.push(entry);
    }
}

fn check_unpinned(entries: &[ResolvedEntry], config: &LintConfig, res: &mut Vec<Diagnostic>) {
    let severity = match Severity::from_level(config.unpinned) {
        Some(s) => s,
        None => return,
    };
    for entry in entries {
        if entry.kind == IncludeKind::Requirement
            && entry.request.url.is_none()
            && entry.request.version.is_arbitary()
        {
            res.push(Diagnostic::new(
                severity,
                entry.location.clone(),
                DiagnosticKind::UnpinnedRequirement(entry.request.name.clone()),
            ));
        }
    }
}

/// Once a single requirement carries a hash, all of them must be pinned and hashed
fn check_hashes(entries: &[ResolvedEntry], unnamed: &[UnnamedEntry], res: &mut Vec<Diagnostic>) {
    let requirements: Vec<&ResolvedEntry> = entries
        .iter()
        .filter(|e| e.kind == IncludeKind::Requirement)
        .collect();
    let hashed_direct = unnamed
        .iter()
        .any(|e| matches!(e.entry, Entry::Direct(_, hashes) if !hashes.is_empty()));
    if !hashed_direct && !requirements.iter().any(|e| !e.request.hashes.is_empty()) {
        return;
    }

    for entry in unnamed {
        let (name, reason) = match entry.entry {
            Entry::Direct(target, hashes) if hashes.is_empty() => (target.clone(), "has no --hash"),
            Entry::Editable(target) => (format!("-e {}", target), "cannot be installed"),
            _ => continue,
        };
        res.push(Diagnostic::new(
            Severity::Error,
            entry.location.clone(),
            DiagnosticKind::IncompleteHashes { name, reason },
        ));
    }

    for entry in requirements {
        let reason = if entry.request.hashes.is_empty() {
            "has no --hash"
        } else if entry.request.url.is_none() && !entry.request.version.is_pinned() {
            "is not pinned with =="
        } else {
            continue;
        };
        res.push(Diagnostic::new(
            Severity::Error,
            entry.location.clone(),
            DiagnosticKind::IncompleteHashes {
                name: entry.request.name.clone(),
                reason,
            },
        ));
    }
}

/// (errors, warnings)
pub fn count(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    (errors, diagnostics.len() - errors)
}

mod parse;
mod variables;
pub use parse::parse_requirement;
use parse::{logical_lines, parse_line};
use variables::{env_lookup, fill_variables};

use crate::{debug, types::Checksum, types::VersionRequirement};

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
};

/// PEP 503 normalization: lowercase, runs of `-_.` become `-`
pub fn normalize_name(name: &str) -> String {
    lazy_static! {
        static ref SEPARATORS: Regex = Regex::new(r"[-_.]+").unwrap();
    }
    SEPARATORS.replace_all(name, "-").to_lowercase()
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PkgRequest {
    pub name: String,
    pub extras: Vec<String>,
    pub version: VersionRequirement,
    /// Direct reference, `name @ url`
    pub url: Option<String>,
    /// Environment marker, kept verbatim
    pub marker: Option<String>,
    pub hashes: Vec<Checksum>,
    pub comment: Option<String>,
}

impl PkgRequest {
    pub fn new(name: &str) -> Self {
        PkgRequest {
            name: name.to_owned(),
            extras: Vec::new(),
            version: VersionRequirement::default(),
            url: None,
            marker: None,
            hashes: Vec::new(),
            comment: None,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

impl TryFrom<&str> for PkgRequest {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self> {
        parse_requirement(s)
    }
}

impl std::fmt::Display for PkgRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {}", url)?;
        } else if !self.version.is_arbitary() {
            write!(f, "{}", self.version)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, " ; {}", marker)?;
        }
        for hash in &self.hashes {
            write!(f, " --hash={}", hash)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "  # {}", comment)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Entry {
    Requirement(PkgRequest),
    /// `-r <path>`
    Include(String),
    /// `-c <path>`
    Constraint(String),
    /// `-e <path-or-url>`
    Editable(String),
    /// A path or URL listed without a name, with its `--hash` options
    Direct(String, Vec<Checksum>),
    /// Any other installer option, e.g. `--index-url`
    Option(String, Option<String>),
    Comment(String),
    EmptyLine,
}

#[derive(Debug, Clone)]
pub struct ManifestLine {
    /// 1-based line number of the first physical line
    pub no: usize,
    /// Physical lines as read, terminators included
    pub raw: String,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub no: usize,
    pub message: String,
}

/// A requirements manifest
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    // If we need to export the manifest back to disk
    modified: bool,
    // Terminator for new lines, follows the first line of the file
    newline: &'static str,
    lines: Vec<ManifestLine>,
    errors: Vec<LineError>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to open manifest at {}", path.display()))?;
        Ok(Self::parse(path.to_owned(), &content))
    }

    /// Parse manifest content. Bad lines are collected in `errors()` instead of failing.
    pub fn parse(path: PathBuf, content: &str) -> Self {
        let mut lines = Vec::new();
        let mut errors = Vec::new();
        for line in logical_lines(content) {
            let expanded = fill_variables(&line.joined, env_lookup);
            match parse_line(&expanded) {
                Ok(entry) => lines.push(ManifestLine {
                    no: line.no,
                    raw: line.raw,
                    entry,
                }),
                Err(e) => errors.push(LineError {
                    no: line.no,
                    message: e.to_string(),
                }),
            }
        }
        debug!(
            "Parsed {}: {} line(s), {} error(s)",
            path.display(),
            lines.len(),
            errors.len()
        );

        let newline = match content.find('\n') {
            Some(pos) if content[..pos].ends_with('\r') => "\r\n",
            _ => "\n",
        };

        Manifest {
            path,
            modified: false,
            newline,
            lines,
            errors,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[ManifestLine] {
        &self.lines
    }

    pub fn errors(&self) -> &[LineError] {
        &self.errors
    }

    pub fn get_pkg_requests(&self) -> Vec<(usize, &PkgRequest)> {
        self.lines
            .iter()
            .filter_map(|line| match &line.entry {
                Entry::Requirement(req) => Some((line.no, req)),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, pkgname: &str) -> bool {
        let name = normalize_name(pkgname);
        self.get_pkg_requests()
            .iter()
            .any(|(_, req)| req.normalized_name() == name)
    }

    fn ensure_editable(&self) -> Result<()> {
        if let Some(err) = self.errors.first() {
            bail!(
                "Refusing to edit {}: line {} is invalid: {}",
                self.path.display(),
                err.no,
                err.message
            );
        }
        Ok(())
    }

    pub fn add(&mut self, req: PkgRequest) -> Result<()> {
        self.ensure_editable()?;
        if self.contains(&req.name) {
            bail!("Package {} already exists in {}", req.name, self.path.display());
        }

        let no = self.lines.last().map(|l| l.no + l.raw.lines().count()).unwrap_or(1);
        if let Some(last) = self.lines.last_mut() {
            if !last.raw.ends_with('\n') {
                last.raw.push_str(self.newline);
            }
        }
        self.lines.push(ManifestLine {
            no,
            raw: format!("{}{}", req, self.newline),
            entry: Entry::Requirement(req),
        });
        self.modified = true;
        Ok(())
    }

    pub fn remove(&mut self, pkgname: &str) -> Result<()> {
        self.ensure_editable()?;
        if !self.contains(pkgname) {
            bail!("Package {} not found in {}", pkgname, self.path.display());
        }
        let name = normalize_name(pkgname);
        self.lines.retain(|line| match &line.entry {
            Entry::Requirement(req) => req.normalized_name() != name,
            _ => true,
        });
        self.modified = true;
        Ok(())
    }

    /// Untouched lines are written back byte-for-byte
    pub fn export(&self) -> String {
        self.lines.iter().map(|l| l.raw.as_str()).collect()
    }

    /// Write back the manifest if modified. Returns whether anything was written.
    pub fn write(&self) -> Result<bool> {
        if !self.modified {
            // If not modified, nothing to do here.
            return Ok(false);
        }

        fs::write(&self.path, self.export()).context(format!(
            "Failed to write to manifest at {}",
            self.path.display()
        ))?;

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DEV_MANIFEST: &str = "\
# Requirements to dev/test the source code
-r requirements.txt  # requirements to run the CLI

# -e .

mypy>=1.5.1
types-aiofiles>=23.2.0.0
pytest >= 7.4.0  # for testing
pytest-asyncio >=0.21.0
";

    #[test]
    fn test_normalize_name() {
        let tests = vec![
            ("Django", "django"),
            ("types_aiofiles", "types-aiofiles"),
            ("zope.interface", "zope-interface"),
            ("Foo-._Bar", "foo-bar"),
        ];

        for (input, output) in tests {
            assert_eq!(normalize_name(input), output);
        }
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(PathBuf::from("requirements-dev.txt"), DEV_MANIFEST);
        assert!(manifest.errors().is_empty());
        assert_eq!(manifest.lines().len(), 9);
        assert_eq!(
            manifest.lines()[1].entry,
            Entry::Include("requirements.txt".to_string())
        );
        assert_eq!(manifest.lines()[3].entry, Entry::Comment(" -e .".to_string()));

        let reqs = manifest.get_pkg_requests();
        let names: Vec<&str> = reqs.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["mypy", "types-aiofiles", "pytest", "pytest-asyncio"]);
        assert_eq!(reqs[2].0, 8);
        assert_eq!(reqs[2].1.comment.as_deref(), Some("for testing"));
        assert!(manifest.contains("Types_AioFiles"));
        assert!(!manifest.contains("hatch"));
    }

    #[test]
    fn test_parse_errors_are_collected() {
        let manifest = Manifest::parse(
            PathBuf::from("requirements.txt"),
            "aiofiles>=23.1\nasyncclick >=\n\n-r\ndebugpy\n",
        );
        let lines: Vec<usize> = manifest.errors().iter().map(|e| e.no).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(manifest.get_pkg_requests().len(), 2);
    }

    #[test]
    fn test_export_roundtrip() {
        let manifest = Manifest::parse(PathBuf::from("requirements-dev.txt"), DEV_MANIFEST);
        assert_eq!(manifest.export(), DEV_MANIFEST);
    }

    #[test]
    fn test_add_remove() {
        let mut manifest = Manifest::parse(PathBuf::from("requirements-dev.txt"), DEV_MANIFEST);
        manifest
            .add(PkgRequest::try_from("hatch >= 1.7.0").unwrap())
            .unwrap();
        assert!(manifest.add(PkgRequest::try_from("MyPy").unwrap()).is_err());
        manifest.remove("pytest_asyncio").unwrap();
        assert!(manifest.remove("pytest-asyncio").is_err());

        let exported = manifest.export();
        assert!(exported.ends_with("pytest >= 7.4.0  # for testing\nhatch>=1.7.0\n"));
        assert!(!exported.contains("pytest-asyncio"));
        assert_eq!(manifest.lines().last().unwrap().no, 10);
    }

    #[test]
    fn test_export_keeps_terminators() {
        let mut manifest = Manifest::parse(
            PathBuf::from("requirements.txt"),
            "aiofiles>=23.1.0\r\nmypy>=1.5\r\n",
        );
        manifest.add(PkgRequest::new("hatch")).unwrap();
        assert_eq!(manifest.export(), "aiofiles>=23.1.0\r\nmypy>=1.5\r\nhatch\r\n");

        let tests = vec![
            ("aiofiles>=23.1.0", "aiofiles>=23.1.0\nhatch\n"),
            ("aiofiles>=23.1.0\r\nmypy", "aiofiles>=23.1.0\r\nmypy\r\nhatch\r\n"),
            ("", "hatch\n"),
        ];
        for (input, output) in tests {
            let mut manifest = Manifest::parse(PathBuf::from("requirements.txt"), input);
            assert_eq!(manifest.export(), input);
            manifest.add(PkgRequest::new("hatch")).unwrap();
            assert_eq!(manifest.export(), output);
        }
    }

    #[test]
    fn test_refuse_edit_with_errors() {
        let mut manifest = Manifest::parse(PathBuf::from("requirements.txt"), "aiofiles >=\n");
        assert!(manifest.add(PkgRequest::new("hatch")).is_err());
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(&path, "aiofiles>=23.1.0\n").unwrap();
        let mut manifest = Manifest::from_file(&path).unwrap();
        assert!(!manifest.write().unwrap());

        let mut req = PkgRequest::try_from("asyncclick>=8.1.3.4").unwrap();
        req.comment = Some("the CLI".to_string());
        manifest.add(req).unwrap();
        assert!(manifest.write().unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "aiofiles>=23.1.0\nasyncclick>=8.1.3.4  # the CLI\n"
        );
    }

    #[test]
    fn test_display_pkg_request() {
        let tests = vec![
            ("aiohttp", "aiohttp"),
            ("black[d,jupyter] (>=23 , <24)", "black[d,jupyter]>=23,<24"),
            ("foo @ https://x/foo.zip ; os_name == 'nt'", "foo @ https://x/foo.zip ; os_name == 'nt'"),
        ];

        for (input, output) in tests {
            assert_eq!(PkgRequest::try_from(input).unwrap().to_string(), output);
        }
    }
}

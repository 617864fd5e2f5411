use crate::types::HashAlgorithm;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "reqlint.toml";

#[derive(Deserialize, Serialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub lint: LintConfig,
    pub expect: Vec<ExpectInclude>,
}

impl Config {
    /// Load config from `path`. A missing default config file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_owned(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !explicit && !path.is_file() {
            return Ok(Config::default());
        }

        let data = std::fs::read_to_string(&path)
            .context(format!("Failed to read config file at {}", path.display()))?;
        let config: Config = toml::from_str(&data)
            .context(format!("Failed to parse config file at {}", path.display()))?;
        config.check_sanity()?;
        Ok(config)
    }

    pub fn check_sanity(&self) -> Result<()> {
        for expect in &self.expect {
            if expect.manifest.as_os_str().is_empty() {
                bail!("Empty manifest path in include expectation");
            }
            if expect.includes.is_empty() {
                bail!(
                    "Include expectation for {} lists no manifest",
                    expect.manifest.display()
                );
            }
            if expect.includes.contains(&expect.manifest) {
                bail!(
                    "Manifest {} cannot be expected to include itself",
                    expect.manifest.display()
                );
            }
        }
        Ok(())
    }
}

/// How to report a kind of lint finding
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Allow,
    Warn,
    Error,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Same package listed twice with compatible constraints
    pub duplicates: Level,
    /// Requirements without any version constraint
    pub unpinned: Level,
    /// `-r`/`-c` pointing at a URL
    pub remote_includes: Level,
}

impl Default for LintConfig {
    fn default() -> Self {
        LintConfig {
            duplicates: Level::Warn,
            unpinned: Level::Allow,
            remote_includes: Level::Warn,
        }
    }
}

/// `manifest` must transitively include every path in `includes`
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExpectInclude {
    pub manifest: PathBuf,
    pub includes: Vec<PathBuf>,
}

#[derive(Parser)]
#[clap(about, version, author)]
pub struct Opts {
    #[clap(long, help = "Position of the config file [default: reqlint.toml]")]
    pub config: Option<PathBuf>,
    #[clap(short, long, help = "Print additional debug information")]
    pub verbose: bool,
    #[clap(long, help = "Disable colored output")]
    pub no_color: bool,
    #[clap(short, long, help = "Don't ask for confirmation")]
    pub yes: bool,
    #[clap(subcommand)]
    pub subcmd: SubCmd,
}

#[derive(Parser)]
pub enum SubCmd {
    /// Lint manifests and everything they include
    Check(CheckManifest),
    /// Show requirements of a manifest, includes resolved
    List(ListManifest),
    /// Add requirements to a manifest
    Add(AddPkg),
    /// Remove requirements from a manifest
    Remove(RemovePkg),
    /// Print --hash options for local distribution files
    Hash(HashFile),
}

#[derive(Parser)]
pub struct CheckManifest {
    /// Manifests to check
    #[clap(default_value = "requirements.txt")]
    pub manifests: Vec<PathBuf>,
    /// Every manifest must transitively include this one
    #[clap(long)]
    pub expect_include: Vec<PathBuf>,
    /// Fail on warnings too
    #[clap(long)]
    pub strict: bool,
}

#[derive(Parser)]
pub struct ListManifest {
    /// Manifest to show
    #[clap(default_value = "requirements.txt")]
    pub manifest: PathBuf,
    /// Show the include tree instead
    #[clap(long)]
    pub tree: bool,
}

#[derive(Parser)]
pub struct AddPkg {
    /// Manifest to edit
    pub manifest: PathBuf,
    /// Requirement specifiers, e.g. "aiohttp>=3.8"
    #[clap(min_values = 1, required = true)]
    pub requirements: Vec<String>,
}

#[derive(Parser)]
pub struct RemovePkg {
    /// Manifest to edit
    pub manifest: PathBuf,
    /// Package names to remove
    #[clap(min_values = 1, required = true)]
    pub names: Vec<String>,
}

#[derive(Parser)]
pub struct HashFile {
    /// Distribution files to hash
    #[clap(min_values = 1, required = true)]
    pub files: Vec<PathBuf>,
    /// Digest algorithm
    #[clap(short, long, arg_enum, default_value = "sha256")]
    pub algorithm: HashAlgorithm,
    /// Verify the file against this <algorithm>:<digest> instead
    #[clap(long)]
    pub verify: Option<String>,
}

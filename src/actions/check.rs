use crate::{
    debug, error, info,
    lint::{self, Diagnostic},
    resolve::ManifestSet,
    success,
    types::config::{CheckManifest, Config},
    warn,
};

use anyhow::{bail, Result};
use console::style;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

fn lint_root(config: &Config, root: &Path, extra: &[PathBuf]) -> Result<Vec<Diagnostic>> {
    let set = ManifestSet::load(root)?;
    let expected = lint::expected_includes(config, root, extra);
    debug!(
        "Checking {} against {} expected include(s)",
        root.display(),
        expected.len()
    );
    Ok(lint::lint(&set, &config.lint, &expected))
}

pub fn check(config: &Config, args: &CheckManifest) -> Result<()> {
    info!("Checking {} manifest(s)...", args.manifests.len());

    // Lint every root in parallel, report in the order they were given
    let results: Vec<(&PathBuf, Result<Vec<Diagnostic>>)> = args
        .manifests
        .par_iter()
        .map(|root| (root, lint_root(config, root, &args.expect_include)))
        .collect();

    let mut errors = 0;
    let mut warnings = 0;
    for (root, res) in results {
        match res {
            Ok(diagnostics) => {
                for d in &diagnostics {
                    d.show();
                }
                let (e, w) = lint::count(&diagnostics);
                errors += e;
                warnings += w;
            }
            Err(err) => {
                error!("Cannot check {}: {:#}", style(root.display()).bold(), err);
                errors += 1;
            }
        }
    }

    if failed(errors, warnings, args.strict) {
        bail!("Found {} error(s) and {} warning(s)", errors, warnings);
    }

    if warnings > 0 {
        warn!("Found {} warning(s)", warnings);
    } else {
        success!("All manifests look good");
    }

    Ok(())
}

fn failed(errors: usize, warnings: usize, strict: bool) -> bool {
    errors > 0 || (strict && warnings > 0)
}

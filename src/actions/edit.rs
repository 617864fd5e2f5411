use crate::{
    cli::prompt::ask_confirm,
    info, success,
    types::{
        config::{AddPkg, RemovePkg},
        normalize_name, Manifest, PkgRequest,
    },
};

use anyhow::{bail, Context, Result};
use console::style;
use std::{cmp::Reverse, convert::TryFrom};

pub fn add(args: &AddPkg) -> Result<()> {
    let mut manifest = Manifest::from_file(&args.manifest)?;
    for req in &args.requirements {
        let req = PkgRequest::try_from(req.as_str())
            .context(format!("Invalid requirement {}", style(req).bold()))?;
        info!("Adding {} to {}", style(&req).bold(), args.manifest.display());
        manifest.add(req)?;
    }

    if manifest.write()? {
        success!("Updated {}", args.manifest.display());
    }
    Ok(())
}

/// Names in `manifest` that look like `pkgname`, most similar first
fn suggest<'a>(manifest: &'a Manifest, pkgname: &str) -> Vec<&'a str> {
    let name = normalize_name(pkgname);
    let mut res: Vec<(f64, &str)> = manifest
        .get_pkg_requests()
        .into_iter()
        .map(|(_, req)| {
            (
                strsim::jaro_winkler(&req.normalized_name(), &name),
                req.name.as_str(),
            )
        })
        .filter(|(score, _)| *score > 0.8)
        .collect();
    res.sort_by_key(|(score, _)| Reverse((255.0 * score) as u8));
    res.into_iter().map(|(_, name)| name).collect()
}

/// bool in return type indicated whether user cancelled operation
pub fn remove(args: &RemovePkg, yes: bool) -> Result<bool> {
    let mut manifest = Manifest::from_file(&args.manifest)?;

    for name in &args.names {
        if manifest.contains(name) {
            continue;
        }
        let suggestions = suggest(&manifest, name);
        if suggestions.is_empty() {
            bail!(
                "Package {} not found in {}",
                style(name).bold(),
                args.manifest.display()
            );
        }
        bail!(
            "Package {} not found in {}, did you mean {}?",
            style(name).bold(),
            args.manifest.display(),
            suggestions.join(", ")
        );
    }

    info!("These requirements will be removed from {}:", args.manifest.display());
    let names: Vec<String> = args.names.iter().map(|n| normalize_name(n)).collect();
    let chunks: Vec<String> = manifest
        .get_pkg_requests()
        .into_iter()
        .filter(|(_, req)| names.contains(&req.normalized_name()))
        .map(|(no, req)| format!("{} {}", style(req).red(), style(format!("(line {})", no)).dim()))
        .collect();
    crate::WRITER.write_chunks("", &chunks)?;

    if !ask_confirm(yes, "Proceed?")? {
        return Ok(true);
    }

    for name in &args.names {
        manifest.remove(name)?;
    }
    if manifest.write()? {
        success!("Updated {}", args.manifest.display());
    }
    Ok(false)
}

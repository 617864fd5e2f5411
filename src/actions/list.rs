use crate::{
    resolve::{IncludeKind, ManifestSet, ResolvedEntry},
    types::config::ListManifest,
    warn,
};

use anyhow::Result;
use console::style;
use tabled::{Alignment, Full, Modify, Style, Table, Tabled};

#[derive(Tabled)]
struct RequirementRow {
    #[header("Name")]
    name: String,
    #[header("Version")]
    version: String,
    // Extras, markers and whether this only constrains
    #[header("Details")]
    detail: String,
    #[header("Source")]
    source: String,
}

impl RequirementRow {
    fn from_entry(entry: &ResolvedEntry) -> Self {
        let req = entry.request;
        let version = if let Some(url) = &req.url {
            url.clone()
        } else if req.version.is_arbitary() {
            style("any").dim().to_string()
        } else {
            req.version.to_string()
        };

        let mut detail_sections = Vec::new();
        if entry.kind == IncludeKind::Constraint {
            detail_sections.push(style("constraint").cyan().to_string());
        }
        if !req.extras.is_empty() {
            detail_sections.push(format!("[{}]", req.extras.join(",")));
        }
        if let Some(marker) = &req.marker {
            detail_sections.push(marker.clone());
        }
        if !req.hashes.is_empty() {
            detail_sections.push(format!("{} hash(es)", req.hashes.len()));
        }

        RequirementRow {
            name: style(&req.name).bold().to_string(),
            version,
            detail: detail_sections.join(", "),
            source: entry.location.to_string(),
        }
    }
}

fn gen_table(set: &ManifestSet) -> Option<String> {
    let rows: Vec<RequirementRow> = set
        .entries()
        .iter()
        .map(RequirementRow::from_entry)
        .collect();
    if rows.is_empty() {
        return None;
    }

    let table = Table::new(&rows)
        .with(Modify::new(Full).with(Alignment::left()))
        .with(Modify::new(Full).with(|s: &str| format!(" {} ", s)))
        .with(Style::psql());
    Some(table.to_string())
}

pub fn list(args: &ListManifest) -> Result<()> {
    let set = ManifestSet::load(&args.manifest)?;

    if args.tree {
        for line in set.render_tree() {
            println!("{}", line);
        }
        return Ok(());
    }

    for missing in set.missing() {
        warn!("{} cannot be read, skipped", missing.target.display());
    }
    for remote in set.remote() {
        warn!("Remote manifest {} skipped", remote.url);
    }

    match gen_table(&set) {
        Some(table) => println!("{}", table),
        None => warn!("{} lists no requirement", args.manifest.display()),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_gen_table() {
        console::set_colors_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pins.txt"), "aiofiles==23.1.0\n").unwrap();
        let root = dir.path().join("requirements.txt");
        fs::write(
            &root,
            "-c pins.txt\naiofiles[speedups]>=23 ; python_version >= '3.10'\nasyncclick\n",
        )
        .unwrap();

        let set = ManifestSet::load(&root).unwrap();
        let table = gen_table(&set).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        // Header, separator, then one line per entry
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("Name") && lines[0].contains("Source"));
        assert!(lines[2].contains("==23.1.0") && lines[2].contains("constraint"));
        assert!(lines[3].contains("[speedups], python_version >= '3.10'"));
        assert!(lines[4].contains("asyncclick") && lines[4].contains("any"));

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "# nothing here\n").unwrap();
        assert!(gen_table(&ManifestSet::load(&empty).unwrap()).is_none());
    }
}

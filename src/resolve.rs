//! Loading a manifest together with every manifest it includes.
//!
//! The include relation forms a directed graph: nodes are manifests, edges
//! are `-r`/`-c` lines. Targets resolve relative to the including file.
use crate::{
    debug,
    types::{Entry, Manifest, PkgRequest},
};

use anyhow::{Context, Result};
use petgraph::{
    algo::{has_path_connecting, tarjan_scc},
    graph::{DiGraph, NodeIndex},
    visit::{EdgeFiltered, EdgeRef},
    Direction,
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `-r`
    Requirement,
    /// `-c`
    Constraint,
}

/// Where something was found. Line 0 stands for the whole file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(path: &Path, line: usize) -> Self {
        Location {
            path: path.to_owned(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.path.display())
        } else {
            write!(f, "{}:{}", self.path.display(), self.line)
        }
    }
}

#[derive(Debug, Clone)]
pub struct MissingInclude {
    pub location: Location,
    pub target: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RemoteInclude {
    pub location: Location,
    pub url: String,
}

/// A requirement or constraint, with the line it came from
#[derive(Debug, Clone)]
pub struct ResolvedEntry<'a> {
    pub location: Location,
    pub request: &'a PkgRequest,
    pub kind: IncludeKind,
}

/// A line installing something without a name: a bare path or URL, or `-e`
#[derive(Debug, Clone)]
pub struct UnnamedEntry<'a> {
    pub location: Location,
    pub entry: &'a Entry,
}

#[derive(Default)]
struct Walk<'a> {
    visited: HashSet<(NodeIndex, IncludeKind)>,
    named: Vec<ResolvedEntry<'a>>,
    unnamed: Vec<UnnamedEntry<'a>>,
}

pub struct ManifestSet {
    graph: DiGraph<Manifest, (IncludeKind, usize)>,
    index: HashMap<PathBuf, NodeIndex>,
    root: NodeIndex,
    missing: Vec<MissingInclude>,
    remote: Vec<RemoteInclude>,
}

fn is_url(target: &str) -> bool {
    target.contains("://")
}

impl ManifestSet {
    pub fn load(root: &Path) -> Result<Self> {
        let canonical = fs::canonicalize(root)
            .context(format!("Failed to open manifest at {}", root.display()))?;
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let mut missing = Vec::new();
        let mut remote = Vec::new();

        let root_idx = graph.add_node(Manifest::from_file(root)?);
        index.insert(canonical, root_idx);

        let mut queue = VecDeque::from([root_idx]);
        while let Some(node) = queue.pop_front() {
            let manifest: &Manifest = &graph[node];
            let path = manifest.path().to_owned();
            let base_dir = path.parent().map(|p| p.to_owned()).unwrap_or_default();
            let targets: Vec<(usize, IncludeKind, String)> = manifest
                .lines()
                .iter()
                .filter_map(|line| match &line.entry {
                    Entry::Include(t) => Some((line.no, IncludeKind::Requirement, t.clone())),
                    Entry::Constraint(t) => Some((line.no, IncludeKind::Constraint, t.clone())),
                    _ => None,
                })
                .collect();

            for (no, kind, target) in targets {
                let location = Location::new(&path, no);
                if is_url(&target) {
                    debug!("Skipping remote include {} at {}", target, location);
                    remote.push(RemoteInclude {
                        location,
                        url: target,
                    });
                    continue;
                }

                let target_path = base_dir.join(&target);
                let child = match fs::canonicalize(&target_path) {
                    Ok(c) => match index.get(&c) {
                        Some(idx) => *idx,
                        None => match Manifest::from_file(&target_path) {
                            Ok(m) => {
                                let idx = graph.add_node(m);
                                index.insert(c, idx);
                                queue.push_back(idx);
                                idx
                            }
                            Err(e) => {
                                missing.push(MissingInclude {
                                    location,
                                    target: target_path,
                                    reason: format!("{:#}", e),
                                });
                                continue;
                            }
                        },
                    },
                    Err(e) => {
                        missing.push(MissingInclude {
                            location,
                            target: target_path,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };
                graph.add_edge(node, child, (kind, no));
            }
        }

        debug!(
            "Loaded {} manifest(s) from {}",
            graph.node_count(),
            root.display()
        );

        Ok(ManifestSet {
            graph,
            index,
            root: root_idx,
            missing,
            remote,
        })
    }

    pub fn root(&self) -> &Manifest {
        &self.graph[self.root]
    }

    pub fn manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.graph.node_weights()
    }

    pub fn missing(&self) -> &[MissingInclude] {
        &self.missing
    }

    pub fn remote(&self) -> &[RemoteInclude] {
        &self.remote
    }

    fn node_of(&self, path: &Path) -> Option<NodeIndex> {
        let canonical = fs::canonicalize(path).ok()?;
        self.index.get(&canonical).copied()
    }

    /// Whether `from` pulls in `to` through a chain of `-r` lines
    pub fn includes(&self, from: &Path, to: &Path) -> bool {
        let (from, to) = match (self.node_of(from), self.node_of(to)) {
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        if from == to {
            return false;
        }
        let requirement_edges =
            EdgeFiltered::from_fn(&self.graph, |e| e.weight().0 == IncludeKind::Requirement);
        has_path_connecting(&requirement_edges, from, to, None)
    }

    /// Include cycles, each as the list of manifests taking part in it
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut res: Vec<Vec<PathBuf>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut paths: Vec<PathBuf> = scc
                    .into_iter()
                    .map(|idx| self.graph[idx].path().to_owned())
                    .collect();
                paths.sort();
                paths
            })
            .collect();
        res.sort();
        res
    }

    /// Requirements and constraints in the order an installer would read them.
    /// Anything pulled in through `-c` counts as a constraint.
    pub fn entries(&self) -> Vec<ResolvedEntry<'_>> {
        let mut walk = Walk::default();
        self.walk(self.root, IncludeKind::Requirement, &mut walk);
        walk.named
    }

    /// Bare paths, URLs and editables pulled in through `-r`, in the same order
    pub fn unnamed_entries(&self) -> Vec<UnnamedEntry<'_>> {
        let mut walk = Walk::default();
        self.walk(self.root, IncludeKind::Requirement, &mut walk);
        walk.unnamed
    }

    fn walk<'a>(&'a self, node: NodeIndex, kind: IncludeKind, walk: &mut Walk<'a>) {
        // A manifest seen as a constraint is still walked again when required.
        // Once required, its constraint view adds nothing.
        if walk.visited.contains(&(node, IncludeKind::Requirement))
            || !walk.visited.insert((node, kind))
        {
            return;
        }
        let manifest = &self.graph[node];
        for line in manifest.lines() {
            match &line.entry {
                Entry::Requirement(req) => walk.named.push(ResolvedEntry {
                    location: Location::new(manifest.path(), line.no),
                    request: req,
                    kind,
                }),
                Entry::Direct(..) | Entry::Editable(_) if kind == IncludeKind::Requirement => {
                    walk.unnamed.push(UnnamedEntry {
                        location: Location::new(manifest.path(), line.no),
                        entry: &line.entry,
                    })
                }
                Entry::Include(_) | Entry::Constraint(_) => {
                    for (child, edge_kind) in self.children_at(node, line.no) {
                        let child_kind = if kind == IncludeKind::Constraint {
                            IncludeKind::Constraint
                        } else {
                            edge_kind
                        };
                        self.walk(child, child_kind, walk);
                    }
                }
                _ => (),
            }
        }
    }

    fn children_at(&self, node: NodeIndex, line: usize) -> Vec<(NodeIndex, IncludeKind)> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .filter(|e| e.weight().1 == line)
            .map(|e| (e.target(), e.weight().0))
            .collect()
    }

    /// Include tree, one manifest per line, indented by depth
    pub fn render_tree(&self) -> Vec<String> {
        let mut res = vec![self.root().path().display().to_string()];
        let mut stack = vec![self.root];
        self.render_children(self.root, &mut stack, &mut res);
        res
    }

    fn render_children(&self, node: NodeIndex, stack: &mut Vec<NodeIndex>, res: &mut Vec<String>) {
        let manifest = &self.graph[node];
        let indent = "  ".repeat(stack.len());
        for line in manifest.lines() {
            let (flag, target) = match &line.entry {
                Entry::Include(t) => ("-r", t),
                Entry::Constraint(t) => ("-c", t),
                _ => continue,
            };
            let children = self.children_at(node, line.no);
            if children.is_empty() {
                let note = if is_url(target) { "remote" } else { "missing" };
                res.push(format!("{}{} {} ({})", indent, flag, target, note));
                continue;
            }
            for (child, _) in children {
                if stack.contains(&child) {
                    res.push(format!("{}{} {} (cycle)", indent, flag, target));
                    continue;
                }
                res.push(format!("{}{} {}", indent, flag, target));
                stack.push(child);
                self.render_children(child, stack, res);
                stack.pop();
            }
        }
    }
}

//! Resolution of `composes` references between catalog entries.
//!
//! Compositions stay as (path, offset) references on each
//! [`ParsedAssemblage`](quill_data::ParsedAssemblage). This module maps those
//! paths to catalog ids, reports references that point nowhere, and rejects
//! cyclic compositions.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use quill_data::MarkdownLink;

use crate::catalog::Catalog;
use crate::docref::{normalize_path, resolve_link_path};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("composition cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
}

/// `from` places `to` with its origin at `at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionEdge {
    pub to: String,
    pub at: [i32; 2],
}

/// A `composes` link that matched no catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub from: String,
    pub link: MarkdownLink,
    pub resolved: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionGraph {
    pub edges: BTreeMap<String, Vec<CompositionEdge>>,
    pub dangling: Vec<DanglingRef>,
    order: Vec<String>,
}

impl CompositionGraph {
    /// Every catalog id, each listed after everything it composes.
    pub fn topological_order(&self) -> &[String] {
        &self.order
    }

    pub fn children(&self, id: &str) -> &[CompositionEdge] {
        self.edges.get(id).map_or(&[], Vec::as_slice)
    }
}

/// Resolve every composition link in `catalog`.
///
/// A link resolves by path, relative to the file that holds it; failing that,
/// by a catalog id equal to the linked file's stem.
///
/// # Errors
/// Returns `CompositionError::Cycle` when an assemblage composes itself,
/// directly or through others.
pub fn resolve_compositions(catalog: &Catalog) -> Result<CompositionGraph, CompositionError> {
    let by_path: HashMap<PathBuf, &str> = catalog
        .entries
        .iter()
        .map(|(id, parsed)| (normalize_path(Path::new(&parsed.file_path)), id.as_str()))
        .collect();

    let mut graph = CompositionGraph::default();
    for (id, parsed) in &catalog.entries {
        let mut edges = Vec::new();
        for composition in &parsed.composes {
            let resolved = resolve_link_path(Path::new(&parsed.file_path), &composition.link);
            let target = by_path.get(&resolved).copied().or_else(|| {
                let stem = resolved.file_stem()?.to_str()?;
                catalog.entries.get_key_value(stem).map(|(key, _)| key.as_str())
            });
            match target {
                Some(to) => edges.push(CompositionEdge {
                    to: to.to_string(),
                    at: composition.at,
                }),
                None => {
                    warn!(
                        "assemblage '{id}' composes '{}' which is not in the catalog",
                        composition.link
                    );
                    graph.dangling.push(DanglingRef {
                        from: id.clone(),
                        link: composition.link.clone(),
                        resolved,
                    });
                },
            }
        }
        graph.edges.insert(id.clone(), edges);
    }

    graph.order = ordered(&graph.edges)?;
    debug!(
        "{} compositions resolved, {} dangling",
        graph.edges.values().map(Vec::len).sum::<usize>(),
        graph.dangling.len()
    );
    Ok(graph)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first post-order over `edges`, failing on the first back edge.
fn ordered(edges: &BTreeMap<String, Vec<CompositionEdge>>) -> Result<Vec<String>, CompositionError> {
    struct Walk<'g> {
        edges: &'g BTreeMap<String, Vec<CompositionEdge>>,
        marks: HashMap<&'g str, Mark>,
        stack: Vec<&'g str>,
        order: Vec<String>,
    }

    impl<'g> Walk<'g> {
        fn visit(&mut self, id: &'g str) -> Result<(), CompositionError> {
            match self.marks.get(id).copied().unwrap_or(Mark::Unvisited) {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    let start = self.stack.iter().position(|s| *s == id).unwrap_or(0);
                    let mut chain: Vec<String> = self.stack[start..].iter().map(|s| (*s).to_string()).collect();
                    chain.push(id.to_string());
                    return Err(CompositionError::Cycle { chain });
                },
                Mark::Unvisited => {},
            }
            self.marks.insert(id, Mark::InProgress);
            self.stack.push(id);
            let edges = self.edges;
            if let Some(children) = edges.get(id) {
                for edge in children {
                    self.visit(edge.to.as_str())?;
                }
            }
            self.stack.pop();
            self.marks.insert(id, Mark::Done);
            self.order.push(id.to_string());
            Ok(())
        }
    }

    let mut walk = Walk {
        edges,
        marks: HashMap::new(),
        stack: Vec::new(),
        order: Vec::new(),
    };
    for id in edges.keys() {
        walk.visit(id)?;
    }
    Ok(walk.order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemblage::parse_assemblage_markdown;

    fn catalog(files: &[(&str, &str)]) -> Catalog {
        let mut catalog = Catalog::default();
        for (path, text) in files {
            catalog.insert(parse_assemblage_markdown(text, path).unwrap());
        }
        catalog
    }

    #[test]
    fn leaves_come_first() {
        let catalog = catalog(&[
            ("cat/atoms/plank.md", "# Plank\n"),
            (
                "cat/molecules/door.md",
                "---\ncomposes:\n  - ref: [plank](../atoms/plank.md)\n    at: [0, 0]\n---\n# Door\n",
            ),
            (
                "cat/organisms/house.md",
                "---\ncomposes:\n  - ref: [door](../molecules/door.md)\n    at: [2, 3]\n---\n# House\n",
            ),
        ]);
        let graph = resolve_compositions(&catalog).unwrap();
        assert_eq!(graph.topological_order(), ["plank", "door", "house"]);
        assert_eq!(
            graph.children("house"),
            [CompositionEdge {
                to: "door".into(),
                at: [2, 3]
            }]
        );
        assert!(graph.dangling.is_empty());
    }

    #[test]
    fn dangling_refs_are_collected() {
        let catalog = catalog(&[(
            "cat/square.md",
            "---\ncomposes:\n  - ref: [fountain](fountain.md)\n    at: [1, 1]\n---\n# Square\n",
        )]);
        let graph = resolve_compositions(&catalog).unwrap();
        assert_eq!(graph.dangling.len(), 1);
        assert_eq!(graph.dangling[0].resolved, PathBuf::from("cat/fountain.md"));
    }

    #[test]
    fn stem_fallback_when_path_differs() {
        let catalog = catalog(&[
            ("cat/atoms/plank.md", "# Plank\n"),
            (
                "cat/door.md",
                "---\ncomposes:\n  - ref: [plank](old/location/plank.md)\n    at: [0, 0]\n---\n# Door\n",
            ),
        ]);
        let graph = resolve_compositions(&catalog).unwrap();
        assert_eq!(graph.children("door")[0].to, "plank");
    }

    #[test]
    fn cycles_are_errors() {
        let catalog = catalog(&[
            ("cat/a.md", "---\ncomposes:\n  - ref: [b](b.md)\n    at: [0, 0]\n---\n# A\n"),
            ("cat/b.md", "---\ncomposes:\n  - ref: [a](a.md)\n    at: [0, 0]\n---\n# B\n"),
        ]);
        assert_eq!(
            resolve_compositions(&catalog),
            Err(CompositionError::Cycle {
                chain: vec!["a".into(), "b".into(), "a".into()]
            })
        );
    }
}

//! Directory-wide assemblage catalog loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use quill_data::ParsedAssemblage;
use walkdir::WalkDir;

use crate::assemblage::{CompileError, parse_assemblage_markdown};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("walking catalog directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("compiling '{path}': {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },
}

/// An id whose earlier definition was replaced by a later file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    pub id: String,
    pub replaced: PathBuf,
    pub by: PathBuf,
}

/// Every assemblage under a catalog root, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub root: PathBuf,
    pub entries: BTreeMap<String, ParsedAssemblage>,
    /// Duplicate ids, in the order they were encountered.
    pub overwritten: Vec<Overwrite>,
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&ParsedAssemblage> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a compiled assemblage. A duplicate id replaces the earlier entry.
    pub fn insert(&mut self, parsed: ParsedAssemblage) {
        let id = parsed.definition.id.clone();
        let by = PathBuf::from(&parsed.file_path);
        if let Some(previous) = self.entries.insert(id.clone(), parsed) {
            warn!(
                "assemblage id '{id}' from '{}' replaces the one from '{}'",
                by.display(),
                previous.file_path
            );
            self.overwritten.push(Overwrite {
                id,
                replaced: PathBuf::from(previous.file_path),
                by,
            });
        }
    }
}

/// All `*.md` files under `dir`, sorted by path.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Compile every catalog file under `dir`.
///
/// Files are processed in sorted path order, so when two files declare the
/// same id the one with the later path wins.
///
/// # Errors
/// Fails on the first unreadable directory entry or file, or the first file
/// whose frontmatter is not valid YAML.
pub fn load_catalog(dir: &Path) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog {
        root: dir.to_path_buf(),
        ..Catalog::default()
    };
    for path in markdown_files(dir)? {
        let text = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed = parse_assemblage_markdown(&text, &path).map_err(|source| CatalogError::Compile {
            path: path.clone(),
            source,
        })?;
        debug!("loaded '{}' from '{}'", parsed.definition.id, path.display());
        catalog.insert(parsed);
    }
    info!(
        "{} assemblages loaded from '{}' ({} overwritten)",
        catalog.len(),
        dir.display(),
        catalog.overwritten.len()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, text: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn loads_nested_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "atoms/rock.md", "# Rock\n");
        write(dir.path(), "molecules/cairn.md", "---\nid: cairn\n---\n# Cairn\n");
        write(dir.path(), "notes.txt", "ignore me");

        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog.entries.keys().collect::<Vec<_>>(), vec!["cairn", "rock"]);
        assert!(catalog.overwritten.is_empty());
    }

    #[test]
    fn duplicate_ids_last_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/well.md", "---\nid: well\n---\n# Well\n\nFirst.\n");
        write(dir.path(), "b/well.md", "---\nid: well\n---\n# Well\n\nSecond.\n");

        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("well").unwrap().definition.description, "Second.");
        assert_eq!(catalog.overwritten.len(), 1);
        assert!(catalog.overwritten[0].replaced.ends_with("a/well.md"));
        assert!(catalog.overwritten[0].by.ends_with("b/well.md"));
    }

    #[test]
    fn bad_frontmatter_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.md", "---\nid: [oops\n---\n# Broken\n");
        match load_catalog(dir.path()) {
            Err(CatalogError::Compile { path, .. }) => assert!(path.ends_with("broken.md")),
            other => panic!("expected compile error, got {other:?}"),
        }
    }
}

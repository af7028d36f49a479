//! Following `[text](path#anchor)` links between design documents.

use std::path::{Component, Path, PathBuf};

use quill_data::MarkdownLink;

use crate::frontmatter::{FrontmatterError, extract_frontmatter};
use crate::section::extract_section_fuzzy;

/// Path of `link` relative to the directory holding `base_file`.
///
/// `.` and `..` components are folded lexically; the result is not checked
/// against the file system.
pub fn resolve_link_path(base_file: &Path, link: &MarkdownLink) -> PathBuf {
    let joined = base_file.parent().unwrap_or(Path::new("")).join(&link.path);
    normalize_path(&joined)
}

/// Fold `.` and `..` components without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_))) && out.pop();
                if !popped {
                    out.push("..");
                }
            },
            other => out.push(other),
        }
    }
    out
}

/// Heading words for an anchor slug (`narrative-context` -> `narrative context`).
pub fn anchor_to_heading(anchor: &str) -> String {
    anchor
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text that `link` points at inside `document`.
///
/// Without an anchor this is the whole body, frontmatter stripped. With one,
/// the anchor is matched against the document's headings fuzzily; `None` means
/// no heading matched.
///
/// # Errors
/// Returns `FrontmatterError` if the document's frontmatter is not valid YAML.
pub fn resolve_doc_ref(document: &str, link: &MarkdownLink) -> Result<Option<String>, FrontmatterError> {
    let body = extract_frontmatter(document)?.body;
    let section = match link.anchor.as_deref() {
        None => Some(body.to_string()),
        Some(anchor) => extract_section_fuzzy(body, &anchor_to_heading(anchor)),
    };
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &str, anchor: Option<&str>) -> MarkdownLink {
        MarkdownLink {
            text: String::new(),
            path: path.to_string(),
            anchor: anchor.map(str::to_string),
        }
    }

    #[test]
    fn relative_paths_fold_parent_components() {
        let base = Path::new("catalog/organisms/market.md");
        assert_eq!(
            resolve_link_path(base, &link("../molecules/./door-frame.md", None)),
            PathBuf::from("catalog/molecules/door-frame.md")
        );
        assert_eq!(
            resolve_link_path(Path::new("a.md"), &link("../b.md", None)),
            PathBuf::from("../b.md")
        );
    }

    #[test]
    fn anchors_resolve_to_sections() {
        let doc = "---\nid: act1\n---\n# Act 1\n\n## Scene 1: Dawn\n\n### Narrative Context\n\nThe sun rises.\n\n### Rewards\n\nnone\n";
        let section = resolve_doc_ref(doc, &link("act1.md", Some("narrative-context"))).unwrap();
        assert_eq!(section.as_deref().map(str::trim), Some("The sun rises."));

        let whole = resolve_doc_ref(doc, &link("act1.md", None)).unwrap().unwrap();
        assert!(whole.starts_with("# Act 1"));

        assert_eq!(resolve_doc_ref(doc, &link("act1.md", Some("epilogue"))).unwrap(), None);
    }
}

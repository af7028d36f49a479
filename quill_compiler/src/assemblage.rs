//! Assemblage catalog file compiler.
//!
//! A catalog file is optional YAML frontmatter followed by a `# Title`, a
//! description paragraph, and a fixed set of level-2 sections:
//!
//! - `## Layers` with one `### <name>` subsection per tile layer
//! - `## Collision` holding a single 0/1 grid
//! - `## Visuals`, `## Objects`, `## Anchors` as one-entry-per-line bullet lists
//!
//! Every section is optional. Only malformed YAML frontmatter is an error.

use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use log::{debug, warn};
use quill_data::{
    Anchor, AssemblageDefinition, AssemblageObject, CollisionStamp, CompositionRef, ObjectType, ParsedAssemblage,
    PropertyValue, SemanticTile, TileStamp, VariantDef, VisualObject,
};
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::frontmatter::{FrontmatterError, extract_frontmatter, int_pair, seq_field, str_field};
use crate::section::{extract_level2_section, parse_heading};
use crate::table::decode_tile_grid;
use crate::values::{parse_markdown_link, parse_size};

lazy_static! {
    static ref VARIANT_SUFFIX: Regex = Regex::new(r"\s*\([^)]*\)\s*$").expect("variant suffix regex");
    static ref VISUAL_LINE: Regex = Regex::new(
        r"(?i)^\s*[-*]\s+\*\*(.+?)\*\*\s*:\s*(?:object\s+)?`([^`]+)`\s+at\s+position\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)"
    )
    .expect("visual regex");
    static ref OBJECT_LINE: Regex = Regex::new(
        r"(?i)^\s*[-*]\s+\*\*(.+?)\*\*\s*:\s*position\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)\s*,\s*type:\s*([\w-]+)(.*)$"
    )
    .expect("object regex");
    static ref ANCHOR_LINE: Regex = Regex::new(
        r"(?i)^\s*[-*]\s+\*\*(.+?)\*\*\s*:\s*position\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)(?:\s*(?:--|—|–)\s*(.+?))?\s*$"
    )
    .expect("anchor regex");
    static ref OBJECT_DESCRIPTION: Regex = Regex::new(r#"description:\s*"([^"]*)""#).expect("description regex");
    static ref OBJECT_TARGET: Regex = Regex::new(r"target:\s*(\[[^\]]*\]\([^)]*\))").expect("target regex");
    static ref OBJECT_PROPERTIES: Regex = Regex::new(r"properties:\s*\{([^}]*)\}").expect("properties regex");
}

const DEFAULT_PALETTE: &str = "unknown";
const DEFAULT_DESCRIPTION: &str = "No description";

/// Errors that stop an assemblage file from compiling.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
}

/// Compile one catalog file.
///
/// `file_path` supplies the fallback id (basename without extension) and is
/// recorded on the result for resolving relative composition links.
///
/// # Errors
/// Returns `CompileError::Frontmatter` when the frontmatter is not valid YAML.
pub fn parse_assemblage_markdown(text: &str, file_path: impl AsRef<Path>) -> Result<ParsedAssemblage, CompileError> {
    let file_path = file_path.as_ref();
    let extracted = extract_frontmatter(text)?;
    let fm = extracted.frontmatter.unwrap_or_default();
    let body = extracted.body;

    let id = str_field(&fm, "id")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| file_stem(file_path));
    let palette = str_field(&fm, "palette").unwrap_or_else(|| DEFAULT_PALETTE.to_string());
    let object_ref = str_field(&fm, "objectRef");
    let composes = parse_composes(&fm);
    let variants = parse_variants(&fm);

    let layers = parse_layers(body, &id);
    let collision = parse_collision_section(body);
    let visuals = non_empty(extract_level2_section(body, "Visuals").map(|s| parse_visuals(&s)));
    let objects = non_empty(extract_level2_section(body, "Objects").map(|s| parse_objects(&s)));
    let anchors = non_empty(extract_level2_section(body, "Anchors").map(|s| parse_anchors(&s)));

    let (width, height) = match frontmatter_size(&fm) {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => inferred_size(&layers, collision.as_ref()),
    };

    debug!(
        "compiled assemblage '{id}' from {}: {}x{}, {} layers",
        file_path.display(),
        width,
        height,
        layers.len()
    );

    Ok(ParsedAssemblage {
        definition: AssemblageDefinition {
            id,
            description: parse_description(body),
            width,
            height,
            layers,
            collision,
            visuals,
            objects,
            anchors,
        },
        palette,
        file_path: file_path.to_string_lossy().into_owned(),
        object_ref,
        composes,
        variants,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn non_empty<T>(items: Option<Vec<T>>) -> Option<Vec<T>> {
    items.filter(|v| !v.is_empty())
}

/// `size: [w, h]` or `size: WxH`.
fn frontmatter_size(fm: &Mapping) -> Option<(usize, usize)> {
    let value = fm.get("size")?;
    if let Some(s) = value.as_str() {
        return parse_size(s);
    }
    let (w, h) = int_pair(value)?;
    Some((usize::try_from(w).ok()?, usize::try_from(h).ok()?))
}

/// Entries lacking a resolvable link or a two-element `at` are dropped.
fn parse_composes(fm: &Mapping) -> Vec<CompositionRef> {
    let Some(entries) = seq_field(fm, "composes") else {
        return Vec::new();
    };
    entries.iter().filter_map(composition_entry).collect()
}

fn composition_entry(value: &Value) -> Option<CompositionRef> {
    let entry = value.as_mapping()?;
    let link = parse_markdown_link(entry.get("ref")?.as_str()?)?;
    let (x, y) = int_pair(entry.get("at")?)?;
    Some(CompositionRef {
        link,
        at: [i32::try_from(x).ok()?, i32::try_from(y).ok()?],
    })
}

fn parse_variants(fm: &Mapping) -> Vec<VariantDef> {
    let Some(entries) = seq_field(fm, "variants") else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|v| {
            let entry = v.as_mapping()?;
            let id = str_field(entry, "id").filter(|id| !id.trim().is_empty())?;
            Some(VariantDef {
                id,
                description: str_field(entry, "description").unwrap_or_default(),
            })
        })
        .collect()
}

/// First non-blank paragraph after the `# Title` heading.
fn parse_description(body: &str) -> String {
    let mut seen_title = false;
    let mut collected: Vec<&str> = Vec::new();
    for line in body.lines() {
        let heading = parse_heading(line);
        if !seen_title {
            seen_title = heading.is_some_and(|h| h.level == 1);
            continue;
        }
        if heading.is_some() {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        collected.push(trimmed);
    }
    if collected.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        collected.join(" ")
    }
}

/// Layer key for a `### name (variant note)` heading.
pub fn layer_name(heading: &str) -> String {
    VARIANT_SUFFIX.replace(heading, "").trim().to_string()
}

/// Split `## Layers` into `### name` subsections and decode each grid.
///
/// Subsections are merged in document order; a later subsection whose name
/// normalizes to an existing key replaces it.
fn parse_layers(body: &str, id: &str) -> BTreeMap<String, TileStamp> {
    let mut layers = BTreeMap::new();
    let Some(section) = extract_level2_section(body, "Layers") else {
        return layers;
    };

    let mut subsections: Vec<(String, Vec<&str>)> = Vec::new();
    for line in section.lines() {
        match parse_heading(line) {
            Some(h) if h.level == 3 => subsections.push((layer_name(h.text), Vec::new())),
            _ => {
                if let Some((_, lines)) = subsections.last_mut() {
                    lines.push(line);
                }
            },
        }
    }

    for (name, lines) in subsections {
        let Some(stamp) = decode_tile_grid(&lines.join("\n")) else {
            debug!("assemblage '{id}': layer '{name}' has no grid");
            continue;
        };
        if layers.insert(name.clone(), stamp).is_some() {
            warn!("assemblage '{id}': layer '{name}' defined more than once, keeping the later one");
        }
    }
    layers
}

/// Decode `## Collision` and coerce every cell to 0 or 1.
///
/// A cell is 1 exactly when its leading integer is 1; blanks, other numbers,
/// and tags are 0.
pub fn parse_collision_section(body: &str) -> Option<CollisionStamp> {
    let grid = decode_tile_grid(&extract_level2_section(body, "Collision")?)?;
    Some(CollisionStamp {
        width: grid.width,
        height: grid.height,
        data: grid.tiles.iter().map(collision_value).collect(),
    })
}

fn collision_value(tile: &SemanticTile) -> u8 {
    match tile {
        SemanticTile::Empty => 0,
        SemanticTile::Tag(raw) => u8::from(leading_int(raw) == Some(1)),
    }
}

/// Integer prefix of `s` (`"1"`, `"+1"`, `"1px"` all give 1).
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn inferred_size(layers: &BTreeMap<String, TileStamp>, collision: Option<&CollisionStamp>) -> (usize, usize) {
    let dims = layers
        .values()
        .map(|l| (l.width, l.height))
        .chain(collision.map(|c| (c.width, c.height)));
    dims.fold((0, 0), |(w, h), (lw, lh)| (w.max(lw), h.max(lh)))
}

fn coord(raw: &str) -> i32 {
    raw.parse().unwrap_or(0)
}

/// `- **name**: [object ]`ref` at position (x, y)`
fn parse_visuals(section: &str) -> Vec<VisualObject> {
    section
        .lines()
        .filter_map(|line| VISUAL_LINE.captures(line))
        .map(|caps| VisualObject {
            object_ref: caps[2].trim().to_string(),
            x: coord(&caps[3]),
            y: coord(&caps[4]),
        })
        .collect()
}

/// `- **name**: position (x, y), type: TYPE[, rest]`
fn parse_objects(section: &str) -> Vec<AssemblageObject> {
    section
        .lines()
        .filter_map(|line| OBJECT_LINE.captures(line))
        .map(|caps| AssemblageObject {
            name: caps[1].trim().to_string(),
            kind: ObjectType::from_alias(&caps[4]),
            x: coord(&caps[2]),
            y: coord(&caps[3]),
            properties: object_properties(&caps[5]),
        })
        .collect()
}

/// Scan the tail of an object line for `description`, `target`, and `properties`.
fn object_properties(rest: &str) -> Option<BTreeMap<String, PropertyValue>> {
    let mut props = BTreeMap::new();
    if let Some(caps) = OBJECT_DESCRIPTION.captures(rest) {
        props.insert("description".to_string(), PropertyValue::Value(caps[1].to_string()));
    }
    if let Some(link) = OBJECT_TARGET.captures(rest).and_then(|c| parse_markdown_link(&c[1])) {
        let target = match &link.anchor {
            Some(anchor) => format!("{}#{anchor}", link.path),
            None => link.path.clone(),
        };
        props.insert("target".to_string(), PropertyValue::Value(target));
    }
    if let Some(caps) = OBJECT_PROPERTIES.captures(rest) {
        for entry in caps[1].split(',') {
            let (key, value) = match entry.split_once(':') {
                Some((k, v)) => (k.trim(), PropertyValue::Value(unquote(v.trim()))),
                None => (entry.trim(), PropertyValue::Slot),
            };
            if !key.is_empty() {
                props.insert(key.to_string(), value);
            }
        }
    }
    if props.is_empty() { None } else { Some(props) }
}

fn unquote(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
        .to_string()
}

/// `- **name**: position (x, y)[ -- description]`
fn parse_anchors(section: &str) -> Vec<Anchor> {
    section
        .lines()
        .filter_map(|line| ANCHOR_LINE.captures(line))
        .map(|caps| Anchor {
            name: caps[1].trim().to_string(),
            x: coord(&caps[2]),
            y: coord(&caps[3]),
            description: caps.get(4).map(|m| m.as_str().trim().to_string()),
        })
        .collect()
}

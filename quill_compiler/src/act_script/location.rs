//! `**Location**:` field parsing and map-name resolution.

use lazy_static::lazy_static;
use quill_data::Id;
use regex::Regex;

use crate::config::CompilerConfig;
use crate::slug::slugify;
use crate::values::parse_coord;

lazy_static! {
    static ref THEN_CLAUSE: Regex = Regex::new(r"(?i),\s*then\b.*$").expect("then regex");
    static ref COORD: Regex = Regex::new(r"\(\s*-?\d+\s*,\s*-?\d+\s*\)").expect("coord regex");
    static ref CLAUSE_AFTER_COORD: Regex =
        Regex::new(r"(\(\s*-?\d+\s*,\s*-?\d+\s*\))\s*,.*$").expect("clause after coord regex");
    static ref DIMENSIONS: Regex =
        Regex::new(r"(?i)\s*\(\s*\d+\s*[x×]\s*\d+(?:\s*tiles?)?\s*\)").expect("dimensions regex");
    static ref DESCRIPTIVE: Regex =
        Regex::new(r"(?i)\s*\((?:sketch|accessed|at|exterior|interior)\b[^)]*\)").expect("descriptive regex");

    // Em dash, en dash, or a space-padded `--`. A bare `-` is part of names like "Half-Drawn".
    static ref SUB_WITH_COORD: Regex = Regex::new(
        r"^(.+?)(?:\s*[—–]\s*|\s+--\s+)(.+?)\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)\s*$"
    )
    .expect("sub with coord regex");
    static ref SUB_ONLY: Regex = Regex::new(r"^(.+?)(?:\s*[—–]\s*|\s+--\s+)(.+)$").expect("sub regex");
    static ref MAP_WITH_COORD: Regex =
        Regex::new(r"^(.+?)\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)\s*$").expect("map coord regex");
    static ref MAP_WITH_NOTE: Regex = Regex::new(r"^(.+?)\s*\(([^)]*)\)\s*$").expect("map note regex");
}

/// Result of parsing a scene location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    pub map_id: Id,
    pub map_name: String,
    pub sub_location: Option<String>,
    /// `"x,y"`
    pub spawn_position: Option<String>,
    /// Whether the raw map name was a key of the map table.
    pub known_map: bool,
}

/// Map id for a display name, and whether the raw lowercase name was a table key.
///
/// Tried in order: the raw key, the key without a leading "the ", the first
/// word of each, then the stripped key joined with hyphens. Anything else
/// falls back to a kebab-case slug of the stripped name.
pub fn resolve_map_id(name: &str, config: &CompilerConfig) -> (Id, bool) {
    let raw = name.trim().to_lowercase();
    let stripped = raw.strip_prefix("the ").unwrap_or(&raw).trim();
    let first_word = |s: &str| s.split_whitespace().next().unwrap_or_default().to_string();
    let hyphenated = stripped.split_whitespace().collect::<Vec<_>>().join("-");

    let known = config.map_id(&raw).is_some();
    let candidates = [
        raw.clone(),
        stripped.to_string(),
        first_word(&raw),
        first_word(stripped),
        hyphenated,
    ];
    let found = candidates
        .iter()
        .filter(|key| !key.is_empty())
        .find_map(|key| config.map_id(key));
    let id = match found {
        Some(id) => id.to_string(),
        None => {
            let slug = slugify(stripped);
            if slug.is_empty() { "unknown".to_string() } else { slug }
        },
    };
    (id, known)
}

/// Remove trailing clauses and parentheticals that carry no location data.
fn strip_noise(raw: &str) -> String {
    let s = THEN_CLAUSE.replace(raw.trim(), "");
    let s = CLAUSE_AFTER_COORD.replace(&s, "$1");
    let s = DIMENSIONS.replace_all(&s, "");
    let s = DESCRIPTIVE.replace_all(&s, "");
    s.trim().trim_end_matches(',').trim().to_string()
}

fn position(x: &str, y: &str) -> String {
    format!("{},{}", x.trim(), y.trim())
}

/// Parse `Map — Sub (x, y)` and its looser variants.
pub fn parse_location(raw: &str, config: &CompilerConfig) -> ParsedLocation {
    let cleaned = strip_noise(raw);

    let (map_name, sub_location, spawn_position) = if let Some(caps) = SUB_WITH_COORD.captures(&cleaned) {
        (
            caps[1].trim().to_string(),
            Some(caps[2].trim().to_string()),
            Some(position(&caps[3], &caps[4])),
        )
    } else if let Some(caps) = SUB_ONLY.captures(&cleaned) {
        let sub = caps[2].trim();
        let spawn = parse_coord(sub).map(|(x, y)| format!("{x},{y}"));
        let sub = COORD.replace_all(sub, " ");
        let sub = sub.split_whitespace().collect::<Vec<_>>().join(" ");
        (caps[1].trim().to_string(), Some(sub).filter(|s| !s.is_empty()), spawn)
    } else if let Some(caps) = MAP_WITH_COORD.captures(&cleaned) {
        (caps[1].trim().to_string(), None, Some(position(&caps[2], &caps[3])))
    } else if let Some(caps) = MAP_WITH_NOTE.captures(&cleaned) {
        let note = caps[2].trim().to_string();
        (caps[1].trim().to_string(), Some(note).filter(|s| !s.is_empty()), None)
    } else {
        (cleaned.clone(), None, None)
    };

    let (map_id, known_map) = resolve_map_id(&map_name, config);
    ParsedLocation {
        map_id,
        map_name,
        sub_location,
        spawn_position,
        known_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedLocation {
        parse_location(raw, &CompilerConfig::default())
    }

    #[test]
    fn map_sub_and_coordinates() {
        let loc = parse("Heartfield — Stagnation Clearing (35, 30)");
        assert_eq!(loc.map_id, "heartfield");
        assert_eq!(loc.sub_location.as_deref(), Some("Stagnation Clearing"));
        assert_eq!(loc.spawn_position.as_deref(), Some("35,30"));
        assert!(loc.known_map);
    }

    #[test]
    fn trailing_clause_after_coordinates_is_dropped() {
        let loc = parse("Sunridge — The Threshold (20, 2), transitioning to Hollow Ridge");
        assert_eq!(loc.map_id, "sunridge");
        assert_eq!(loc.sub_location.as_deref(), Some("The Threshold"));
        assert_eq!(loc.spawn_position.as_deref(), Some("20,2"));
    }

    #[test]
    fn then_clause_and_dimensions_are_stripped() {
        let loc = parse("Hollow Ridge (40x40 tiles) -- Lookout, then the valley below");
        assert_eq!(loc.map_id, "hollow-ridge");
        assert_eq!(loc.sub_location.as_deref(), Some("Lookout"));
        assert_eq!(loc.spawn_position, None);
    }

    #[test]
    fn coordinates_embedded_in_sub_location() {
        let loc = parse("Heartfield – Well (12, 8) by the square");
        assert_eq!(loc.sub_location.as_deref(), Some("Well by the square"));
        assert_eq!(loc.spawn_position.as_deref(), Some("12,8"));
    }

    #[test]
    fn single_hyphen_is_not_a_separator() {
        let loc = parse("The Half-Drawn Bridge (4, 9)");
        assert_eq!(loc.map_name, "The Half-Drawn Bridge");
        assert_eq!(loc.map_id, "half-drawn-bridge");
        assert_eq!(loc.sub_location, None);
        assert_eq!(loc.spawn_position.as_deref(), Some("4,9"));
        assert!(!loc.known_map);
    }

    #[test]
    fn descriptive_and_note_parentheticals() {
        let loc = parse("Millbrook (exterior view)");
        assert_eq!(loc.map_id, "millbrook");
        assert_eq!(loc.sub_location, None);

        let loc = parse("Millbrook (river bank)");
        assert_eq!(loc.sub_location.as_deref(), Some("river bank"));
    }

    #[test]
    fn resolution_tiers() {
        let config = CompilerConfig::default();
        assert_eq!(resolve_map_id("The Sunridge", &config), ("sunridge".to_string(), false));
        assert_eq!(resolve_map_id("Stillwater Docks", &config), ("stillwater-marsh".to_string(), false));
        assert_eq!(resolve_map_id("Lumen Spire", &config), ("lumen-spire".to_string(), true));
        assert_eq!(resolve_map_id("Brann's Forge", &config), ("branns-forge".to_string(), false));
        assert_eq!(resolve_map_id("", &config), ("unknown".to_string(), false));
    }
}

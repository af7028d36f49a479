//! NPC discovery from the `Characters` field and `**Name**: line` dialogue.

use std::collections::HashMap;

use lazy_static::lazy_static;
use quill_data::SceneNpc;
use regex::Regex;

use crate::config::CompilerConfig;
use crate::slug::slugify;

lazy_static! {
    static ref DIALOGUE_LINE: Regex = Regex::new(r"(?m)^\*\*([^*:\n]+?)(?::\*\*|\*\*[ \t]*:)[ \t]*(.+)$").expect("dialogue regex");
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]*\)").expect("parenthetical regex");
}

const MAX_NAME_LEN: usize = 40;
const MAX_NAME_WORDS: usize = 4;

/// Bold labels used for scene metadata rather than speakers.
const METADATA_LABELS: &[&str] = &[
    "location",
    "trigger",
    "characters",
    "time of day",
    "time",
    "mechanic",
    "item",
    "item received",
    "items",
    "companion",
    "vibrancy",
    "quest",
    "quest update",
    "reward",
    "rewards",
    "objective",
    "note",
    "system",
    "setting",
    "mood",
];

const QUANTIFIERS: &[&str] = &["every", "all", "multiple", "various", "several", "some", "many", "any"];

/// Heuristic filter for strings that name a character.
pub fn is_likely_npc_name(name: &str, config: &CompilerConfig) -> bool {
    let name = name.trim();
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    if name.chars().count() < 2 || name.chars().count() > MAX_NAME_LEN || words.len() > MAX_NAME_WORDS {
        return false;
    }
    if lower.contains("player") || lower.contains("procedural") {
        return false;
    }
    if METADATA_LABELS.contains(&lower.as_str()) {
        return false;
    }
    if words.iter().any(|w| QUANTIFIERS.contains(w)) {
        return false;
    }
    if config.map_id(&lower).is_some() {
        return false;
    }
    name.chars().any(char::is_uppercase)
}

/// Names listed in a `Characters` field, parentheticals removed.
fn character_names(field: &str) -> Vec<String> {
    PARENTHETICAL
        .replace_all(field, "")
        .split(',')
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Collect the scene's NPCs, `Characters` entries first and then speakers in
/// order of first line, de-duplicated by slug id.
pub fn extract_npcs(characters: Option<&str>, body: &str, config: &CompilerConfig) -> Vec<SceneNpc> {
    let mut npcs: Vec<SceneNpc> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut add = |name: &str, npcs: &mut Vec<SceneNpc>| -> Option<usize> {
        if !is_likely_npc_name(name, config) {
            return None;
        }
        let id = slugify(name);
        if id.is_empty() {
            return None;
        }
        Some(*index.entry(id.clone()).or_insert_with(|| {
            npcs.push(SceneNpc {
                id,
                name: name.to_string(),
                dialogue_lines: 0,
            });
            npcs.len() - 1
        }))
    };

    for name in characters.map(character_names).unwrap_or_default() {
        add(&name, &mut npcs);
    }
    for caps in DIALOGUE_LINE.captures_iter(body) {
        if let Some(i) = add(caps[1].trim(), &mut npcs) {
            npcs[i].dialogue_lines += 1;
        }
    }
    npcs
}

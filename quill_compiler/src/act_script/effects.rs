//! Scene effects and quest state changes.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use quill_data::{EffectType, QuestAction, QuestChange, SceneEffect};
use regex::Regex;

use super::trigger::QUEST_ID;
use crate::slug::slugify;

lazy_static! {
    static ref SYSTEM_MESSAGE: Regex =
        Regex::new(r"(?m)^>[ \t]*\*\*SYSTEM[^*]*\*\*:?[ \t]*(.+)$").expect("system message regex");
    static ref LABELED: Regex = Regex::new(
        r"(?mi)^[ \t]*(?:[-*>][ \t]*)*\*\*(item received|item|companion|vibrancy|quest update)[ \t]*:?\*\*[ \t]*:?[ \t]*(.+)$"
    )
    .expect("labeled effect regex");
    static ref JOINS_PARTY: Regex =
        Regex::new(r"\b([A-Z][\w'’-]*(?:[ \t]+[A-Z][\w'’-]*)*)[ \t]+joins\s+(?:the\s+)?party").expect("joins regex");
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]+)`").expect("inline code regex");
    static ref SIGNED_NUMBER: Regex = Regex::new(r"[+-]?\d+").expect("number regex");
}

const ACTIVATE_WORDS: &[&str] = &["activat", "start", "begin", "unlock", "accept"];
const COMPLETE_WORDS: &[&str] = &["complet", "finish", "resolv"];
const UPDATE_WORDS: &[&str] = &["updat", "progress", "advance"];
/// Capitalised sentence openers that are never part of a companion's name.
const NAME_OPENERS: &[&str] = &[
    "Then", "And", "But", "So", "Now", "Finally", "Soon", "Later", "Suddenly", "Meanwhile", "Eventually", "Here",
];

/// Id of an item named in free text: an inline-code span wins, otherwise the
/// slug of the text before any parenthetical or `-` gloss.
pub fn item_id(text: &str) -> String {
    if let Some(caps) = INLINE_CODE.captures(text) {
        return caps[1].trim().to_string();
    }
    let name = text.split(['(', '—', '–']).next().unwrap_or_default();
    let name = name.split(" - ").next().unwrap_or_default();
    slugify(name.trim_matches(|c: char| c == '*' || c.is_whitespace()))
}

fn params(pairs: &[(&str, String)]) -> Option<BTreeMap<String, String>> {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect();
    if map.is_empty() { None } else { Some(map) }
}

/// Scan a scene body for system messages, labeled effect lines, and
/// "X joins the party" phrasing, in that order.
pub fn extract_effects(body: &str) -> Vec<SceneEffect> {
    let mut effects: Vec<SceneEffect> = SYSTEM_MESSAGE
        .captures_iter(body)
        .map(|caps| SceneEffect {
            kind: EffectType::SystemMessage,
            description: caps[1].trim().to_string(),
            params: None,
        })
        .collect();

    for caps in LABELED.captures_iter(body) {
        let value = caps[2].trim().to_string();
        let (kind, params) = match caps[1].to_lowercase().as_str() {
            "item" | "item received" => (EffectType::ItemGive, params(&[("item", item_id(&value))])),
            "companion" => (EffectType::CompanionJoin, params(&[("companion", item_id(&value))])),
            "vibrancy" => {
                let delta = SIGNED_NUMBER
                    .find(&value)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (EffectType::VibrancyChange, params(&[("delta", delta)]))
            },
            _ => {
                let quest = QUEST_ID.find(&value).map(|m| m.as_str().to_string()).unwrap_or_default();
                (EffectType::QuestUpdate, params(&[("quest", quest)]))
            },
        };
        effects.push(SceneEffect {
            kind,
            description: value,
            params,
        });
    }

    let mut companions: HashSet<String> = effects
        .iter()
        .filter(|e| e.kind == EffectType::CompanionJoin)
        .filter_map(|e| e.params.as_ref()?.get("companion").cloned())
        .collect();
    for caps in JOINS_PARTY.captures_iter(body) {
        let name = companion_name(&caps[1]);
        let id = slugify(&name);
        if id.is_empty() || !companions.insert(id.clone()) {
            continue;
        }
        effects.push(SceneEffect {
            kind: EffectType::CompanionJoin,
            description: format!("{name} joins the party"),
            params: params(&[("companion", id)]),
        });
    }
    effects
}

/// Capitalised run before "joins", minus any leading sentence opener.
fn companion_name(captured: &str) -> String {
    captured
        .split_whitespace()
        .skip_while(|word| NAME_OPENERS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn classify_quest_line(lower: &str) -> Option<QuestAction> {
    let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if any(ACTIVATE_WORDS) {
        Some(QuestAction::Activate)
    } else if any(COMPLETE_WORDS) {
        Some(QuestAction::Complete)
    } else if any(UPDATE_WORDS) {
        Some(QuestAction::Update)
    } else {
        None
    }
}

/// Quest changes from lines naming an `MQ-n`/`SQ-n` id and an action verb.
/// Ordered by first appearance, duplicates dropped.
pub fn extract_quest_changes(body: &str) -> Vec<QuestChange> {
    let mut seen = HashSet::new();
    let mut changes = Vec::new();
    for line in body.lines() {
        if !QUEST_ID.is_match(line) {
            continue;
        }
        let Some(action) = classify_quest_line(&line.to_lowercase()) else {
            continue;
        };
        for m in QUEST_ID.find_iter(line) {
            let change = QuestChange {
                quest_id: m.as_str().to_string(),
                action,
            };
            if seen.insert(change.clone()) {
                changes.push(change);
            }
        }
    }
    changes
}

/// Every distinct quest id mentioned, in order of first appearance.
pub fn quest_ids(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    QUEST_ID
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

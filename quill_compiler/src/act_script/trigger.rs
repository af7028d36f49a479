//! `**Trigger**:` classification.

use lazy_static::lazy_static;
use quill_data::{SceneTrigger, TriggerType};
use regex::Regex;

use crate::values::parse_coord;

lazy_static! {
    pub(crate) static ref QUEST_ID: Regex = Regex::new(r"\b(?:MQ|SQ)-\d+\b").expect("quest id regex");
}

const FIRST_VISIT: &str = "first-visit";

/// Classify free trigger text with a keyword waterfall; the first rule that
/// fires decides the type.
///
/// `spawn_position` is the scene's location position, used both for the
/// final fallback and as the position of `area-enter` triggers whose text
/// names no tile.
pub fn classify_trigger(text: Option<&str>, map_id: &str, spawn_position: Option<&str>) -> SceneTrigger {
    let raw = text.unwrap_or_default();
    let t = raw.to_lowercase();
    let has = |needle: &str| t.contains(needle);

    let mut condition = None;
    let kind = if has("game start") || has("opening") {
        TriggerType::Auto
    } else if (has("enters") && has("tile")) || has("approaches") {
        TriggerType::AreaEnter
    } else if has("enters") && (has("map") || has("workshop") || has("house")) {
        if has("first") {
            condition = Some(FIRST_VISIT.to_string());
        }
        TriggerType::MapEnter
    } else if has("exits") || has("via") {
        condition = Some(FIRST_VISIT.to_string());
        TriggerType::MapEnter
    } else if has("quest") || has("after") {
        condition = QUEST_ID.find(raw).map(|m| m.as_str().to_string());
        TriggerType::QuestState
    } else if has("talk") || has("speak") {
        TriggerType::NpcTalk
    } else if has("cutscene") {
        TriggerType::Cutscene
    } else if spawn_position.is_some() {
        TriggerType::AreaEnter
    } else {
        TriggerType::MapEnter
    };

    let position = match kind {
        TriggerType::AreaEnter => parse_coord(raw)
            .map(|(x, y)| format!("{x},{y}"))
            .or_else(|| spawn_position.map(str::to_string)),
        _ => None,
    };

    SceneTrigger {
        kind,
        map: map_id.to_string(),
        position,
        condition,
    }
}

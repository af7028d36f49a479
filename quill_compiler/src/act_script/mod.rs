//! Act-script compiler.
//!
//! An act script is a narrative document split into `## Scene N: Name`
//! sections. Each scene carries bold-labeled metadata fields (`**Location**:`,
//! `**Trigger**:`, `**Characters**:`, `**Time of day**:`), `###` subsections
//! (Narrative Context, Player Actions, Tutorial Integration, Rewards),
//! `> **SYSTEM**:` messages, and `**Name**: line` dialogue. Every scene becomes
//! one [`SceneDdl`] record.
//!
//! Nothing in a scene is required. Missing content yields `None` or empty
//! collections; map names missing from the map table also add an entry to
//! [`ActScript::warnings`]. Prerequisites and level ranges come from the act
//! and scene numbers alone.

mod effects;
mod location;
mod npc;
mod subsections;
mod trigger;

pub use effects::{extract_effects, extract_quest_changes, item_id, quest_ids};
pub use location::{ParsedLocation, parse_location, resolve_map_id};
pub use npc::{extract_npcs, is_likely_npc_name};
pub use trigger::classify_trigger;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use quill_data::{ActScript, EffectType, QuestAction, SceneDdl, TestCriteria};
use regex::Regex;

use crate::config::CompilerConfig;
use crate::section::extract_section_fuzzy;
use crate::slug::slugify;

lazy_static! {
    static ref SCENE_HEADING: Regex = Regex::new(r"(?m)^##\s+Scene\s+(\d+)\s*:\s*(.+)$").expect("scene heading regex");
    static ref FIELD_LINE: Regex =
        Regex::new(r"(?m)^[ \t]*(?:[-*][ \t]+)?\*\*([^*\n]+?):?\*\*[ \t]*:?[ \t]*(.*)$").expect("field regex");
}

/// One `## Scene N: Name` slice of an act script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSource<'a> {
    pub number: u32,
    pub name: &'a str,
    pub body: &'a str,
}

/// Split an act script into scenes. A scene's body runs to the next scene heading.
pub fn split_scenes(text: &str) -> Vec<SceneSource<'_>> {
    let headings: Vec<_> = SCENE_HEADING.captures_iter(text).collect();
    headings
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            Some(SceneSource {
                number: caps[1].parse().ok()?,
                name: caps.get(2)?.as_str().trim(),
                body: &text[whole.end()..end],
            })
        })
        .collect()
}

/// Value of a `**Label**: value` field (also `**Label:** value` and list-item forms).
///
/// Labels compare case-insensitively; the first field with a non-empty value wins.
pub fn extract_field(body: &str, label: &str) -> Option<String> {
    FIELD_LINE
        .captures_iter(body)
        .filter(|caps| caps[1].trim().eq_ignore_ascii_case(label.trim()))
        .map(|caps| caps[2].trim().to_string())
        .find(|value| !value.is_empty())
}

/// Compile an act script with the built-in map and level tables.
pub fn compile_act_script(text: &str, act: u32) -> ActScript {
    compile_act_script_with(text, act, &CompilerConfig::default())
}

/// Compile an act script into one [`SceneDdl`] per scene heading.
pub fn compile_act_script_with(text: &str, act: u32, config: &CompilerConfig) -> ActScript {
    let mut script = ActScript {
        act,
        ..ActScript::default()
    };

    for source in split_scenes(text) {
        let scene = compile_scene(&source, act, config, &mut script.warnings);
        debug!("act {act}: compiled scene {} '{}'", scene.scene_number, scene.id);
        script.scenes.push(scene);
    }

    info!(
        "act {act}: {} scenes compiled, {} warnings",
        script.scenes.len(),
        script.warnings.len()
    );
    script
}

fn scene_id(act: u32, number: u32, slug: &str) -> String {
    if slug.is_empty() {
        format!("act{act}-scene{number}")
    } else {
        format!("act{act}-scene{number}-{slug}")
    }
}

fn target_path(act: u32, number: u32, slug: &str) -> String {
    if slug.is_empty() {
        format!("scenes/act{act}/scene-{number:02}.json")
    } else {
        format!("scenes/act{act}/scene-{number:02}-{slug}.json")
    }
}

/// Scene 1 of act N waits on act N-1; any other scene waits on the scene
/// numbered before it in the same act.
fn prerequisites(act: u32, number: u32) -> Option<Vec<String>> {
    match number {
        0 => None,
        1 if act <= 1 => None,
        1 => Some(vec![format!("act{}-complete", act - 1)]),
        n => Some(vec![format!("act{act}-scene{}", n - 1)]),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn compile_scene(
    source: &SceneSource<'_>,
    act: u32,
    config: &CompilerConfig,
    warnings: &mut Vec<String>,
) -> SceneDdl {
    let body = source.body;
    let slug = slugify(source.name);
    let id = scene_id(act, source.number, &slug);

    let location = extract_field(body, "Location").map(|raw| parse_location(&raw, config));
    let (map_id, sub_location, spawn_position) = match location {
        Some(loc) => {
            if !loc.known_map {
                let msg = format!(
                    "scene {} ({}): map '{}' not in map table, using '{}'",
                    source.number, source.name, loc.map_name, loc.map_id
                );
                warn!("{msg}");
                warnings.push(msg);
            }
            (loc.map_id, loc.sub_location, loc.spawn_position)
        },
        None => {
            warn!("scene {} ({}): no Location field", source.number, source.name);
            ("unknown".to_string(), None, None)
        },
    };

    let trigger = classify_trigger(
        extract_field(body, "Trigger").as_deref(),
        &map_id,
        spawn_position.as_deref(),
    );
    let npcs = extract_npcs(extract_field(body, "Characters").as_deref(), body, config);
    let effects = extract_effects(body);
    let quest_changes = extract_quest_changes(body);

    let narrative = extract_section_fuzzy(body, "Narrative Context")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let summary = match narrative.as_deref().and_then(subsections::first_paragraph) {
        Some(paragraph) => subsections::truncate_summary(&paragraph),
        None => {
            let place = sub_location.as_deref().unwrap_or(&map_id);
            format!("Act {act}, scene {}: {} at {place}.", source.number, source.name)
        },
    };

    let mechanic_taught = extract_section_fuzzy(body, "Tutorial Integration")
        .and_then(|s| subsections::first_line(&s))
        .or_else(|| extract_field(body, "Mechanic"));
    let player_instructions = extract_section_fuzzy(body, "Player Actions")
        .map(|s| subsections::list_items(&s))
        .and_then(non_empty);

    let mut items: Vec<String> = Vec::new();
    for effect in effects.iter().filter(|e| e.kind == EffectType::ItemGive) {
        if let Some(item) = effect.params.as_ref().and_then(|p| p.get("item")) {
            push_unique(&mut items, item);
        }
    }
    let mut item_refs = items.clone();
    if let Some(rewards) = extract_section_fuzzy(body, "Rewards") {
        for item in subsections::reward_items(&rewards) {
            push_unique(&mut item_refs, &item);
        }
    }

    let mut quests: Vec<String> = Vec::new();
    for change in quest_changes
        .iter()
        .filter(|c| matches!(c.action, QuestAction::Activate | QuestAction::Complete))
    {
        push_unique(&mut quests, &change.quest_id);
    }
    let test_criteria = if quests.is_empty() && items.is_empty() {
        None
    } else {
        Some(TestCriteria { quests, items })
    };

    let dialogue_refs = npcs
        .iter()
        .filter(|n| n.dialogue_lines > 0)
        .map(|n| format!("{id}/{}", n.id))
        .collect();

    SceneDdl {
        target_path: target_path(act, source.number, &slug),
        act,
        scene_number: source.number,
        name: source.name.to_string(),
        summary,
        map_id,
        sub_location,
        spawn_position,
        trigger,
        npcs,
        effects,
        quest_changes,
        dialogue_refs,
        quest_refs: non_empty(quest_ids(body)),
        item_refs: non_empty(item_refs),
        assemblages: Vec::new(),
        paths: Vec::new(),
        visuals: Vec::new(),
        events: Vec::new(),
        resonance_stones: Vec::new(),
        treasure_chests: Vec::new(),
        narrative_context: narrative,
        time_of_day: extract_field(body, "Time of day"),
        mechanic_taught,
        prerequisites: prerequisites(act, source.number),
        test_criteria,
        player_instructions,
        level_range: config.level_range(act),
        id,
    }
}

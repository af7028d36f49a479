use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Structural problem found in a compiled record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateName { kind: &'static str, name: String },
    ShapeMismatch { context: String, expected: usize, found: usize },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateName { kind, name } => {
                write!(f, "duplicate {kind} name '{name}'")
            },
            ValidationError::ShapeMismatch {
                context,
                expected,
                found,
            } => {
                write!(f, "{context}: expected {expected} cells, found {found}")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate the structural invariants of an assemblage definition.
///
/// This does not check game-design correctness such as whether a transition
/// target exists; it only checks that the compiled shapes are self-consistent.
///
/// ```
/// use std::collections::BTreeMap;
/// use quill_data::{AssemblageDefinition, SemanticTile, TileStamp, validate_assemblage};
///
/// let mut layers = BTreeMap::new();
/// layers.insert(
///     "ground".to_string(),
///     TileStamp { width: 2, height: 1, tiles: vec![SemanticTile::Empty, SemanticTile::Empty] },
/// );
/// let def = AssemblageDefinition {
///     id: "patch".into(),
///     description: "A patch of ground.".into(),
///     width: 2,
///     height: 1,
///     layers,
///     collision: None,
///     visuals: None,
///     objects: None,
///     anchors: None,
/// };
/// assert!(validate_assemblage(&def).is_empty());
/// ```
pub fn validate_assemblage(def: &AssemblageDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if def.id.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "assemblage id is empty".to_string(),
        });
    }

    for (name, stamp) in &def.layers {
        check_shape(
            format!("assemblage '{}' layer '{name}'", def.id),
            stamp.width * stamp.height,
            stamp.tiles.len(),
            &mut errors,
        );
    }

    if let Some(collision) = &def.collision {
        let context = format!("assemblage '{}' collision", def.id);
        check_shape(
            context.clone(),
            collision.width * collision.height,
            collision.data.len(),
            &mut errors,
        );
        if let Some(bad) = collision.data.iter().find(|v| **v > 1) {
            errors.push(ValidationError::InvalidValue {
                context: format!("{context}: value {bad} is not 0 or 1"),
            });
        }
    }

    if let Some(objects) = &def.objects {
        track_names("object", objects.iter().map(|o| o.name.as_str()), &mut errors);
    }
    if let Some(anchors) = &def.anchors {
        track_names("anchor", anchors.iter().map(|a| a.name.as_str()), &mut errors);
    }

    errors
}

/// Validate a compiled scene record.
pub fn validate_scene(scene: &SceneDdl) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if scene.map_id.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: format!("scene '{}' has no map id", scene.id),
        });
    }
    if scene.level_range.min > scene.level_range.max {
        errors.push(ValidationError::InvalidValue {
            context: format!(
                "scene '{}' level range {}..{} is inverted",
                scene.id, scene.level_range.min, scene.level_range.max
            ),
        });
    }
    track_names("npc", scene.npcs.iter().map(|n| n.id.as_str()), &mut errors);
    errors
}

fn check_shape(context: String, expected: usize, found: usize, errors: &mut Vec<ValidationError>) {
    if expected != found {
        errors.push(ValidationError::ShapeMismatch {
            context,
            expected,
            found,
        });
    }
}

fn track_names<'a, I>(kind: &'static str, names: I, errors: &mut Vec<ValidationError>)
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn definition() -> AssemblageDefinition {
        AssemblageDefinition {
            id: "well".into(),
            description: "A stone well.".into(),
            width: 2,
            height: 2,
            layers: BTreeMap::new(),
            collision: None,
            visuals: None,
            objects: None,
            anchors: None,
        }
    }

    #[test]
    fn short_layer_is_reported() {
        let mut def = definition();
        def.layers.insert(
            "ground".into(),
            TileStamp {
                width: 2,
                height: 2,
                tiles: vec![SemanticTile::Empty; 3],
            },
        );
        let errors = validate_assemblage(&def);
        assert_eq!(
            errors,
            vec![ValidationError::ShapeMismatch {
                context: "assemblage 'well' layer 'ground'".into(),
                expected: 4,
                found: 3,
            }]
        );
    }

    #[test]
    fn collision_values_above_one_are_reported() {
        let mut def = definition();
        def.collision = Some(CollisionStamp {
            width: 2,
            height: 1,
            data: vec![1, 2],
        });
        let errors = validate_assemblage(&def);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("value 2"));
    }

    #[test]
    fn duplicate_anchor_names_are_reported() {
        let mut def = definition();
        let anchor = Anchor {
            name: "entry".into(),
            x: 0,
            y: 0,
            description: None,
        };
        def.anchors = Some(vec![anchor.clone(), anchor]);
        let errors = validate_assemblage(&def);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateName {
                kind: "anchor",
                name: "entry".into(),
            }]
        );
    }

    #[test]
    fn inverted_level_range_is_reported() {
        let scene = SceneDdl {
            id: "act1-scene1-x".into(),
            act: 1,
            scene_number: 1,
            name: "X".into(),
            summary: String::new(),
            map_id: "heartfield".into(),
            sub_location: None,
            spawn_position: None,
            trigger: SceneTrigger {
                kind: TriggerType::Auto,
                map: "heartfield".into(),
                position: None,
                condition: None,
            },
            npcs: Vec::new(),
            effects: Vec::new(),
            quest_changes: Vec::new(),
            dialogue_refs: Vec::new(),
            quest_refs: None,
            item_refs: None,
            assemblages: Vec::new(),
            paths: Vec::new(),
            visuals: Vec::new(),
            events: Vec::new(),
            resonance_stones: Vec::new(),
            treasure_chests: Vec::new(),
            narrative_context: None,
            time_of_day: None,
            mechanic_taught: None,
            prerequisites: None,
            test_criteria: None,
            player_instructions: None,
            level_range: LevelRange { min: 5, max: 2 },
            target_path: String::new(),
        };
        let errors = validate_scene(&scene);
        assert_eq!(errors.len(), 1);
    }
}

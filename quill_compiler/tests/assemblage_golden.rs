use pretty_assertions::assert_eq;
use quill_compiler::parse_assemblage_markdown;
use quill_data::{ObjectType, ParsedAssemblage, PropertyValue, SemanticTile, validate_assemblage};

const DOOR_FRAME: &str = include_str!("fixtures/door-frame.md");
const MARKET_ROW: &str = include_str!("fixtures/market-row.md");

fn tag(s: &str) -> SemanticTile {
    SemanticTile::Tag(s.to_string())
}

#[test]
fn door_frame_golden() {
    let parsed = parse_assemblage_markdown(DOOR_FRAME, "catalog/molecules/door-frame.md").expect("compile ok");
    let actual = serde_json::to_value(&parsed).expect("serialize");
    let expected: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/door-frame.json")).expect("parse expected");
    assert_eq!(actual, expected);
}

#[test]
fn door_frame_end_to_end() {
    let parsed = parse_assemblage_markdown(DOOR_FRAME, "door-frame.md").expect("compile ok");
    let def = &parsed.definition;
    assert_eq!((def.width, def.height), (1, 2));
    assert_eq!(
        def.layers["objects"].tiles,
        vec![tag("object:door.wood-header"), tag("object:door.wood")]
    );
    assert_eq!(def.collision.as_ref().map(|c| c.data.clone()), Some(vec![1, 0]));

    let objects = def.objects.as_ref().expect("objects");
    assert_eq!(objects[0].kind, ObjectType::Transition);
    let props = objects[0].properties.as_ref().expect("properties");
    for key in ["targetMap", "targetX", "targetY"] {
        assert_eq!(props[key], PropertyValue::Slot, "{key}");
    }
    assert!(validate_assemblage(def).is_empty());
}

#[test]
fn market_row_layers_and_compositions() {
    let parsed = parse_assemblage_markdown(MARKET_ROW, "catalog/organisms/market-row.md").expect("compile ok");
    let def = &parsed.definition;
    assert_eq!((def.width, def.height), (4, 3));
    assert_eq!(def.description, "A short run of shopfronts.");

    // "(summer variant)" and "(winter variant)" both key to "objects"; the later one stays.
    assert_eq!(def.layers.len(), 2);
    let objects = &def.layers["objects"];
    assert_eq!((objects.width, objects.height), (4, 1));
    assert_eq!(objects.tiles[1], tag("object:snowdrift"));
    assert_eq!(def.layers["ground"].get(1, 1), Some(&SemanticTile::Empty));

    let collision = def.collision.as_ref().expect("collision");
    assert_eq!(collision.data, vec![1, 1, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0]);
    assert!(collision.is_blocked(0, 1));
    assert!(!collision.is_blocked(1, 1));

    assert_eq!(parsed.composes.len(), 2);
    assert_eq!(parsed.composes[0].link.text, "door-frame");
    assert_eq!(parsed.composes[0].link.path, "../molecules/door-frame.md");
    assert_eq!(parsed.composes[0].at, [1, 1]);
    assert_eq!(parsed.composes[1].link.anchor.as_deref(), Some("awning"));

    let visuals = def.visuals.as_ref().expect("visuals");
    assert_eq!(visuals[0].object_ref, "object:lamp.iron");
    let objects = def.objects.as_ref().expect("objects");
    assert_eq!(objects[0].kind, ObjectType::Npc);
    assert_eq!(objects[1].kind, ObjectType::Chest);
    assert_eq!(def.anchors, None);
}

#[test]
fn compiling_twice_is_identical() {
    let first = parse_assemblage_markdown(MARKET_ROW, "market-row.md").unwrap();
    let second = parse_assemblage_markdown(MARKET_ROW, "market-row.md").unwrap();
    assert_eq!(first, second);
}

#[test]
fn serialized_output_reads_back() {
    let parsed = parse_assemblage_markdown(DOOR_FRAME, "door-frame.md").unwrap();
    let json = serde_json::to_string(&parsed).unwrap();
    let back: ParsedAssemblage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, parsed);
}

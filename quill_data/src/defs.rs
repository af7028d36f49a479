use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier used across catalog and scene references.
pub type Id = String;

/// Marker text written for object properties that still need authoring.
pub const SLOT_MARKER: &str = "<slot>";

/// A single cell of a tile layer: empty, or a semantic tag resolved by a palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SemanticTile {
    #[default]
    Empty,
    Tag(String),
}

impl SemanticTile {
    /// Normalize a raw grid cell: blank and `"0"` are empty, anything else is a tag.
    pub fn from_cell(raw: &str) -> Self {
        let cell = raw.trim();
        if cell.is_empty() || cell == "0" {
            SemanticTile::Empty
        } else {
            SemanticTile::Tag(cell.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SemanticTile::Empty)
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            SemanticTile::Empty => None,
            SemanticTile::Tag(tag) => Some(tag),
        }
    }
}

impl fmt::Display for SemanticTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticTile::Empty => write!(f, "0"),
            SemanticTile::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

impl Serialize for SemanticTile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SemanticTile::Empty => serializer.serialize_u8(0),
            SemanticTile::Tag(tag) => serializer.serialize_str(tag),
        }
    }
}

impl<'de> Deserialize<'de> for SemanticTile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTile {
            Number(u64),
            Text(String),
        }

        match RawTile::deserialize(deserializer)? {
            RawTile::Number(0) => Ok(SemanticTile::Empty),
            RawTile::Number(n) => Err(de::Error::custom(format!(
                "numeric tile must be 0, found {n}"
            ))),
            RawTile::Text(text) => Ok(SemanticTile::from_cell(&text)),
        }
    }
}

/// Row-major grid of semantic tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStamp {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<SemanticTile>,
}

impl TileStamp {
    /// Tile at column `x`, row `y`, if inside the stamp.
    pub fn get(&self, x: usize, y: usize) -> Option<&SemanticTile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y * self.width + x)
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[SemanticTile]> {
        // chunks(0) panics, and a zero-width stamp has no rows anyway
        self.tiles.chunks(self.width.max(1)).take(self.height)
    }
}

/// Row-major 0/1 walkability grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionStamp {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl CollisionStamp {
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data.get(y * self.width + x) == Some(&1)
    }
}

/// A `[text](path#anchor)` reference to another document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkdownLink {
    pub text: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl fmt::Display for MarkdownLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Some(anchor) => write!(f, "[{}]({}#{})", self.text, self.path, anchor),
            None => write!(f, "[{}]({})", self.text, self.path),
        }
    }
}

/// Places a referenced molecule's origin at a tile offset inside an organism.
///
/// The reference stays a link; resolving it against a catalog is a separate,
/// cycle-checked step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRef {
    #[serde(rename = "ref")]
    pub link: MarkdownLink,
    pub at: [i32; 2],
}

/// Named palette/colour variant of a molecule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDef {
    pub id: Id,
    #[serde(default)]
    pub description: String,
}

/// Interactive object categories understood by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Npc,
    Chest,
    Transition,
    Trigger,
    Spawn,
}

impl ObjectType {
    /// Map an authored type keyword through the alias table.
    ///
    /// Unknown keywords (including `interaction` and `decoration`) become `Trigger`.
    pub fn from_alias(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "npc" | "npc-anchor" => ObjectType::Npc,
            "chest" | "treasure" => ObjectType::Chest,
            "transition" | "door" => ObjectType::Transition,
            "spawn" => ObjectType::Spawn,
            _ => ObjectType::Trigger,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Npc => "npc",
            ObjectType::Chest => "chest",
            ObjectType::Transition => "transition",
            ObjectType::Trigger => "trigger",
            ObjectType::Spawn => "spawn",
        }
    }
}

/// Value of an object property: authored text, or a slot left for a later authoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Value(String),
    Slot,
}

impl PropertyValue {
    pub fn is_slot(&self) -> bool {
        matches!(self, PropertyValue::Slot)
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            PropertyValue::Value(v) => Some(v),
            PropertyValue::Slot => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Value(v) => write!(f, "{v}"),
            PropertyValue::Slot => write!(f, "{SLOT_MARKER}"),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Value(v) => serializer.serialize_str(v),
            PropertyValue::Slot => serializer.serialize_str(SLOT_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == SLOT_MARKER {
            Ok(PropertyValue::Slot)
        } else {
            Ok(PropertyValue::Value(raw))
        }
    }
}

/// Interactive object placed on an assemblage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblageObject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectType,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertyValue>>,
}

/// Decorative object drawn on top of the tile layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualObject {
    pub object_ref: String,
    pub x: i32,
    pub y: i32,
}

/// Named attachment point used when placing the assemblage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Render-facing definition of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblageDefinition {
    pub id: Id,
    pub description: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub layers: BTreeMap<String, TileStamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<CollisionStamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visuals: Option<Vec<VisualObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<AssemblageObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors: Option<Vec<Anchor>>,
}

/// Assemblage definition plus authoring metadata that rendering does not need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAssemblage {
    pub definition: AssemblageDefinition,
    pub palette: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_ref: Option<String>,
    #[serde(default)]
    pub composes: Vec<CompositionRef>,
    #[serde(default)]
    pub variants: Vec<VariantDef>,
}

/// How a scene is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    Auto,
    AreaEnter,
    MapEnter,
    QuestState,
    NpcTalk,
    Cutscene,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTrigger {
    #[serde(rename = "type")]
    pub kind: TriggerType,
    pub map: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// NPC present in a scene, keyed by a slugified id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNpc {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub dialogue_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectType {
    SystemMessage,
    ItemGive,
    CompanionJoin,
    VibrancyChange,
    QuestUpdate,
}

/// Side effect a scene has on game state, described in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneEffect {
    #[serde(rename = "type")]
    pub kind: EffectType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestAction {
    Activate,
    Complete,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestChange {
    pub quest_id: String,
    pub action: QuestAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub min: u32,
    pub max: u32,
}

/// Ids a playtest of the scene should observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestCriteria {
    #[serde(default)]
    pub quests: Vec<String>,
    #[serde(default)]
    pub items: Vec<Id>,
}

/// Scene record compiled from one `## Scene N: Name` section of an act script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDdl {
    pub id: Id,
    pub act: u32,
    pub scene_number: u32,
    pub name: String,
    pub summary: String,

    pub map_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_position: Option<String>,

    pub trigger: SceneTrigger,

    #[serde(default)]
    pub npcs: Vec<SceneNpc>,
    #[serde(default)]
    pub effects: Vec<SceneEffect>,
    #[serde(default)]
    pub quest_changes: Vec<QuestChange>,
    #[serde(default)]
    pub dialogue_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_refs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_refs: Option<Vec<Id>>,

    // Filled by a later authoring pass; the compiler always emits them empty.
    #[serde(default)]
    pub assemblages: Vec<serde_json::Value>,
    #[serde(default)]
    pub paths: Vec<serde_json::Value>,
    #[serde(default)]
    pub visuals: Vec<serde_json::Value>,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default)]
    pub resonance_stones: Vec<serde_json::Value>,
    #[serde(default)]
    pub treasure_chests: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanic_taught: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_criteria: Option<TestCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_instructions: Option<Vec<String>>,
    pub level_range: LevelRange,
    pub target_path: String,
}

/// Output of compiling one act script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActScript {
    pub act: u32,
    #[serde(default)]
    pub scenes: Vec<SceneDdl>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

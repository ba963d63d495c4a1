//! Static world catalog: rooms, items, NPC archetypes, quest templates.
//!
//! The catalog is loaded once at startup, either from the built-in world or
//! from a directory of TOML definition files, validated, and never mutated
//! afterwards. Everything dynamic lives in the world state store; everything
//! here is shared read-only by every command.
//!
//! Validation is deliberately two-tiered. A broken room graph (an exit
//! pointing at a room that does not exist, an NPC homed in a missing room)
//! is fatal at load time because no command could resolve against it. A
//! dangling item or quest reference only logs a warning; runtime lookups
//! substitute a generic definition so one bad id cannot take a session down.

use std::collections::HashMap;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use super::errors::WorldError;
use super::seed;
use super::types::{
    Direction, ExitDef, FixtureDef, ItemDef, NpcArchetype, OfferSource, QuestGiver, QuestTemplate,
    RoomDef, RoomDescriptions,
};

#[derive(Debug)]
pub struct WorldCatalog {
    name: String,
    spawn_room: String,
    rooms: HashMap<String, RoomDef>,
    items: HashMap<String, ItemDef>,
    npcs: HashMap<String, NpcArchetype>,
    quests: HashMap<String, QuestTemplate>,
}

impl WorldCatalog {
    /// The built-in Hollowvale world.
    pub fn builtin() -> Result<Self, WorldError> {
        Self::from_parts(
            "Hollowvale",
            "town_square",
            seed::rooms(),
            seed::items(),
            seed::npcs(),
            seed::quests(),
        )
    }

    /// Load a world from a directory of TOML definition files. `world.toml`
    /// indexes the room files and names the item/NPC/quest catalogs.
    pub fn load(dir: &Path) -> Result<Self, WorldError> {
        let index_text = std::fs::read_to_string(dir.join("world.toml"))?;
        let index: RawIndex = toml::from_str(&index_text)?;

        let mut rooms = Vec::with_capacity(index.rooms.len());
        for rel in &index.rooms {
            let text = std::fs::read_to_string(dir.join(rel))?;
            let raw: RawRoom = toml::from_str(&text)?;
            rooms.push(raw.into_room()?);
        }

        let items = match &index.items {
            Some(rel) => {
                let text = std::fs::read_to_string(dir.join(rel))?;
                toml::from_str::<RawItems>(&text)?.items
            }
            None => Vec::new(),
        };
        let npcs = match &index.npcs {
            Some(rel) => {
                let text = std::fs::read_to_string(dir.join(rel))?;
                toml::from_str::<RawNpcs>(&text)?.npcs
            }
            None => Vec::new(),
        };
        let quests = match &index.quests {
            Some(rel) => {
                let text = std::fs::read_to_string(dir.join(rel))?;
                toml::from_str::<RawQuests>(&text)?.quests
            }
            None => Vec::new(),
        };

        Self::from_parts(&index.name, &index.spawn_room, rooms, items, npcs, quests)
    }

    pub fn from_parts(
        name: &str,
        spawn_room: &str,
        rooms: Vec<RoomDef>,
        items: Vec<ItemDef>,
        npcs: Vec<NpcArchetype>,
        quests: Vec<QuestTemplate>,
    ) -> Result<Self, WorldError> {
        let mut room_map = HashMap::with_capacity(rooms.len());
        for room in rooms {
            let id = room.id.clone();
            if room_map.insert(id.clone(), room).is_some() {
                return Err(WorldError::CatalogIntegrity(format!(
                    "duplicate room id '{}' in catalog",
                    id
                )));
            }
        }
        let catalog = Self {
            name: name.to_string(),
            spawn_room: spawn_room.to_string(),
            rooms: room_map,
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            npcs: npcs.into_iter().map(|n| (n.id.clone(), n)).collect(),
            quests: quests.into_iter().map(|q| (q.id.clone(), q)).collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Structural validation. Room-graph breakage is fatal; dangling item and
    /// quest references are demoted to warnings and patched at runtime.
    fn validate(&self) -> Result<(), WorldError> {
        if !self.rooms.contains_key(&self.spawn_room) {
            return Err(WorldError::CatalogIntegrity(format!(
                "spawn room '{}' is not in the catalog",
                self.spawn_room
            )));
        }

        for room in self.rooms.values() {
            for (direction, exit) in &room.exits {
                if !self.rooms.contains_key(&exit.target) {
                    return Err(WorldError::CatalogIntegrity(format!(
                        "room '{}' exit {} targets missing room '{}'",
                        room.id, direction, exit.target
                    )));
                }
            }
            for item_id in &room.items {
                if !self.items.contains_key(item_id) {
                    warn!(
                        "room '{}' lists unknown item '{}'; a generic definition will stand in",
                        room.id, item_id
                    );
                }
            }
            for npc_id in &room.npcs {
                if !self.npcs.contains_key(npc_id) {
                    warn!("room '{}' lists unknown npc '{}'; it will not spawn", room.id, npc_id);
                }
            }
        }

        for npc in self.npcs.values() {
            if !self.rooms.contains_key(&npc.home) {
                return Err(WorldError::CatalogIntegrity(format!(
                    "npc '{}' is homed in missing room '{}'",
                    npc.id, npc.home
                )));
            }
            if let Some(route) = &npc.route {
                for room_id in &route.rooms {
                    if !self.rooms.contains_key(room_id) {
                        return Err(WorldError::CatalogIntegrity(format!(
                            "npc '{}' route passes through missing room '{}'",
                            npc.id, room_id
                        )));
                    }
                }
            }
            if let Some(merchant) = &npc.merchant {
                for entry in &merchant.prices {
                    if !self.items.contains_key(&entry.item_id) {
                        warn!(
                            "merchant '{}' prices unknown item '{}'",
                            npc.id, entry.item_id
                        );
                    }
                }
            }
        }

        for quest in self.quests.values() {
            let giver_ok = match &quest.giver {
                QuestGiver::Npc { npc_id } => self.npcs.contains_key(npc_id),
                QuestGiver::Noticeboard { room_id } => self.rooms.contains_key(room_id),
            };
            if !giver_ok {
                warn!("quest '{}' has a dangling giver reference", quest.id);
            }
            if quest.stages.is_empty() {
                warn!("quest '{}' has no stages and can never complete", quest.id);
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spawn_room(&self) -> &str {
        &self.spawn_room
    }

    pub fn room(&self, id: &str) -> Option<&RoomDef> {
        self.rooms.get(id)
    }

    pub fn require_room(&self, id: &str) -> Result<&RoomDef, WorldError> {
        self.rooms
            .get(id)
            .ok_or_else(|| WorldError::NotFound(format!("room {}", id)))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomDef> {
        self.rooms.values()
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    /// Item definition for an id, substituting a generic object for unknown
    /// ids so one bad reference never fails a command.
    pub fn item_or_unknown(&self, id: &str) -> ItemDef {
        match self.items.get(id) {
            Some(def) => def.clone(),
            None => {
                warn!("unknown item id '{}', substituting a generic definition", id);
                ItemDef::unknown(id)
            }
        }
    }

    pub fn item_name(&self, id: &str) -> String {
        self.items
            .get(id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| id.replace('_', " "))
    }

    pub fn npc(&self, id: &str) -> Option<&NpcArchetype> {
        self.npcs.get(id)
    }

    pub fn npcs(&self) -> impl Iterator<Item = &NpcArchetype> {
        self.npcs.values()
    }

    pub fn quest(&self, id: &str) -> Option<&QuestTemplate> {
        self.quests.get(id)
    }

    pub fn quests(&self) -> impl Iterator<Item = &QuestTemplate> {
        self.quests.values()
    }

    /// Quests posted on the noticeboard in a given room.
    pub fn noticeboard_quests(&self, room_id: &str) -> Vec<&QuestTemplate> {
        let mut posted: Vec<&QuestTemplate> = self
            .quests
            .values()
            .filter(|q| {
                matches!(&q.giver, QuestGiver::Noticeboard { room_id: r } if r == room_id)
                    || q.offers.iter().any(
                        |o| matches!(o, OfferSource::Noticeboard { room_id: r } if r == room_id),
                    )
            })
            .collect();
        posted.sort_by(|a, b| a.id.cmp(&b.id));
        posted
    }

    /// Quests a given NPC can offer in dialogue, with the trigger keywords.
    pub fn npc_offers(&self, npc_id: &str) -> Vec<(&QuestTemplate, &OfferSource)> {
        let mut offers = Vec::new();
        for quest in self.quests.values() {
            for offer in &quest.offers {
                if matches!(offer, OfferSource::NpcDialogue { npc_id: n, .. } if n == npc_id) {
                    offers.push((quest, offer));
                }
            }
        }
        offers.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        offers
    }
}

// ============================================================================
// Definition file shapes
// ============================================================================

fn default_world_name() -> String {
    "Hollowvale".to_string()
}

fn default_spawn_room() -> String {
    "town_square".to_string()
}

#[derive(Deserialize)]
struct RawIndex {
    #[serde(default = "default_world_name")]
    name: String,
    #[serde(default = "default_spawn_room")]
    spawn_room: String,
    rooms: Vec<String>,
    #[serde(default)]
    items: Option<String>,
    #[serde(default)]
    npcs: Option<String>,
    #[serde(default)]
    quests: Option<String>,
}

/// An exit in a room file: either a bare target room id or a full table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExit {
    Bare(String),
    Full(ExitDef),
}

impl RawExit {
    fn into_exit(self) -> ExitDef {
        match self {
            RawExit::Bare(target) => ExitDef::open(&target),
            RawExit::Full(exit) => exit,
        }
    }
}

#[derive(Deserialize)]
struct RawRoom {
    id: String,
    name: String,
    descriptions: RoomDescriptions,
    #[serde(default)]
    outdoor: bool,
    #[serde(default)]
    exits: HashMap<String, RawExit>,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    npcs: Vec<String>,
    #[serde(default)]
    fixtures: Vec<FixtureDef>,
    #[serde(default)]
    ambiance_day: Vec<String>,
    #[serde(default)]
    ambiance_night: Vec<String>,
}

impl RawRoom {
    fn into_room(self) -> Result<RoomDef, WorldError> {
        let mut exits = HashMap::with_capacity(self.exits.len());
        for (word, raw) in self.exits {
            let direction = Direction::parse(&word).ok_or_else(|| {
                WorldError::CatalogIntegrity(format!(
                    "room '{}' has unparseable exit direction '{}'",
                    self.id, word
                ))
            })?;
            exits.insert(direction, raw.into_exit());
        }
        Ok(RoomDef {
            id: self.id,
            name: self.name,
            descriptions: self.descriptions,
            outdoor: self.outdoor,
            exits,
            features: self.features,
            items: self.items,
            npcs: self.npcs,
            fixtures: self.fixtures,
            ambiance_day: self.ambiance_day,
            ambiance_night: self.ambiance_night,
        })
    }
}

#[derive(Deserialize)]
struct RawItems {
    #[serde(default)]
    items: Vec<ItemDef>,
}

#[derive(Deserialize)]
struct RawNpcs {
    #[serde(default)]
    npcs: Vec<NpcArchetype>,
}

#[derive(Deserialize)]
struct RawQuests {
    #[serde(default)]
    quests: Vec<QuestTemplate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_world_validates() {
        let catalog = WorldCatalog::builtin().unwrap();
        assert_eq!(catalog.spawn_room(), "town_square");
        let square = catalog.require_room("town_square").unwrap();
        assert!(square.exits.contains_key(&Direction::North));
        assert!(catalog.npcs().count() >= 5);
        assert!(catalog.quests().count() >= 2);
    }

    #[test]
    fn load_parses_bare_and_structured_exits() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("rooms")).unwrap();
        std::fs::write(
            dir.path().join("world.toml"),
            r#"
name = "Testvale"
spawn_room = "square"
rooms = ["rooms/square.toml", "rooms/gate.toml"]
items = "items.toml"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("rooms/square.toml"),
            r#"
id = "square"
name = "The Square"
outdoor = true

[descriptions]
default = "An open square."
night = "The square lies in darkness."

[exits]
north = "gate"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("rooms/gate.toml"),
            r#"
id = "gate"
name = "Old Gate"

[descriptions]
default = "A gate in the wall."

[exits]
south = { target = "square", locked = true, key = "gate_key" }
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("items.toml"),
            r#"
[[items]]
id = "gate_key"
name = "heavy gate key"
kind = "tool"
"#,
        )
        .unwrap();

        let catalog = WorldCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.name(), "Testvale");
        let gate = catalog.require_room("gate").unwrap();
        let south = &gate.exits[&Direction::South];
        assert!(south.locked);
        assert_eq!(south.key.as_deref(), Some("gate_key"));
        let square = catalog.require_room("square").unwrap();
        assert!(!square.exits[&Direction::North].locked);
    }

    #[test]
    fn exit_to_missing_room_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("rooms")).unwrap();
        std::fs::write(
            dir.path().join("world.toml"),
            r#"
spawn_room = "square"
rooms = ["rooms/square.toml"]
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("rooms/square.toml"),
            r#"
id = "square"
name = "The Square"

[descriptions]
default = "An open square."

[exits]
north = "nowhere"
"#,
        )
        .unwrap();

        let err = WorldCatalog::load(dir.path()).unwrap_err();
        assert!(matches!(err, WorldError::CatalogIntegrity(_)));
    }

    #[test]
    fn unknown_item_reference_degrades_to_generic() {
        let catalog = WorldCatalog::builtin().unwrap();
        let item = catalog.item_or_unknown("chrono_hat");
        assert_eq!(item.name, "chrono hat");
        assert!(item.droppable);
    }

    #[test]
    fn noticeboard_and_npc_offers_resolve() {
        let catalog = WorldCatalog::builtin().unwrap();
        let posted = catalog.noticeboard_quests("town_square");
        assert!(!posted.is_empty());
        for quest in posted {
            assert!(catalog.quest(&quest.id).is_some());
        }
    }
}

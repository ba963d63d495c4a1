//! Free-text noun resolution for player commands.
//!
//! Ambiguous nouns resolve in a fixed order: an item you are carrying, an
//! item on the ground, an NPC standing here, another player standing here,
//! and finally a room fixture. The first tier with a match wins, so "look
//! lantern" finds your own lantern before the one on the shelf.

use super::catalog::WorldCatalog;
use super::errors::WorldError;
use super::store::WorldStore;
use super::textutil;
use super::types::{FixtureDef, NpcArchetype, PlayerRecord, RoomDef};

/// What a piece of free text turned out to refer to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    InventoryItem(String),
    RoomItem(String),
    Npc(String),
    Player(String),
    Fixture(FixtureDef),
}

/// Match a target phrase against the NPCs present in a room.
///
/// Matching tiers, each checked across every present NPC before falling to
/// the next: exact id/name/shortname, then prefix, then word overlap with
/// the name or title.
pub fn match_npc<'a>(
    catalog: &'a WorldCatalog,
    present: &[String],
    query: &str,
) -> Option<&'a NpcArchetype> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    let npcs: Vec<&NpcArchetype> = present.iter().filter_map(|id| catalog.npc(id)).collect();

    for npc in npcs.iter().copied() {
        if npc.id.to_lowercase() == q
            || npc.name.to_lowercase() == q
            || npc.short_handle() == q
        {
            return Some(npc);
        }
    }
    for npc in npcs.iter().copied() {
        if npc.id.to_lowercase().starts_with(&q)
            || npc.name.to_lowercase().starts_with(&q)
            || npc.short_handle().starts_with(&q)
        {
            return Some(npc);
        }
    }
    let q_words: Vec<&str> = q.split(' ').collect();
    for npc in npcs.iter().copied() {
        let name = npc.name.to_lowercase();
        let title = npc.title.as_deref().unwrap_or("").to_lowercase();
        let mut words: Vec<&str> = name.split(' ').collect();
        words.extend(title.split(' '));
        if q_words.iter().any(|w| words.contains(w)) {
            return Some(npc);
        }
    }
    None
}

/// Match a phrase against a room's fixtures by name, id, or alias.
pub fn match_fixture<'a>(room: &'a RoomDef, query: &str) -> Option<&'a FixtureDef> {
    let q = textutil::normalize(query);
    if q.is_empty() {
        return None;
    }
    for fixture in &room.fixtures {
        if textutil::normalize(&fixture.name) == q
            || textutil::normalize(&fixture.id) == q
            || fixture.aliases.iter().any(|a| textutil::normalize(a) == q)
        {
            return Some(fixture);
        }
    }
    room.fixtures
        .iter()
        .find(|f| textutil::normalize(&f.name).contains(&q))
}

/// Resolve a noun phrase through the full tier order. `others_here` is the
/// list of other online players in the room.
pub fn resolve_target(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &PlayerRecord,
    room: &RoomDef,
    others_here: &[String],
    query: &str,
) -> Result<Option<Target>, WorldError> {
    let q = textutil::normalize(query);
    if q.is_empty() {
        return Ok(None);
    }

    let carried: Vec<(&str, String)> = player
        .inventory
        .iter()
        .map(|id| (id.as_str(), catalog.item_name(id)))
        .collect();
    if let Some(id) = textutil::match_named(&q, &carried) {
        return Ok(Some(Target::InventoryItem(id.to_string())));
    }

    let room_items = store.room_items(&room.id)?;
    let on_ground: Vec<(&str, String)> = room_items
        .iter()
        .map(|id| (id.as_str(), catalog.item_name(id)))
        .collect();
    if let Some(id) = textutil::match_named(&q, &on_ground) {
        return Ok(Some(Target::RoomItem(id.to_string())));
    }

    let present = store.npcs_in_room(&room.id)?;
    if let Some(npc) = match_npc(catalog, &present, &q) {
        return Ok(Some(Target::Npc(npc.id.clone())));
    }

    if let Some(name) = others_here.iter().find(|n| n.to_lowercase() == q) {
        return Ok(Some(Target::Player(name.clone())));
    }

    Ok(match_fixture(room, &q).map(|f| Target::Fixture(f.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::{ItemDef, ItemKind};

    fn yard_world() -> (WorldCatalog, WorldStore) {
        let rooms = vec![RoomDef::new("yard", "Yard", "A yard.")
            .with_items(&["lantern"])
            .with_npcs(&["keeper"])
            .with_fixture(
                FixtureDef::new("well", "old well", "A mossy well.")
                    .with_aliases(&["bucket", "rope"]),
            )];
        let items = vec![
            ItemDef::new("lantern", "brass lantern", ItemKind::Tool, 1.0),
        ];
        let npcs = vec![NpcArchetype::new("keeper", "Keeper Ansel", "The keeper.", "yard")
            .with_title("Keeper of the Yard")];
        let catalog =
            WorldCatalog::from_parts("yard", "yard", rooms, items, npcs, Vec::new()).unwrap();
        let store = WorldStore::new(&catalog);
        (catalog, store)
    }

    #[test]
    fn carried_items_outrank_everything() {
        let (catalog, store) = yard_world();
        let mut player = PlayerRecord::new("mira", "yard");
        player.inventory.push("lantern".to_string());
        let room = catalog.room("yard").unwrap();

        let target = resolve_target(&catalog, &store, &player, room, &[], "lantern")
            .unwrap()
            .unwrap();
        assert_eq!(target, Target::InventoryItem("lantern".to_string()));

        // Drop it from the pack and the one on the ground is found instead.
        player.inventory.clear();
        let target = resolve_target(&catalog, &store, &player, room, &[], "brass lantern")
            .unwrap()
            .unwrap();
        assert_eq!(target, Target::RoomItem("lantern".to_string()));
    }

    #[test]
    fn npc_matching_walks_the_tiers() {
        let (catalog, _store) = yard_world();
        let present = vec!["keeper".to_string()];
        assert_eq!(match_npc(&catalog, &present, "keeper").unwrap().id, "keeper");
        assert_eq!(match_npc(&catalog, &present, "Keeper Ansel").unwrap().id, "keeper");
        assert_eq!(match_npc(&catalog, &present, "keep").unwrap().id, "keeper");
        assert_eq!(match_npc(&catalog, &present, "ansel").unwrap().id, "keeper");
        assert_eq!(match_npc(&catalog, &present, "yard keeper").unwrap().id, "keeper");
        assert!(match_npc(&catalog, &present, "bartender").is_none());
    }

    #[test]
    fn players_resolve_before_fixtures() {
        let (catalog, store) = yard_world();
        let player = PlayerRecord::new("mira", "yard");
        let room = catalog.room("yard").unwrap();
        let others = vec!["Wellington".to_string()];

        let target = resolve_target(&catalog, &store, &player, room, &others, "wellington")
            .unwrap()
            .unwrap();
        assert_eq!(target, Target::Player("Wellington".to_string()));

        let target = resolve_target(&catalog, &store, &player, room, &others, "the bucket")
            .unwrap()
            .unwrap();
        assert!(matches!(target, Target::Fixture(f) if f.id == "well"));
    }

    #[test]
    fn unknown_nouns_resolve_to_nothing() {
        let (catalog, store) = yard_world();
        let player = PlayerRecord::new("mira", "yard");
        let room = catalog.room("yard").unwrap();
        assert!(resolve_target(&catalog, &store, &player, room, &[], "dragon")
            .unwrap()
            .is_none());
        assert!(resolve_target(&catalog, &store, &player, room, &[], "  ")
            .unwrap()
            .is_none());
    }
}

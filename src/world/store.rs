//! The world state store: every dynamic, shared record in the simulation.
//!
//! Locking is per logical record. The store's maps are built once from the
//! catalog and never change shape afterwards, so accessors take `&self` and
//! lock only the single room, NPC, or roster entry they touch. Mutations are
//! last-writer-wins; callers that need read-modify-write atomicity (claiming
//! a due weather roll, advancing a route index) do it inside one closure so
//! the lock spans the whole decision.
//!
//! Player session records are deliberately absent. A player's own state is
//! only ever mutated by that player's own requests and travels with the
//! session, not through here.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::catalog::WorldCatalog;
use super::clock::MINUTES_PER_DAY;
use super::errors::WorldError;
use super::types::{BuriedItem, Direction, NpcState, RoomDef, RosterEntry, WeatherState};

/// How long a buried item survives before it is gone for good.
pub const BURIAL_TTL_MINUTES: u64 = MINUTES_PER_DAY;

/// Runtime override for one exit. `None` fields defer to the static catalog
/// definition, so clearing an override restores the world file's behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExitOverride {
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
}

impl ExitOverride {
    pub fn is_noop(&self) -> bool {
        self.locked.is_none() && self.hidden.is_none()
    }
}

/// The dynamic overlay for one room.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoomRecord {
    /// Item-id multiset currently on the ground.
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub exit_overrides: HashMap<Direction, ExitOverride>,
    #[serde(default)]
    pub buried: Vec<BuriedItem>,
    /// World minute through which ambient/idle pulses have been paid out.
    #[serde(default)]
    pub idle_paid_to: u64,
}

impl RoomRecord {
    fn seeded(def: &RoomDef) -> Self {
        Self {
            items: def.items.clone(),
            ..Self::default()
        }
    }

    /// Remove one instance of an item from the ground multiset.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        if let Some(pos) = self.items.iter().position(|i| i == item_id) {
            self.items.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn has_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i == item_id)
    }
}

/// A fully resolved exit: static definition with runtime overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitView {
    pub direction: Direction,
    pub target: String,
    pub locked: bool,
    pub hidden: bool,
    pub key: Option<String>,
}

pub struct WorldStore {
    rooms: HashMap<String, Mutex<RoomRecord>>,
    npcs: HashMap<String, Mutex<NpcState>>,
    rosters: HashMap<String, Mutex<RosterEntry>>,
    weather: Mutex<WeatherState>,
}

impl WorldStore {
    /// Build a fresh store from the catalog: rooms seeded with their static
    /// item lists, NPCs synthesized from their archetypes, rosters empty.
    pub fn new(catalog: &WorldCatalog) -> Self {
        let rooms = catalog
            .rooms()
            .map(|def| (def.id.clone(), Mutex::new(RoomRecord::seeded(def))))
            .collect();
        let npcs = catalog
            .npcs()
            .map(|arch| (arch.id.clone(), Mutex::new(NpcState::from_archetype(arch))))
            .collect();
        let rosters = catalog
            .quests()
            .map(|quest| (quest.id.clone(), Mutex::new(RosterEntry::default())))
            .collect();
        Self {
            rooms,
            npcs,
            rosters,
            weather: Mutex::new(WeatherState::default()),
        }
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Run a closure against one room's record under its lock.
    pub fn with_room<R>(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut RoomRecord) -> R,
    ) -> Result<R, WorldError> {
        let mutex = self
            .rooms
            .get(room_id)
            .ok_or_else(|| WorldError::NotFound(format!("room {}", room_id)))?;
        let mut guard = mutex.lock().map_err(|_| WorldError::poisoned("room"))?;
        Ok(f(&mut guard))
    }

    pub fn room_items(&self, room_id: &str) -> Result<Vec<String>, WorldError> {
        self.with_room(room_id, |record| record.items.clone())
    }

    pub fn add_room_item(&self, room_id: &str, item_id: &str) -> Result<(), WorldError> {
        self.with_room(room_id, |record| record.items.push(item_id.to_string()))
    }

    /// Remove one instance of an item from the floor. `Ok(false)` means the
    /// item was not there (someone else got it first).
    pub fn take_room_item(&self, room_id: &str, item_id: &str) -> Result<bool, WorldError> {
        self.with_room(room_id, |record| record.remove_item(item_id))
    }

    /// Add an item to the floor only if no instance is already present.
    /// Quest placements use this so re-accepts cannot pile up duplicates.
    pub fn place_item_once(&self, room_id: &str, item_id: &str) -> Result<bool, WorldError> {
        self.with_room(room_id, |record| {
            if record.has_item(item_id) {
                false
            } else {
                record.items.push(item_id.to_string());
                true
            }
        })
    }

    pub fn set_exit_override(
        &self,
        room_id: &str,
        direction: Direction,
        locked: Option<bool>,
        hidden: Option<bool>,
    ) -> Result<(), WorldError> {
        self.with_room(room_id, |record| {
            let entry = record.exit_overrides.entry(direction).or_default();
            if let Some(locked) = locked {
                entry.locked = Some(locked);
            }
            if let Some(hidden) = hidden {
                entry.hidden = Some(hidden);
            }
            if entry.is_noop() {
                record.exit_overrides.remove(&direction);
            }
        })
    }

    pub fn clear_exit_override(&self, room_id: &str, direction: Direction) -> Result<(), WorldError> {
        self.with_room(room_id, |record| {
            record.exit_overrides.remove(&direction);
        })
    }

    /// All of a room's exits with runtime overrides applied, sorted by
    /// direction word for stable rendering.
    pub fn effective_exits(&self, def: &RoomDef) -> Result<Vec<ExitView>, WorldError> {
        self.with_room(&def.id, |record| resolve_exits(def, record))
    }

    /// Exits an actor can use right now: not hidden, and either unlocked or
    /// openable with a key the actor holds. If every exit fails the test the
    /// whole set is returned unlocked instead, so no actor is ever sealed
    /// into a room that has exits at all.
    pub fn accessible_exits(
        &self,
        def: &RoomDef,
        has_key: impl Fn(&str) -> bool,
    ) -> Result<Vec<ExitView>, WorldError> {
        self.with_room(&def.id, |record| {
            let all = resolve_exits(def, record);
            let usable: Vec<ExitView> = all
                .iter()
                .filter(|exit| {
                    if exit.hidden {
                        return false;
                    }
                    if !exit.locked {
                        return true;
                    }
                    exit.key.as_deref().map(&has_key).unwrap_or(false)
                })
                .cloned()
                .collect();
            if usable.is_empty() && !all.is_empty() {
                return all
                    .into_iter()
                    .map(|exit| ExitView {
                        locked: false,
                        hidden: false,
                        ..exit
                    })
                    .collect();
            }
            usable
        })
    }

    // ------------------------------------------------------------------
    // Buried items
    // ------------------------------------------------------------------

    pub fn bury_item(
        &self,
        room_id: &str,
        item_id: &str,
        buried_by: &str,
        now_minutes: u64,
    ) -> Result<(), WorldError> {
        self.with_room(room_id, |record| {
            gc_buried(record, now_minutes);
            record.buried.push(BuriedItem {
                item_id: item_id.to_string(),
                buried_by: buried_by.to_string(),
                buried_at_minutes: now_minutes,
            });
        })
    }

    /// Buried items still recoverable in a room. Expired burials are deleted
    /// as a side effect, which is the only garbage collection they get.
    pub fn buried_in(&self, room_id: &str, now_minutes: u64) -> Result<Vec<BuriedItem>, WorldError> {
        self.with_room(room_id, |record| {
            gc_buried(record, now_minutes);
            record.buried.clone()
        })
    }

    /// Dig up one buried item by id, if it is still there and still fresh.
    pub fn dig_up(
        &self,
        room_id: &str,
        item_id: &str,
        now_minutes: u64,
    ) -> Result<Option<BuriedItem>, WorldError> {
        self.with_room(room_id, |record| {
            gc_buried(record, now_minutes);
            let pos = record.buried.iter().position(|b| b.item_id == item_id)?;
            Some(record.buried.remove(pos))
        })
    }

    // ------------------------------------------------------------------
    // Idle pulse accounting
    // ------------------------------------------------------------------

    /// Claim due idle actions for a room: converts elapsed world minutes into
    /// a capped count and advances the paid-to marker, all under the room's
    /// lock so concurrent pollers cannot both claim the same pulse.
    pub fn claim_idle_pulses(
        &self,
        room_id: &str,
        now_minutes: u64,
        interval: u64,
    ) -> Result<u64, WorldError> {
        self.with_room(room_id, |record| {
            let (count, paid_to) =
                super::ambiance::accrue(record.idle_paid_to, now_minutes, interval, interval.max(1));
            record.idle_paid_to = paid_to;
            count
        })
    }

    // ------------------------------------------------------------------
    // NPCs
    // ------------------------------------------------------------------

    pub fn with_npc<R>(
        &self,
        npc_id: &str,
        f: impl FnOnce(&mut NpcState) -> R,
    ) -> Result<R, WorldError> {
        let mutex = self
            .npcs
            .get(npc_id)
            .ok_or_else(|| WorldError::NotFound(format!("npc {}", npc_id)))?;
        let mut guard = mutex.lock().map_err(|_| WorldError::poisoned("npc"))?;
        Ok(f(&mut guard))
    }

    pub fn npc_state(&self, npc_id: &str) -> Result<NpcState, WorldError> {
        self.with_npc(npc_id, |state| state.clone())
    }

    pub fn npc_ids(&self) -> impl Iterator<Item = &str> {
        self.npcs.keys().map(String::as_str)
    }

    /// Ids of living NPCs currently in a room. Locks each NPC record briefly
    /// in turn; the result is sorted for deterministic rendering.
    pub fn npcs_in_room(&self, room_id: &str) -> Result<Vec<String>, WorldError> {
        let mut present = Vec::new();
        for (id, mutex) in &self.npcs {
            let guard = mutex.lock().map_err(|_| WorldError::poisoned("npc"))?;
            if guard.alive && guard.room_id == room_id {
                present.push(id.clone());
            }
        }
        present.sort();
        Ok(present)
    }

    // ------------------------------------------------------------------
    // Quest rosters
    // ------------------------------------------------------------------

    pub fn with_roster<R>(
        &self,
        quest_id: &str,
        f: impl FnOnce(&mut RosterEntry) -> R,
    ) -> Result<R, WorldError> {
        let mutex = self
            .rosters
            .get(quest_id)
            .ok_or_else(|| WorldError::NotFound(format!("quest roster {}", quest_id)))?;
        let mut guard = mutex.lock().map_err(|_| WorldError::poisoned("roster"))?;
        Ok(f(&mut guard))
    }

    pub fn roster(&self, quest_id: &str) -> Result<RosterEntry, WorldError> {
        self.with_roster(quest_id, |entry| entry.clone())
    }

    // ------------------------------------------------------------------
    // Weather
    // ------------------------------------------------------------------

    /// Run a closure against the global weather record under its lock. The
    /// closure both decides whether a roll is due and applies it, so two
    /// concurrent callers cannot each observe "due" and double-roll.
    pub fn with_weather<R>(&self, f: impl FnOnce(&mut WeatherState) -> R) -> Result<R, WorldError> {
        let mut guard = self
            .weather
            .lock()
            .map_err(|_| WorldError::poisoned("weather"))?;
        Ok(f(&mut guard))
    }

    pub fn weather(&self) -> Result<WeatherState, WorldError> {
        self.with_weather(|state| state.clone())
    }

    // ------------------------------------------------------------------
    // Snapshot support
    // ------------------------------------------------------------------

    /// Clone out every room record, locking each in turn.
    pub fn export_rooms(&self) -> Result<HashMap<String, RoomRecord>, WorldError> {
        let mut out = HashMap::with_capacity(self.rooms.len());
        for (id, mutex) in &self.rooms {
            let guard = mutex.lock().map_err(|_| WorldError::poisoned("room"))?;
            out.insert(id.clone(), guard.clone());
        }
        Ok(out)
    }

    pub fn export_npcs(&self) -> Result<HashMap<String, NpcState>, WorldError> {
        let mut out = HashMap::with_capacity(self.npcs.len());
        for (id, mutex) in &self.npcs {
            let guard = mutex.lock().map_err(|_| WorldError::poisoned("npc"))?;
            out.insert(id.clone(), guard.clone());
        }
        Ok(out)
    }

    pub fn export_rosters(&self) -> Result<HashMap<String, RosterEntry>, WorldError> {
        let mut out = HashMap::with_capacity(self.rosters.len());
        for (id, mutex) in &self.rosters {
            let guard = mutex.lock().map_err(|_| WorldError::poisoned("roster"))?;
            out.insert(id.clone(), guard.clone());
        }
        Ok(out)
    }

    /// Overlay snapshot data onto the store. Records in the snapshot that no
    /// longer exist in the catalog are dropped silently; records absent from
    /// the snapshot keep their freshly seeded state.
    pub fn restore(
        &self,
        rooms: HashMap<String, RoomRecord>,
        npcs: HashMap<String, NpcState>,
        rosters: HashMap<String, RosterEntry>,
        weather: Option<WeatherState>,
    ) -> Result<(), WorldError> {
        for (id, record) in rooms {
            if self.rooms.contains_key(&id) {
                self.with_room(&id, |slot| *slot = record)?;
            }
        }
        for (id, state) in npcs {
            if self.npcs.contains_key(&id) {
                self.with_npc(&id, |slot| *slot = state)?;
            }
        }
        for (id, entry) in rosters {
            if self.rosters.contains_key(&id) {
                self.with_roster(&id, |slot| *slot = entry)?;
            }
        }
        if let Some(state) = weather {
            self.with_weather(|slot| *slot = state)?;
        }
        Ok(())
    }
}

fn resolve_exits(def: &RoomDef, record: &RoomRecord) -> Vec<ExitView> {
    let mut exits: Vec<ExitView> = def
        .exits
        .iter()
        .map(|(direction, exit)| {
            let over = record.exit_overrides.get(direction);
            ExitView {
                direction: *direction,
                target: exit.target.clone(),
                locked: over.and_then(|o| o.locked).unwrap_or(exit.locked),
                hidden: over.and_then(|o| o.hidden).unwrap_or(exit.hidden),
                key: exit.key.clone(),
            }
        })
        .collect();
    exits.sort_by_key(|e| e.direction.as_str());
    exits
}

fn gc_buried(record: &mut RoomRecord, now_minutes: u64) {
    record
        .buried
        .retain(|b| now_minutes.saturating_sub(b.buried_at_minutes) < BURIAL_TTL_MINUTES);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (WorldCatalog, WorldStore) {
        let catalog = WorldCatalog::builtin().unwrap();
        let store = WorldStore::new(&catalog);
        (catalog, store)
    }

    #[test]
    fn rooms_seed_their_static_items() {
        let (_, store) = store();
        let items = store.room_items("town_square").unwrap();
        assert!(items.contains(&"copper_coin".to_string()));
        assert!(store.room_items("nowhere").is_err());
    }

    #[test]
    fn npcs_spawn_at_home_with_full_health() {
        let (catalog, store) = store();
        let state = store.npc_state("innkeeper").unwrap();
        assert_eq!(state.room_id, "tavern");
        assert_eq!(state.hp, catalog.npc("innkeeper").unwrap().stats.max_hp);
        let present = store.npcs_in_room("tavern").unwrap();
        assert!(present.contains(&"innkeeper".to_string()));
    }

    #[test]
    fn taking_an_item_twice_fails_the_second_time() {
        let (_, store) = store();
        assert!(store.take_room_item("town_square", "copper_coin").unwrap());
        assert!(!store.take_room_item("town_square", "copper_coin").unwrap());
    }

    #[test]
    fn place_item_once_is_idempotent() {
        let (_, store) = store();
        assert!(store.place_item_once("tavern", "lost_package").unwrap());
        assert!(!store.place_item_once("tavern", "lost_package").unwrap());
        let count = store
            .room_items("tavern")
            .unwrap()
            .iter()
            .filter(|i| *i == "lost_package")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn exit_overrides_apply_and_clear() {
        let (catalog, store) = store();
        let square = catalog.room("town_square").unwrap();
        store
            .set_exit_override("town_square", Direction::North, Some(true), None)
            .unwrap();
        let exits = store.effective_exits(square).unwrap();
        let north = exits.iter().find(|e| e.direction == Direction::North).unwrap();
        assert!(north.locked);
        store.clear_exit_override("town_square", Direction::North).unwrap();
        let exits = store.effective_exits(square).unwrap();
        let north = exits.iter().find(|e| e.direction == Direction::North).unwrap();
        assert!(!north.locked);
    }

    #[test]
    fn locking_every_exit_still_leaves_a_way_out() {
        let (catalog, store) = store();
        let square = catalog.room("town_square").unwrap();
        for direction in square.exits.keys() {
            store
                .set_exit_override("town_square", *direction, Some(true), None)
                .unwrap();
        }
        let usable = store.accessible_exits(square, |_| false).unwrap();
        assert_eq!(usable.len(), square.exits.len());
        assert!(usable.iter().all(|e| !e.locked));
    }

    #[test]
    fn key_holders_pass_locked_exits_without_the_fallback() {
        let catalog = WorldCatalog::from_parts(
            "keyed",
            "cell",
            vec![
                RoomDef::new("cell", "Cell", "A cell.")
                    .with_locked_exit(Direction::North, "hall", Some("iron_key"))
                    .with_exit(Direction::South, "yard"),
                RoomDef::new("hall", "Hall", "A hall."),
                RoomDef::new("yard", "Yard", "A yard."),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        let store = WorldStore::new(&catalog);
        let cell = catalog.room("cell").unwrap();

        let without = store.accessible_exits(cell, |_| false).unwrap();
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].target, "yard");

        let with = store.accessible_exits(cell, |key| key == "iron_key").unwrap();
        assert_eq!(with.len(), 2);
    }

    #[test]
    fn buried_items_rot_away_after_a_world_day() {
        let (_, store) = store();
        store.bury_item("forest_edge", "loose_stone", "mira", 100).unwrap();
        let fresh = store.buried_in("forest_edge", 100 + BURIAL_TTL_MINUTES - 1).unwrap();
        assert_eq!(fresh.len(), 1);
        let gone = store.buried_in("forest_edge", 100 + BURIAL_TTL_MINUTES).unwrap();
        assert!(gone.is_empty());
    }

    #[test]
    fn dig_up_recovers_within_the_window() {
        let (_, store) = store();
        store.bury_item("old_road", "copper_coin", "mira", 50).unwrap();
        let found = store.dig_up("old_road", "copper_coin", 60).unwrap();
        assert_eq!(found.map(|b| b.item_id), Some("copper_coin".to_string()));
        assert!(store.dig_up("old_road", "copper_coin", 61).unwrap().is_none());
    }

    #[test]
    fn idle_pulses_accrue_under_the_room_lock() {
        let (_, store) = store();
        // First contact pays a single pulse and aligns the marker.
        assert_eq!(store.claim_idle_pulses("tavern", 300, 20).unwrap(), 1);
        assert_eq!(store.claim_idle_pulses("tavern", 310, 20).unwrap(), 0);
        assert_eq!(store.claim_idle_pulses("tavern", 345, 20).unwrap(), 2);
    }

    #[test]
    fn restore_overlays_known_records_and_skips_strangers() {
        let (_, store) = store();
        let mut rooms = HashMap::new();
        rooms.insert(
            "town_square".to_string(),
            RoomRecord {
                items: vec!["iron_hammer".to_string()],
                ..RoomRecord::default()
            },
        );
        rooms.insert("atlantis".to_string(), RoomRecord::default());
        store
            .restore(rooms, HashMap::new(), HashMap::new(), None)
            .unwrap();
        assert_eq!(store.room_items("town_square").unwrap(), vec!["iron_hammer"]);
    }

    #[test]
    fn concurrent_writers_on_one_record_serialize() {
        use std::sync::Arc;
        let catalog = WorldCatalog::builtin().unwrap();
        let shared = Arc::new(WorldStore::new(&catalog));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&shared);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    store.add_room_item("old_road", "loose_stone").unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let stones = shared
            .room_items("old_road")
            .unwrap()
            .iter()
            .filter(|i| *i == "loose_stone")
            .count();
        assert_eq!(stones, 400);
    }
}

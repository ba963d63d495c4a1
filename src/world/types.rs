use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub const PLAYER_SCHEMA_VERSION: u8 = 2;
pub const NPC_STATE_SCHEMA_VERSION: u8 = 1;
pub const WEATHER_SCHEMA_VERSION: u8 = 1;
pub const SNAPSHOT_SCHEMA_VERSION: u8 = 1;

/// Maximum entries retained in a player's visible event log.
pub const LOG_CAP: usize = 200;

/// Copper units per silver piece and per gold piece.
pub const COPPER_PER_SILVER: i64 = 10;
pub const COPPER_PER_GOLD: i64 = 500;

// ============================================================================
// Directions
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// Parse a direction word or abbreviation ("n", "ne", "north").
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_lowercase().as_str() {
            "n" | "north" => Some(Self::North),
            "s" | "south" => Some(Self::South),
            "e" | "east" => Some(Self::East),
            "w" | "west" => Some(Self::West),
            "u" | "up" => Some(Self::Up),
            "d" | "down" => Some(Self::Down),
            "ne" | "northeast" => Some(Self::Northeast),
            "nw" | "northwest" => Some(Self::Northwest),
            "se" | "southeast" => Some(Self::Southeast),
            "sw" | "southwest" => Some(Self::Southwest),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Northeast => Self::Southwest,
            Self::Northwest => Self::Southeast,
            Self::Southeast => Self::Northwest,
            Self::Southwest => Self::Northeast,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
            Self::Northeast => "northeast",
            Self::Northwest => "northwest",
            Self::Southeast => "southeast",
            Self::Southwest => "southwest",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Time, seasons, moon
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dawn => "dawn",
            Self::Day => "day",
            Self::Dusk => "dusk",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new moon",
            Self::WaxingCrescent => "waxing crescent",
            Self::FirstQuarter => "first quarter",
            Self::WaxingGibbous => "waxing gibbous",
            Self::Full => "full moon",
            Self::WaningGibbous => "waning gibbous",
            Self::LastQuarter => "last quarter",
            Self::WaningCrescent => "waning crescent",
        }
    }
}

/// Coarse day/night marker used for dawn/dusk announcement detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    Day,
    Night,
}

impl Default for DayPeriod {
    fn default() -> Self {
        Self::Day
    }
}

// ============================================================================
// Weather
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WeatherType {
    Clear,
    Windy,
    Rain,
    Storm,
    Snow,
    Sleet,
    Overcast,
    Heatwave,
}

impl WeatherType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Windy => "windy",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Snow => "snow",
            Self::Sleet => "sleet",
            Self::Overcast => "overcast",
            Self::Heatwave => "heatwave",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIntensity {
    None,
    Light,
    Moderate,
    Heavy,
}

impl WeatherIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
        }
    }

    /// Ordinal band index, used to assert adjacency in transitions.
    pub fn band(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Light => 1,
            Self::Moderate => 2,
            Self::Heavy => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    Cold,
    Cool,
    Mild,
    Warm,
    Hot,
}

impl TemperatureBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Cool => "cool",
            Self::Mild => "mild",
            Self::Warm => "warm",
            Self::Hot => "hot",
        }
    }
}

/// The single global weather record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherState {
    pub weather: WeatherType,
    pub intensity: WeatherIntensity,
    pub temperature: TemperatureBand,
    /// World minute of the last re-roll attempt that was applied.
    #[serde(default)]
    pub last_roll_minutes: u64,
    /// Day/night marker as of the last advancement, for dawn/dusk messages.
    #[serde(default)]
    pub period: DayPeriod,
    pub schema_version: u8,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            weather: WeatherType::Clear,
            intensity: WeatherIntensity::None,
            temperature: TemperatureBand::Mild,
            last_roll_minutes: 0,
            period: DayPeriod::Day,
            schema_version: WEATHER_SCHEMA_VERSION,
        }
    }
}

/// Per-actor weather exposure accumulators, each clamped to 0..=10. Values
/// drift toward weather-implied targets outdoors and decay indoors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Exposure {
    #[serde(default)]
    pub wetness: u8,
    #[serde(default)]
    pub cold: u8,
    #[serde(default)]
    pub heat: u8,
    /// Wall timestamp of the last accumulator update (5-second throttle).
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl Exposure {
    pub fn has_status(&self) -> bool {
        self.wetness > 0 || self.cold > 0 || self.heat > 0
    }

    pub fn bump_wetness(&mut self, delta: i8) {
        self.wetness = clamp_exposure(self.wetness, delta);
    }

    pub fn bump_cold(&mut self, delta: i8) {
        self.cold = clamp_exposure(self.cold, delta);
    }

    pub fn bump_heat(&mut self, delta: i8) {
        self.heat = clamp_exposure(self.heat, delta);
    }
}

fn clamp_exposure(value: u8, delta: i8) -> u8 {
    let next = value as i16 + delta as i16;
    next.clamp(0, 10) as u8
}

// ============================================================================
// Rooms and fixtures (static catalog)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExitDef {
    pub target: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
    /// Item id required in inventory to pass a locked exit.
    #[serde(default)]
    pub key: Option<String>,
}

impl ExitDef {
    pub fn open(target: &str) -> Self {
        Self {
            target: target.to_string(),
            locked: false,
            hidden: false,
            key: None,
        }
    }
}

/// Description variants by time of day; `default` covers any missing slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomDescriptions {
    pub default: String,
    #[serde(default)]
    pub dawn: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub dusk: Option<String>,
    #[serde(default)]
    pub night: Option<String>,
}

impl RoomDescriptions {
    pub fn plain(text: &str) -> Self {
        Self {
            default: text.to_string(),
            dawn: None,
            day: None,
            dusk: None,
            night: None,
        }
    }

    pub fn for_time(&self, time: TimeOfDay) -> &str {
        let variant = match time {
            TimeOfDay::Dawn => &self.dawn,
            TimeOfDay::Day => &self.day,
            TimeOfDay::Dusk => &self.dusk,
            TimeOfDay::Night => &self.night,
        };
        variant.as_deref().unwrap_or(&self.default)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FixtureTrigger {
    OnLook,
    OnTouch,
    OnUse,
}

pub type FixtureHooks = HashMap<FixtureTrigger, String>;

/// A named, non-takeable detail of a room (a fountain, a noticeboard).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: String,
    /// Named behavior hooks resolved against built-in handlers.
    #[serde(default)]
    pub hooks: FixtureHooks,
}

impl FixtureDef {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            description: description.to_string(),
            hooks: FixtureHooks::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_hook(mut self, trigger: FixtureTrigger, handler: &str) -> Self {
        self.hooks.insert(trigger, handler.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomDef {
    pub id: String,
    pub name: String,
    pub descriptions: RoomDescriptions,
    #[serde(default)]
    pub outdoor: bool,
    #[serde(default)]
    pub exits: HashMap<Direction, ExitDef>,
    /// Feature tags used for seasonal flavor text selection.
    #[serde(default)]
    pub features: Vec<String>,
    /// Item ids initially present when the world is first created.
    #[serde(default)]
    pub items: Vec<String>,
    /// NPC ids that spawn here.
    #[serde(default)]
    pub npcs: Vec<String>,
    #[serde(default)]
    pub fixtures: Vec<FixtureDef>,
    /// Room-specific ambient line pools; generic indoor/outdoor pools cover
    /// rooms (and times of day) that leave these empty.
    #[serde(default)]
    pub ambiance_day: Vec<String>,
    #[serde(default)]
    pub ambiance_night: Vec<String>,
}

impl RoomDef {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            descriptions: RoomDescriptions::plain(description),
            outdoor: false,
            exits: HashMap::new(),
            features: Vec::new(),
            items: Vec::new(),
            npcs: Vec::new(),
            fixtures: Vec::new(),
            ambiance_day: Vec::new(),
            ambiance_night: Vec::new(),
        }
    }

    pub fn outdoor(mut self) -> Self {
        self.outdoor = true;
        self
    }

    pub fn with_dawn(mut self, text: &str) -> Self {
        self.descriptions.dawn = Some(text.to_string());
        self
    }

    pub fn with_dusk(mut self, text: &str) -> Self {
        self.descriptions.dusk = Some(text.to_string());
        self
    }

    pub fn with_night(mut self, text: &str) -> Self {
        self.descriptions.night = Some(text.to_string());
        self
    }

    pub fn with_exit(mut self, direction: Direction, target: &str) -> Self {
        self.exits.insert(direction, ExitDef::open(target));
        self
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_locked_exit(mut self, direction: Direction, target: &str, key: Option<&str>) -> Self {
        self.exits.insert(
            direction,
            ExitDef {
                target: target.to_string(),
                locked: true,
                hidden: false,
                key: key.map(|k| k.to_string()),
            },
        );
        self
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_npcs(mut self, npcs: &[&str]) -> Self {
        self.npcs = npcs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_fixture(mut self, fixture: FixtureDef) -> Self {
        self.fixtures.push(fixture);
        self
    }

    pub fn with_ambiance(mut self, day: &[&str], night: &[&str]) -> Self {
        self.ambiance_day = day.iter().map(|s| s.to_string()).collect();
        self.ambiance_night = night.iter().map(|s| s.to_string()).collect();
        self
    }
}

// ============================================================================
// Items (static catalog)
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Currency,
    Food,
    Tool,
    Container,
    Artifact,
    Misc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weight: f32,
    #[serde(default = "default_true")]
    pub droppable: bool,
    #[serde(default)]
    pub quest_item: bool,
}

fn default_true() -> bool {
    true
}

impl ItemDef {
    pub fn new(id: &str, name: &str, kind: ItemKind, weight: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            description: String::new(),
            weight,
            droppable: true,
            quest_item: false,
        }
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn undroppable(mut self) -> Self {
        self.droppable = false;
        self
    }

    pub fn quest_item(mut self) -> Self {
        self.quest_item = true;
        self.droppable = false;
        self
    }

    /// Synthesized definition for ids missing from the catalog, so a single
    /// bad reference degrades to a generic object instead of an error.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.replace('_', " "),
            kind: ItemKind::Misc,
            description: "Nothing about it stands out.".to_string(),
            weight: 0.5,
            droppable: true,
            quest_item: false,
        }
    }
}

// ============================================================================
// NPCs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpcStats {
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    #[serde(default)]
    pub faction: String,
}

impl Default for NpcStats {
    fn default() -> Self {
        Self {
            max_hp: 10,
            attack: 1,
            defense: 1,
            speed: 1,
            faction: "neutral".to_string(),
        }
    }
}

/// One weather-reaction line pool, keyed by (type, intensity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReaction {
    pub weather: WeatherType,
    pub intensity: WeatherIntensity,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceEntry {
    pub item_id: String,
    /// Base price in copper units, before personality and reputation modifiers.
    pub price: i64,
    pub initial_stock: u32,
}

/// Pricing disposition. Capricious merchants re-roll their multiplier on
/// every quote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MerchantTemper {
    Greedy,
    Fair,
    Generous,
    Capricious,
}

impl Default for MerchantTemper {
    fn default() -> Self {
        Self::Fair
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MerchantDef {
    #[serde(default)]
    pub temper: MerchantTemper,
    pub prices: Vec<PriceEntry>,
}

impl MerchantDef {
    pub fn new(temper: MerchantTemper) -> Self {
        Self {
            temper,
            prices: Vec::new(),
        }
    }

    pub fn sells(mut self, item_id: &str, price: i64, initial_stock: u32) -> Self {
        self.prices.push(PriceEntry {
            item_id: item_id.to_string(),
            price,
            initial_stock,
        });
        self
    }
}

/// Cyclic patrol route. The NPC advances one hop each time `interval_minutes`
/// of world time accumulates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDef {
    pub rooms: Vec<String>,
    pub interval_minutes: u64,
}

/// Data-driven response to being attacked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnAttacked {
    pub reputation_penalty: i32,
    #[serde(default)]
    pub retreat_home: bool,
    /// World minutes during which the NPC refuses conversation afterwards.
    #[serde(default)]
    pub cooldown_minutes: u64,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpcArchetype {
    pub id: String,
    pub name: String,
    /// Short handle used for matching ("mara" for "Mara").
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default = "default_pronoun")]
    pub pronoun: String,
    pub home: String,
    #[serde(default)]
    pub stats: NpcStats,
    /// Scripted reaction lines keyed by gesture verb.
    #[serde(default)]
    pub reactions: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub weather_reactions: Vec<WeatherReaction>,
    /// Idle-action pools keyed by room id, with a "default" fallback pool.
    #[serde(default)]
    pub idle_actions: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub merchant: Option<MerchantDef>,
    #[serde(default)]
    pub route: Option<RouteDef>,
    #[serde(default)]
    pub on_attacked: Option<OnAttacked>,
    /// When true the text-generation collaborator is consulted for dialogue.
    #[serde(default)]
    pub use_dialogue: bool,
    /// Deterministic fallback line spoken when the collaborator yields nothing.
    #[serde(default)]
    pub scripted_line: Option<String>,
}

fn default_pronoun() -> String {
    "they".to_string()
}

impl NpcArchetype {
    pub fn new(id: &str, name: &str, description: &str, home: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            shortname: None,
            title: None,
            description: description.to_string(),
            personality: String::new(),
            pronoun: default_pronoun(),
            home: home.to_string(),
            stats: NpcStats::default(),
            reactions: HashMap::new(),
            weather_reactions: Vec::new(),
            idle_actions: HashMap::new(),
            merchant: None,
            route: None,
            on_attacked: None,
            use_dialogue: false,
            scripted_line: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_personality(mut self, text: &str) -> Self {
        self.personality = text.to_string();
        self
    }

    pub fn with_pronoun(mut self, pronoun: &str) -> Self {
        self.pronoun = pronoun.to_string();
        self
    }

    pub fn with_stats(mut self, max_hp: i32, attack: i32, defense: i32, speed: i32, faction: &str) -> Self {
        self.stats = NpcStats {
            max_hp,
            attack,
            defense,
            speed,
            faction: faction.to_string(),
        };
        self
    }

    pub fn with_reaction(mut self, verb: &str, lines: &[&str]) -> Self {
        self.reactions
            .insert(verb.to_string(), lines.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_weather_reaction(
        mut self,
        weather: WeatherType,
        intensity: WeatherIntensity,
        lines: &[&str],
    ) -> Self {
        self.weather_reactions.push(WeatherReaction {
            weather,
            intensity,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_idle_actions(mut self, room_id: &str, lines: &[&str]) -> Self {
        self.idle_actions
            .insert(room_id.to_string(), lines.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_merchant(mut self, merchant: MerchantDef) -> Self {
        self.merchant = Some(merchant);
        self
    }

    pub fn with_route(mut self, rooms: &[&str], interval_minutes: u64) -> Self {
        self.route = Some(RouteDef {
            rooms: rooms.iter().map(|s| s.to_string()).collect(),
            interval_minutes,
        });
        self
    }

    pub fn with_on_attacked(mut self, on_attacked: OnAttacked) -> Self {
        self.on_attacked = Some(on_attacked);
        self
    }

    pub fn with_scripted_line(mut self, line: &str) -> Self {
        self.scripted_line = Some(line.to_string());
        self
    }

    /// Opt this NPC into collaborator-generated dialogue.
    pub fn uses_dialogue(mut self) -> Self {
        self.use_dialogue = true;
        self
    }

    /// Short handle for matching: explicit shortname, else the last word of
    /// the display name lowercased.
    pub fn short_handle(&self) -> String {
        if let Some(ref s) = self.shortname {
            return s.to_lowercase();
        }
        self.name
            .split_whitespace()
            .last()
            .unwrap_or(&self.name)
            .to_lowercase()
    }

    /// Possessive form of the configured pronoun, for prose like
    /// "shakes her head".
    pub fn pronoun_possessive(&self) -> &'static str {
        match self.pronoun.as_str() {
            "he" => "his",
            "she" => "her",
            "it" => "its",
            _ => "their",
        }
    }

    pub fn weather_lines(
        &self,
        weather: WeatherType,
        intensity: WeatherIntensity,
    ) -> Option<&[String]> {
        self.weather_reactions
            .iter()
            .find(|r| r.weather == weather && r.intensity == intensity)
            .map(|r| r.lines.as_slice())
    }
}

/// Mutable per-NPC record held in the world state store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpcState {
    pub room_id: String,
    pub home_room: String,
    pub hp: i32,
    #[serde(default = "default_true")]
    pub alive: bool,
    #[serde(default)]
    pub route_index: usize,
    /// World minute of the last route advancement.
    #[serde(default)]
    pub route_advanced_at: u64,
    #[serde(default)]
    pub merchant_stock: HashMap<String, u32>,
    /// World minute of the last merchant restock.
    #[serde(default)]
    pub restocked_at: u64,
    /// Round-robin cursors into the archetype's reaction pools, keyed by
    /// gesture verb, so repeated gestures cycle rather than repeat.
    #[serde(default)]
    pub reaction_cursor: HashMap<String, usize>,
    #[serde(default)]
    pub exposure: Exposure,
    pub schema_version: u8,
}

impl NpcState {
    /// Synthesize a fresh dynamic record from an archetype.
    pub fn from_archetype(archetype: &NpcArchetype) -> Self {
        let merchant_stock = archetype
            .merchant
            .as_ref()
            .map(|m| {
                m.prices
                    .iter()
                    .map(|p| (p.item_id.clone(), p.initial_stock))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            room_id: archetype.home.clone(),
            home_room: archetype.home.clone(),
            hp: archetype.stats.max_hp,
            alive: true,
            route_index: 0,
            route_advanced_at: 0,
            merchant_stock,
            restocked_at: 0,
            reaction_cursor: HashMap::new(),
            exposure: Exposure::default(),
            schema_version: NPC_STATE_SCHEMA_VERSION,
        }
    }
}

// ============================================================================
// Quests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestGiver {
    Npc { npc_id: String },
    Noticeboard { room_id: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum QuestDifficulty {
    Easy,
    Moderate,
    Hard,
    Epic,
}

impl QuestDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Moderate => "Moderate",
            Self::Hard => "Hard",
            Self::Epic => "Epic",
        }
    }
}

/// A typed objective predicate within a quest stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Objective {
    ReachRoom {
        room_id: String,
    },
    TalkToNpc {
        npc_id: String,
    },
    SayKeyword {
        npc_id: String,
        keywords: Vec<String>,
    },
    ObtainItem {
        item_id: String,
    },
    DeliverItem {
        item_id: String,
        npc_id: String,
        #[serde(default)]
        room_id: Option<String>,
    },
}

impl Objective {
    pub fn describe(&self) -> String {
        match self {
            Self::ReachRoom { room_id } => format!("Go to {}", room_id.replace('_', " ")),
            Self::TalkToNpc { npc_id } => format!("Talk to {}", npc_id.replace('_', " ")),
            Self::SayKeyword { npc_id, .. } => {
                format!("Speak with {} about it", npc_id.replace('_', " "))
            }
            Self::ObtainItem { item_id } => format!("Obtain {}", item_id.replace('_', " ")),
            Self::DeliverItem { item_id, npc_id, .. } => format!(
                "Deliver {} to {}",
                item_id.replace('_', " "),
                npc_id.replace('_', " ")
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestStage {
    pub id: String,
    pub description: String,
    pub objectives: Vec<Objective>,
}

impl QuestStage {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            objectives: Vec::new(),
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReputationDelta {
    pub npc_id: String,
    pub amount: i32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemGrant {
    pub item_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub quest_item: bool,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestRewards {
    #[serde(default)]
    pub currency: CurrencyAmount,
    #[serde(default)]
    pub reputation: Vec<ReputationDelta>,
    #[serde(default)]
    pub items: Vec<ItemGrant>,
}

/// Who may hold a quest, and how many at once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestAvailability {
    /// Shared quests ignore the holder cap; exclusive quests enforce it.
    #[serde(default = "default_true")]
    pub shared: bool,
    #[serde(default)]
    pub max_holders: Option<u32>,
    #[serde(default)]
    pub max_per_player: Option<u32>,
    /// When set, an experienced player cannot claim the last slot while a
    /// less-experienced player could still take it.
    #[serde(default)]
    pub newbie_priority: bool,
}

impl Default for QuestAvailability {
    fn default() -> Self {
        Self {
            shared: true,
            max_holders: None,
            max_per_player: None,
            newbie_priority: false,
        }
    }
}

/// How a quest is surfaced to players.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OfferSource {
    NpcDialogue {
        npc_id: String,
        keywords: Vec<String>,
        offer_text: String,
    },
    Noticeboard {
        room_id: String,
    },
}

/// An item spawned into a room the moment the quest is accepted, so the
/// objective target exists even though the static room definition omits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemPlacement {
    pub room_id: String,
    pub item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub giver: QuestGiver,
    pub difficulty: QuestDifficulty,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub time_limit_minutes: Option<u64>,
    pub stages: Vec<QuestStage>,
    #[serde(default)]
    pub rewards: QuestRewards,
    #[serde(default)]
    pub availability: QuestAvailability,
    #[serde(default)]
    pub failure_reputation: Vec<ReputationDelta>,
    #[serde(default)]
    pub offers: Vec<OfferSource>,
    /// Items placed into rooms when the quest starts.
    #[serde(default)]
    pub placements: Vec<ItemPlacement>,
}

impl QuestTemplate {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        giver: QuestGiver,
        difficulty: QuestDifficulty,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            giver,
            difficulty,
            category: String::new(),
            time_limit_minutes: None,
            stages: Vec::new(),
            rewards: QuestRewards::default(),
            availability: QuestAvailability::default(),
            failure_reputation: Vec::new(),
            offers: Vec::new(),
            placements: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Fail the quest automatically this many world minutes after accept.
    pub fn timed(mut self, minutes: u64) -> Self {
        self.time_limit_minutes = Some(minutes);
        self
    }

    pub fn with_stage(mut self, stage: QuestStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_reward_currency(mut self, amount: CurrencyAmount) -> Self {
        self.rewards.currency = amount;
        self
    }

    pub fn with_reward_reputation(mut self, npc_id: &str, amount: i32, reason: &str) -> Self {
        self.rewards.reputation.push(ReputationDelta {
            npc_id: npc_id.to_string(),
            amount,
            reason: reason.to_string(),
        });
        self
    }

    pub fn with_reward_item(mut self, item_id: &str, quest_item: bool) -> Self {
        self.rewards.items.push(ItemGrant {
            item_id: item_id.to_string(),
            quantity: 1,
            quest_item,
        });
        self
    }

    /// One holder at a time, newcomers first when contested.
    pub fn exclusive(mut self) -> Self {
        self.availability.shared = false;
        self.availability.max_holders = Some(1);
        self.availability.newbie_priority = true;
        self
    }

    pub fn max_per_player(mut self, count: u32) -> Self {
        self.availability.max_per_player = Some(count);
        self
    }

    pub fn with_failure_reputation(mut self, npc_id: &str, amount: i32, reason: &str) -> Self {
        self.failure_reputation.push(ReputationDelta {
            npc_id: npc_id.to_string(),
            amount,
            reason: reason.to_string(),
        });
        self
    }

    pub fn with_offer(mut self, offer: OfferSource) -> Self {
        self.offers.push(offer);
        self
    }

    pub fn with_placement(mut self, room_id: &str, item_id: &str) -> Self {
        self.placements.push(ItemPlacement {
            room_id: room_id.to_string(),
            item_id: item_id.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Active,
    Completed { at_minutes: u64 },
    Failed { at_minutes: u64, reason: String },
}

/// Per-player progress through one quest template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestInstance {
    pub quest_id: String,
    pub status: QuestStatus,
    #[serde(default)]
    pub current_stage: usize,
    /// Completion flags for the current stage's objectives, reset on advance.
    #[serde(default)]
    pub stage_progress: Vec<bool>,
    pub started_at_minutes: u64,
    #[serde(default)]
    pub expires_at_minutes: Option<u64>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl QuestInstance {
    pub fn start(template: &QuestTemplate, now_minutes: u64) -> Self {
        let first_stage_len = template.stages.first().map(|s| s.objectives.len()).unwrap_or(0);
        let mut notes = vec![format!("Quest started: {}", template.name)];
        if let Some(stage) = template.stages.first() {
            notes.push(format!("Objective: {}", stage.description));
        }
        Self {
            quest_id: template.id.clone(),
            status: QuestStatus::Active,
            current_stage: 0,
            stage_progress: vec![false; first_stage_len],
            started_at_minutes: now_minutes,
            expires_at_minutes: template.time_limit_minutes.map(|t| now_minutes + t),
            notes,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, QuestStatus::Active)
    }
}

/// Global ownership bookkeeping for one quest template. Used only for
/// availability checks at offer and accept time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    #[serde(default)]
    pub holders: HashSet<String>,
    /// Completion counters per player username.
    #[serde(default)]
    pub completions: HashMap<String, u32>,
}

impl RosterEntry {
    pub fn completions_for(&self, username: &str) -> u32 {
        self.completions.get(username).copied().unwrap_or(0)
    }

    pub fn total_completions(&self, username: &str) -> u32 {
        self.completions_for(username)
    }
}

// ============================================================================
// Game events
// ============================================================================

/// A typed fact emitted by the command engine describing something that just
/// happened. Consumed by the quest engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EnterRoom {
        room_id: String,
    },
    TalkToNpc {
        npc_id: String,
    },
    SayToNpc {
        npc_id: String,
        text: String,
    },
    TakeItem {
        item_id: String,
    },
    GiveItem {
        item_id: String,
        npc_id: String,
        room_id: String,
    },
    DropItem {
        item_id: String,
    },
}

// ============================================================================
// Currency
// ============================================================================

/// A structured coin amount stored as copper base units.
/// 1 gold = 500 copper, 1 silver = 10 copper.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrencyAmount {
    pub base_units: i64,
}

impl CurrencyAmount {
    pub fn copper(units: i64) -> Self {
        Self { base_units: units }
    }

    pub fn from_parts(gold: i64, silver: i64, copper: i64) -> Self {
        Self {
            base_units: gold * COPPER_PER_GOLD + silver * COPPER_PER_SILVER + copper,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.base_units == 0
    }

    /// Split into (gold, silver, copper) denominations for display.
    pub fn parts(&self) -> (i64, i64, i64) {
        let gold = self.base_units / COPPER_PER_GOLD;
        let rest = self.base_units % COPPER_PER_GOLD;
        (gold, rest / COPPER_PER_SILVER, rest % COPPER_PER_SILVER)
    }

    pub fn add(&self, other: &CurrencyAmount) -> CurrencyAmount {
        CurrencyAmount {
            base_units: self.base_units.saturating_add(other.base_units),
        }
    }

    /// Subtract, flooring at zero. Returns `None` when funds are insufficient.
    pub fn subtract(&self, other: &CurrencyAmount) -> Option<CurrencyAmount> {
        if self.base_units < other.base_units {
            return None;
        }
        Some(CurrencyAmount {
            base_units: self.base_units - other.base_units,
        })
    }

    pub fn can_afford(&self, cost: &CurrencyAmount) -> bool {
        self.base_units >= cost.base_units
    }
}

impl std::fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return f.write_str("nothing");
        }
        let (gold, silver, copper) = self.parts();
        let mut pieces = Vec::new();
        if gold > 0 {
            pieces.push(format!("{} gold", gold));
        }
        if silver > 0 {
            pieces.push(format!("{} silver", silver));
        }
        if copper > 0 {
            pieces.push(format!("{} copper", copper));
        }
        f.write_str(&pieces.join(", "))
    }
}

// ============================================================================
// Player session state
// ============================================================================

/// One append-only transcript entry in a player's log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub line: String,
}

impl LogEntry {
    pub fn new(line: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            line: line.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    ChooseName,
    ChooseRace,
    ChooseGender,
    AllocateStats,
    Backstory,
    /// Entered from [`OnboardingStep::Backstory`] when the player elects to
    /// write their own instead of picking a named one.
    CustomBackstory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingState {
    InProgress { step: OnboardingStep },
    Complete { completed_at: DateTime<Utc> },
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self::Complete {
            completed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharStats {
    pub strength: u8,
    pub agility: u8,
    pub wisdom: u8,
    pub willpower: u8,
    pub luck: u8,
}

impl CharStats {
    pub fn total(&self) -> u32 {
        self.strength as u32
            + self.agility as u32
            + self.wisdom as u32
            + self.willpower as u32
            + self.luck as u32
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharacterSheet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub stats: CharStats,
    #[serde(default)]
    pub backstory: Option<String>,
}

/// Tracks politeness reputation gains per NPC so kind words cannot be farmed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolitenessTracking {
    #[serde(default)]
    pub interaction_count: u32,
    #[serde(default)]
    pub total_gained: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOffer {
    pub quest_id: String,
    pub source: String,
    pub offered_at_minutes: u64,
}

/// Everything the simulation knows about one player. Mutated only by that
/// player's own requests; the session layer that owns identity and transport
/// is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub username: String,
    pub location: String,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub currency: CurrencyAmount,
    /// Per-NPC standing, clamped to -100..=200.
    #[serde(default)]
    pub reputation: HashMap<String, i32>,
    /// Per-NPC conversation cooldowns: npc id -> world minute when talk is
    /// allowed again.
    #[serde(default)]
    pub npc_cooldowns: HashMap<String, u64>,
    #[serde(default)]
    pub politeness: HashMap<String, PolitenessTracking>,
    #[serde(default)]
    pub quests: HashMap<String, QuestInstance>,
    #[serde(default)]
    pub completed_quests: HashMap<String, QuestInstance>,
    #[serde(default)]
    pub pending_offer: Option<PendingOffer>,
    #[serde(default)]
    pub exposure: Exposure,
    #[serde(default)]
    pub log: Vec<LogEntry>,
    #[serde(default)]
    pub onboarding: OnboardingState,
    #[serde(default)]
    pub character: CharacterSheet,
    /// World minute at which ambient catch-up last paid out for this player.
    #[serde(default)]
    pub ambient_paid_to: u64,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(username: &str, location: &str) -> Self {
        Self {
            username: username.to_string(),
            location: location.to_string(),
            inventory: Vec::new(),
            currency: CurrencyAmount::from_parts(50, 0, 0),
            reputation: HashMap::new(),
            npc_cooldowns: HashMap::new(),
            politeness: HashMap::new(),
            quests: HashMap::new(),
            completed_quests: HashMap::new(),
            pending_offer: None,
            exposure: Exposure::default(),
            log: Vec::new(),
            onboarding: OnboardingState::default(),
            character: CharacterSheet {
                name: username.to_string(),
                ..CharacterSheet::default()
            },
            ambient_paid_to: 0,
            created_at: Utc::now(),
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    /// A fresh player who still has to walk through character creation.
    pub fn new_unboarded(username: &str, location: &str) -> Self {
        let mut record = Self::new(username, location);
        record.onboarding = OnboardingState::InProgress {
            step: OnboardingStep::ChooseName,
        };
        record
    }

    pub fn onboarded(&self) -> bool {
        matches!(self.onboarding, OnboardingState::Complete { .. })
    }

    /// Append a line to the capped event log.
    pub fn push_log(&mut self, line: &str) {
        self.log.push(LogEntry::new(line));
        if self.log.len() > LOG_CAP {
            let excess = self.log.len() - LOG_CAP;
            self.log.drain(0..excess);
        }
    }

    pub fn has_item(&self, item_id: &str) -> bool {
        self.inventory.iter().any(|i| i == item_id)
    }

    /// Remove one instance of an item from the inventory multiset.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        if let Some(pos) = self.inventory.iter().position(|i| i == item_id) {
            self.inventory.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn reputation_with(&self, npc_id: &str) -> i32 {
        self.reputation.get(npc_id).copied().unwrap_or(0)
    }

    /// Shift standing with one NPC, clamped to the -100..=200 band.
    pub fn adjust_reputation(&mut self, npc_id: &str, delta: i32) {
        let entry = self.reputation.entry(npc_id.to_string()).or_insert(0);
        *entry = (*entry + delta).clamp(-100, 200);
    }

    /// Total completed quests, the "experience" measure behind the
    /// newbie-priority availability rule. Failed quests sit in the same
    /// history map but do not count.
    pub fn quests_completed(&self) -> u32 {
        self.completed_quests
            .values()
            .filter(|q| matches!(q.status, QuestStatus::Completed { .. }))
            .count() as u32
    }
}

// ============================================================================
// Buried items
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuriedItem {
    pub item_id: String,
    pub buried_by: String,
    pub buried_at_minutes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse_abbreviations() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("NE"), Some(Direction::Northeast));
        assert_eq!(Direction::parse("down"), Some(Direction::Down));
        assert_eq!(Direction::parse("around"), None);
    }

    #[test]
    fn direction_opposites_pair_up() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::Southwest.opposite(), Direction::Northeast);
    }

    #[test]
    fn currency_parts_and_affordability() {
        let purse = CurrencyAmount::from_parts(1, 2, 3);
        assert_eq!(purse.base_units, 523);
        assert_eq!(purse.parts(), (1, 2, 3));
        let cost = CurrencyAmount::copper(500);
        assert!(purse.can_afford(&cost));
        assert_eq!(purse.subtract(&cost), Some(CurrencyAmount::copper(23)));
        assert_eq!(purse.subtract(&CurrencyAmount::copper(1000)), None);
        assert_eq!(CurrencyAmount::from_parts(2, 0, 5).to_string(), "2 gold, 5 copper");
        assert_eq!(CurrencyAmount::default().to_string(), "nothing");
    }

    #[test]
    fn exposure_clamps_to_bounds() {
        let mut exposure = Exposure::default();
        exposure.bump_wetness(12);
        assert_eq!(exposure.wetness, 10);
        exposure.bump_wetness(-15);
        assert_eq!(exposure.wetness, 0);
        assert!(!exposure.has_status());
    }

    #[test]
    fn room_descriptions_fall_back_to_default() {
        let desc = RoomDescriptions {
            default: "A square.".into(),
            night: Some("A dark square.".into()),
            ..RoomDescriptions::plain("A square.")
        };
        assert_eq!(desc.for_time(TimeOfDay::Day), "A square.");
        assert_eq!(desc.for_time(TimeOfDay::Night), "A dark square.");
    }

    #[test]
    fn player_log_is_capped() {
        let mut player = PlayerRecord::new("mira", "town_square");
        for i in 0..(LOG_CAP + 25) {
            player.push_log(&format!("line {}", i));
        }
        assert_eq!(player.log.len(), LOG_CAP);
        assert!(player.log[0].line.ends_with("25"));
    }

    #[test]
    fn npc_state_synthesized_from_archetype() {
        let mut archetype = NpcArchetype::new("mara", "Mara", "The innkeeper.", "tavern");
        archetype.merchant = Some(MerchantDef {
            temper: MerchantTemper::Fair,
            prices: vec![PriceEntry {
                item_id: "stew".into(),
                price: 10,
                initial_stock: 10,
            }],
        });
        let state = NpcState::from_archetype(&archetype);
        assert_eq!(state.room_id, "tavern");
        assert_eq!(state.merchant_stock.get("stew"), Some(&10));
        assert!(state.alive);
    }

    #[test]
    fn quest_instance_tracks_expiry() {
        let template = QuestTemplate {
            id: "errand".into(),
            name: "An Errand".into(),
            description: "Run an errand.".into(),
            giver: QuestGiver::Npc {
                npc_id: "mara".into(),
            },
            difficulty: QuestDifficulty::Easy,
            category: "Errand".into(),
            time_limit_minutes: Some(60),
            stages: vec![QuestStage {
                id: "go".into(),
                description: "Go somewhere.".into(),
                objectives: vec![Objective::ReachRoom {
                    room_id: "tavern".into(),
                }],
            }],
            rewards: QuestRewards::default(),
            availability: QuestAvailability::default(),
            failure_reputation: Vec::new(),
            offers: Vec::new(),
            placements: Vec::new(),
        };
        let instance = QuestInstance::start(&template, 100);
        assert_eq!(instance.expires_at_minutes, Some(160));
        assert_eq!(instance.stage_progress, vec![false]);
        assert!(instance.is_active());
    }
}

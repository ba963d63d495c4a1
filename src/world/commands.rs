//! The command engine: one line of player text in, a response and a batch of
//! typed events out.
//!
//! Parsing runs in two stages. Known verbs and their aliases resolve directly
//! to a [`Command`]; anything else falls through to the broad tier, which
//! tries bare direction words and gesture verbs before giving up. Handlers
//! apply their effects to the store as they go, re-checking anything racy
//! (exits, stock, buried items) under the record lock at the moment of
//! commitment rather than trusting what was read at parse time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use rand::Rng;

use super::ambiance;
use super::catalog::WorldCatalog;
use super::clock;
use super::dialogue::{self, DialogueProvider, DialogueRequest};
use super::economy;
use super::emotes;
use super::errors::WorldError;
use super::npc;
use super::onboarding;
use super::quest;
use super::resolver::{self, Target};
use super::store::WorldStore;
use super::textutil;
use super::types::{
    CurrencyAmount, Direction, FixtureDef, FixtureTrigger, GameEvent, ItemDef, ItemKind, LogEntry,
    MerchantTemper, NpcArchetype, NpcState, PlayerRecord, RoomDef, WeatherIntensity, WeatherType,
};
use super::weather;

/// Total item weight a player can carry before pickups start failing.
pub const MAX_CARRY_WEIGHT: f32 = 20.0;

/// Phrases that signal an intent to buy when spoken near a merchant.
const PURCHASE_PHRASES: &[&str] = &[
    "i'll take",
    "i'll have",
    "i want",
    "i need",
    "give me",
    "get me",
    "can i get",
    "can i have",
    "i'd like",
    "i would like",
    "sure, i'll take",
    "yes, i'll take",
    "ok, i'll take",
    "please",
    "i'll buy",
    "buy me",
    "i'll purchase",
];

/// Phrases that veto a purchase read even when a purchase phrase matches;
/// these are complaints and questions about a past sale, not orders.
const PURCHASE_BLOCKERS: &[&str] = &[
    "why did",
    "why does",
    "why would",
    "why should",
    "i only wanted",
    "i wanted",
    "i thought",
    "you gave me",
    "you gave",
    "you sold me",
    "i don't want",
    "i didn't want",
    "i don't need",
    "that cost",
    "that costs",
    "costs the same",
];

/// Phrases that read as a plea for charity rather than a purchase.
const CHARITY_PHRASES: &[&str] = &[
    "spare",
    "for free",
    "charity",
    "can't afford",
    "cannot afford",
    "no money",
    "no coin",
    "have mercy",
    "anything to eat",
];

// ============================================================================
// Session hooks
// ============================================================================

/// One connected player, as reported by the session layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlinePlayer {
    pub username: String,
    /// Room id the player is currently in.
    pub location: String,
}

/// The simulation's window onto the session layer. Broadcasts are
/// best-effort; the engine never waits on delivery.
pub trait SessionHooks: Send + Sync {
    /// Deliver a line to every other player present in a room.
    fn broadcast(&self, room_id: &str, line: &str);
    /// Everyone currently online, including the acting player.
    fn who(&self) -> Vec<OnlinePlayer>;
}

/// Hooks that go nowhere. Single-player sessions and most tests use these.
pub struct NullHooks;

impl SessionHooks for NullHooks {
    fn broadcast(&self, _room_id: &str, _line: &str) {}

    fn who(&self) -> Vec<OnlinePlayer> {
        Vec::new()
    }
}

// ============================================================================
// Context and outcome
// ============================================================================

/// Everything a handler needs beyond the player record itself.
pub struct CommandContext<'a> {
    pub catalog: &'a WorldCatalog,
    pub store: &'a WorldStore,
    /// World minutes since the epoch, fixed for the whole invocation.
    pub now_minutes: u64,
    pub wall_now: DateTime<Utc>,
    pub hooks: &'a dyn SessionHooks,
    pub dialogue: &'a dyn DialogueProvider,
    /// Bound on each dialogue provider call.
    pub dialogue_timeout: Duration,
    /// How many recent transcript entries dialogue providers are shown.
    pub log_tail: usize,
    /// Usernames allowed to run admin verbs, matched case-insensitively.
    pub admins: &'a [String],
}

/// The last `n` entries of a transcript log.
fn recent_log_tail(log: &[LogEntry], n: usize) -> &[LogEntry] {
    &log[log.len().saturating_sub(n)..]
}

impl CommandContext<'_> {
    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.iter().any(|a| a.eq_ignore_ascii_case(username))
    }

    /// Other online players in a room, by username.
    fn others_in_room(&self, room_id: &str, me: &str) -> Vec<String> {
        self.hooks
            .who()
            .into_iter()
            .filter(|p| p.location == room_id && p.username != me)
            .map(|p| p.username)
            .collect()
    }
}

/// What one invocation produced: the reply for the acting player plus the
/// typed events the quest engine consumes afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommandOutcome {
    pub response: String,
    pub events: Vec<GameEvent>,
}

impl CommandOutcome {
    fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            events: Vec::new(),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Look(Option<String>),
    Go(String),
    Inventory,
    Purse,
    Take(String),
    Drop(String),
    Bury(String),
    Dig(Option<String>),
    Give(String),
    Buy(String),
    Sell(String),
    ListWares,
    Say(String),
    Talk(String),
    Gesture {
        verb: String,
        target: Option<String>,
    },
    Touch(String),
    Use(String),
    Attack(String),
    Quests,
    Board(Option<usize>),
    Accept,
    Decline,
    Time,
    WeatherReport,
    Who,
    Help,
    Goto(String),
    Set(Vec<String>),
    Stat(String),
    Empty,
    Unknown(String),
}

impl Command {
    /// Resolve one raw line into a typed command. Case is preserved only for
    /// speech; everything else is matched lowercased.
    pub fn parse(raw: &str) -> Command {
        let text = raw.trim();
        if text.is_empty() {
            return Command::Empty;
        }
        let verb = text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let rest = text
            .splitn(2, char::is_whitespace)
            .nth(1)
            .unwrap_or("")
            .trim()
            .to_string();
        let rest_lower = rest.to_lowercase();

        match verb.as_str() {
            "look" | "l" | "examine" | "x" => {
                if rest_lower.is_empty()
                    || matches!(rest_lower.as_str(), "here" | "room" | "around")
                {
                    Command::Look(None)
                } else {
                    Command::Look(Some(rest_lower))
                }
            }
            // "go to the north" keeps only the last word
            "go" | "move" | "walk" => match rest_lower.split_whitespace().last() {
                Some(word) => Command::Go(word.to_string()),
                None => Command::Unknown(verb),
            },
            "inventory" | "inv" | "i" => Command::Inventory,
            "gold" | "money" | "currency" | "purse" => Command::Purse,
            "take" | "get" | "pick" => {
                let target = rest_lower.strip_prefix("up ").unwrap_or(&rest_lower);
                Command::Take(target.to_string())
            }
            "drop" => Command::Drop(rest_lower),
            "bury" => Command::Bury(rest_lower),
            "dig" => {
                let target = rest_lower
                    .strip_prefix("up ")
                    .unwrap_or(&rest_lower)
                    .to_string();
                if target.is_empty() {
                    Command::Dig(None)
                } else {
                    Command::Dig(Some(target))
                }
            }
            "give" => Command::Give(rest_lower),
            "buy" => Command::Buy(rest_lower),
            "sell" => Command::Sell(rest_lower),
            "list" | "wares" | "browse" => Command::ListWares,
            "say" | "'" => Command::Say(rest),
            "talk" | "speak" | "chat" => {
                let target = rest_lower.strip_prefix("to ").unwrap_or(&rest_lower);
                Command::Talk(target.to_string())
            }
            "touch" => Command::Touch(rest_lower),
            "use" => Command::Use(rest_lower),
            "attack" | "hit" | "kill" => Command::Attack(rest_lower),
            "quests" | "quest" | "journal" => Command::Quests,
            "board" | "noticeboard" => Command::Board(rest_lower.parse().ok()),
            "accept" => Command::Accept,
            "decline" | "refuse" => Command::Decline,
            "time" => Command::Time,
            "weather" | "sky" => Command::WeatherReport,
            "who" => Command::Who,
            "help" | "?" => Command::Help,
            "goto" => Command::Goto(rest_lower),
            "set" => Command::Set(
                rest_lower
                    .split_whitespace()
                    .map(|w| w.to_string())
                    .collect(),
            ),
            "stat" => Command::Stat(rest_lower),
            _ => {
                if Direction::parse(&verb).is_some() {
                    return Command::Go(verb);
                }
                if emotes::is_emote(&verb) {
                    let target = if rest_lower.is_empty() {
                        None
                    } else {
                        Some(rest_lower.strip_prefix("at ").unwrap_or(&rest_lower).to_string())
                    };
                    return Command::Gesture { verb, target };
                }
                Command::Unknown(verb)
            }
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run one player line end to end. Character creation intercepts everything
/// until the record is complete; once it is, the first reply includes the
/// spawn room so the player is not left staring at a blank prompt.
pub async fn dispatch<R: Rng + Send>(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    raw: &str,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    if !player.onboarded() {
        let mut outcome = CommandOutcome::text(onboarding::advance(ctx.catalog, player, raw));
        if player.onboarded() {
            outcome.response.push_str("\n\n");
            outcome.response.push_str(&render_room(ctx, player, rng)?);
            outcome.events.push(GameEvent::EnterRoom {
                room_id: player.location.clone(),
            });
        }
        return Ok(outcome);
    }

    match Command::parse(raw) {
        Command::Empty => Ok(CommandOutcome::text("You say nothing.")),
        Command::Look(target) => handle_look(ctx, player, target.as_deref(), rng),
        Command::Go(direction) => handle_go(ctx, player, &direction, rng),
        Command::Inventory => handle_inventory(ctx, player),
        Command::Purse => handle_purse(player),
        Command::Take(target) => handle_take(ctx, player, &target),
        Command::Drop(target) => handle_drop(ctx, player, &target),
        Command::Bury(target) => handle_bury(ctx, player, &target),
        Command::Dig(target) => handle_dig(ctx, player, target.as_deref()),
        Command::Give(args) => handle_give(ctx, player, &args),
        Command::Buy(args) => handle_buy(ctx, player, &args, rng),
        Command::Sell(args) => handle_sell(ctx, player, &args),
        Command::ListWares => handle_list_wares(ctx, player, rng),
        Command::Say(text) => handle_say(ctx, player, &text, rng).await,
        Command::Talk(target) => handle_talk(ctx, player, &target).await,
        Command::Gesture { verb, target } => handle_gesture(ctx, player, &verb, target.as_deref()),
        Command::Touch(target) => {
            handle_fixture_interaction(ctx, player, &target, FixtureTrigger::OnTouch)
        }
        Command::Use(target) => {
            handle_fixture_interaction(ctx, player, &target, FixtureTrigger::OnUse)
        }
        Command::Attack(target) => handle_attack(ctx, player, &target),
        Command::Quests => Ok(CommandOutcome::text(quest::quest_log(
            ctx.catalog,
            player,
            ctx.now_minutes,
        ))),
        Command::Board(number) => handle_board(ctx, player, number),
        Command::Accept => Ok(CommandOutcome::text(quest::accept(
            ctx.catalog,
            ctx.store,
            player,
            ctx.now_minutes,
        )?)),
        Command::Decline => Ok(CommandOutcome::text(quest::decline(player))),
        Command::Time => handle_time(ctx, player),
        Command::WeatherReport => handle_weather(ctx, player),
        Command::Who => handle_who(ctx),
        Command::Help => Ok(CommandOutcome::text(HELP_TEXT)),
        Command::Goto(target) => handle_goto(ctx, player, &target, rng),
        Command::Set(args) => handle_set(ctx, player, &args),
        Command::Stat(target) => handle_stat(ctx, player, &target),
        Command::Unknown(_) => Ok(CommandOutcome::text(
            "You mutter some nonsense. (Try 'help' for ideas.)",
        )),
    }
}

const HELP_TEXT: &str = "\
=== Commands ===
Getting around: look (l), go <direction>, or just 'north', 'ne', 'up'...
Things:         take <item>, drop <item>, give <item> to <npc>, bury <item>, dig
Trade:          buy <item> [from <merchant>], sell <item>, list, gold
People:         say <words>, talk <npc>, wave/bow/nod/smile [<npc>], attack <npc>, who
Quests:         board, board <number>, accept, decline, quests
World:          inventory (i), time, weather, touch <thing>, help";

// ============================================================================
// Movement and looking
// ============================================================================

fn handle_go<R: Rng>(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    direction_text: &str,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    let direction = match Direction::parse(direction_text) {
        Some(direction) => direction,
        None => return Ok(CommandOutcome::text("You can't go that way.")),
    };
    let room = ctx.catalog.require_room(&player.location)?;

    // Accessibility is re-read at the moment of the move; a door locked
    // since the player last looked still blocks.
    let accessible = ctx
        .store
        .accessible_exits(room, |key| player.has_item(key))?;
    let exit = match accessible.iter().find(|e| e.direction == direction) {
        Some(exit) => exit.clone(),
        None => {
            let all = ctx.store.effective_exits(room)?;
            return Ok(match all.iter().find(|e| e.direction == direction) {
                Some(exit) if !exit.hidden && exit.locked => CommandOutcome::text(format!(
                    "The way {} is locked.",
                    direction.as_str()
                )),
                _ => CommandOutcome::text("You can't go that way."),
            });
        }
    };

    let from = player.location.clone();
    let destination = ctx.catalog.require_room(&exit.target)?;
    player.location = exit.target.clone();
    player.push_log(&format!("Moved {} to {}", direction.as_str(), destination.name));

    ctx.hooks
        .broadcast(&from, &npc::leave_line(&player.username, direction));
    ctx.hooks.broadcast(
        &exit.target,
        &npc::arrive_line(&player.username, direction),
    );

    let mut outcome = CommandOutcome::text(format!(
        "You go {}, and find yourself in {}.\n\n{}",
        direction.as_str(),
        textutil::definite(&destination.name),
        render_room(ctx, player, rng)?
    ));
    outcome.events.push(GameEvent::EnterRoom {
        room_id: exit.target.clone(),
    });
    Ok(outcome)
}

/// The full room view: name, timed description, sky, flavor, exits, items,
/// and who else is standing around.
pub fn render_room<R: Rng>(
    ctx: &CommandContext<'_>,
    player: &PlayerRecord,
    rng: &mut R,
) -> Result<String, WorldError> {
    let room = ctx.catalog.require_room(&player.location)?;
    let time = clock::time_of_day(ctx.now_minutes);
    let season = clock::season(ctx.now_minutes);
    let moon = clock::moon_phase(ctx.now_minutes);
    let state = ctx.store.weather()?;

    let mut lines = vec![
        room.name.clone(),
        room.descriptions.for_time(time).to_string(),
    ];
    lines.push(weather::sky_line(&state, time, moon, room.outdoor));
    if let Some(flavor) = ambiance::seasonal_flavor(room, season, rng) {
        lines.push(flavor);
    }

    let exits = ctx.store.effective_exits(room)?;
    let visible: Vec<&str> = exits
        .iter()
        .filter(|e| !e.hidden)
        .map(|e| e.direction.as_str())
        .collect();
    if visible.is_empty() {
        lines.push("Exits: none.".to_string());
    } else {
        lines.push(format!("Exits: {}.", visible.join(", ")));
    }

    let items = ctx.store.room_items(&room.id)?;
    if items.is_empty() {
        lines.push("You don't see anything notable lying around.".to_string());
    } else {
        let grouped = textutil::group_counted(&items, |id, count| {
            counted_item_name(ctx.catalog, id, count)
        });
        lines.push(format!("You can see: {}.", textutil::join_names(&grouped)));
    }

    let mut present: Vec<String> = Vec::new();
    for npc_id in ctx.store.npcs_in_room(&room.id)? {
        if let Some(archetype) = ctx.catalog.npc(&npc_id) {
            present.push(archetype.name.clone());
        }
    }
    present.extend(ctx.others_in_room(&room.id, &player.username));
    if !present.is_empty() {
        let verb = if present.len() == 1 { "is" } else { "are" };
        lines.push(format!(
            "You notice: {} {} here.",
            textutil::join_names(&present),
            verb
        ));
    }

    Ok(lines.join("\n"))
}

fn counted_item_name(catalog: &WorldCatalog, id: &str, count: usize) -> String {
    let name = catalog.item_name(id);
    if count == 1 {
        textutil::with_article(&name)
    } else {
        format!(
            "{} {}",
            textutil::count_phrase(count),
            textutil::pluralize_name(&name, count)
        )
    }
}

fn handle_look<R: Rng>(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: Option<&str>,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    let query = match target {
        None => return Ok(CommandOutcome::text(render_room(ctx, player, rng)?)),
        Some(query) => query,
    };

    if query == "me" || query == "self" || query.eq_ignore_ascii_case(&player.username) {
        return Ok(CommandOutcome::text(self_look(ctx, player)));
    }

    let room = ctx.catalog.require_room(&player.location)?;
    let others = ctx.others_in_room(&room.id, &player.username);
    let resolved = resolver::resolve_target(ctx.catalog, ctx.store, player, room, &others, query)?;
    let response = match resolved {
        Some(Target::InventoryItem(id)) => item_look(&ctx.catalog.item_or_unknown(&id), true),
        Some(Target::RoomItem(id)) => item_look(&ctx.catalog.item_or_unknown(&id), false),
        Some(Target::Npc(id)) => {
            let archetype = match ctx.catalog.npc(&id) {
                Some(archetype) => archetype,
                None => return Ok(CommandOutcome::text(no_such_target(query))),
            };
            let state = ctx.store.npc_state(&id)?;
            npc_look(archetype, &state)
        }
        Some(Target::Player(username)) => format!(
            "You look at {}. Another adventurer, finding their own way through {}.",
            username,
            ctx.catalog.name()
        ),
        Some(Target::Fixture(fixture)) => {
            let mut lines = vec![fixture.description.clone()];
            if let Some(extra) = fixture_hook_line(ctx, &room.id, &fixture, FixtureTrigger::OnLook)
            {
                lines.push(extra);
            }
            lines.join("\n")
        }
        None => no_such_target(query),
    };
    Ok(CommandOutcome::text(response))
}

fn no_such_target(query: &str) -> String {
    format!("You don't see anything like '{}' here.", query)
}

fn item_look(def: &ItemDef, carried: bool) -> String {
    let mut lines = vec![format!("You look at the {}.", def.name)];
    if !def.description.is_empty() {
        lines.push(def.description.clone());
    }
    let hint = match def.kind {
        ItemKind::Container => Some("It looks like it can hold other items."),
        ItemKind::Currency => Some("This looks like a form of currency."),
        ItemKind::Food => Some("It looks edible."),
        ItemKind::Tool => Some("It appears to be a useful tool."),
        ItemKind::Artifact => Some("You sense it might have special properties."),
        ItemKind::Misc => None,
    };
    if let Some(hint) = hint {
        lines.push(hint.to_string());
    }
    lines.push(
        if carried {
            "(You are carrying this.)"
        } else {
            "(It's here in the room.)"
        }
        .to_string(),
    );
    lines.join("\n")
}

fn npc_look(archetype: &NpcArchetype, state: &NpcState) -> String {
    let mut lines = vec![archetype.description.clone()];
    match (&archetype.title, archetype.personality.is_empty()) {
        (Some(title), false) => lines.push(format!(
            "{} is {}; {}.",
            archetype.name, title, archetype.personality
        )),
        (Some(title), true) => lines.push(format!("{} is {}.", archetype.name, title)),
        (None, false) => lines.push(format!(
            "{} seems {}.",
            archetype.name, archetype.personality
        )),
        (None, true) => {}
    }
    if !state.alive {
        lines.push(format!("{} lies worryingly still.", archetype.name));
    } else {
        let max = archetype.stats.max_hp.max(1);
        if state.hp * 2 < max {
            lines.push(format!("{} looks injured or unwell.", archetype.name));
        } else if state.hp * 5 < max * 4 {
            lines.push(format!("{} looks a bit tired.", archetype.name));
        }
    }
    lines.join("\n")
}

fn self_look(ctx: &CommandContext<'_>, player: &PlayerRecord) -> String {
    let mut lines = vec!["You look at yourself.".to_string()];
    let sheet = &player.character;
    if !sheet.race.is_empty() && !sheet.gender.is_empty() {
        lines.push(format!(
            "You are a {} {} adventurer in {}.",
            sheet.gender,
            sheet.race,
            ctx.catalog.name()
        ));
    }
    let stats = &sheet.stats;
    if stats.total() > 0 {
        lines.push(format!(
            "Stats: Strength {}, Agility {}, Wisdom {}, Willpower {}, Luck {}.",
            stats.strength, stats.agility, stats.wisdom, stats.willpower, stats.luck
        ));
    }
    if let Some(backstory) = &sheet.backstory {
        lines.push(format!("Backstory: {}", backstory));
    }
    if let Some(status) = weather::exposure_line(&player.exposure) {
        lines.push(status);
    }
    lines.join("\n")
}

/// Resolve a fixture's named hook to its line. Unknown handler names are a
/// world-file authoring slip: log and fall back to nothing.
fn fixture_hook_line(
    ctx: &CommandContext<'_>,
    room_id: &str,
    fixture: &FixtureDef,
    trigger: FixtureTrigger,
) -> Option<String> {
    let handler = fixture.hooks.get(&trigger)?;
    match handler.as_str() {
        "noticeboard_postings" => Some(quest::render_board(ctx.catalog, room_id)),
        "fountain_touch" => Some(
            "The water is colder than it has any right to be. Ripples scatter \
             your reflection."
                .to_string(),
        ),
        "forge_heat" => Some(
            "Heat rolls off the banked coals and stings your palm before you \
             pull it back."
                .to_string(),
        ),
        "shrine_hum" => Some(
            "A faint vibration runs through the stone, like a note held just \
             below hearing."
                .to_string(),
        ),
        "door_chill" => Some(
            "The stone is cold enough to bite, and for a moment you would \
             swear it pressed back."
                .to_string(),
        ),
        other => {
            debug!("fixture '{}' names unknown hook '{}'", fixture.id, other);
            None
        }
    }
}

fn handle_fixture_interaction(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    query: &str,
    trigger: FixtureTrigger,
) -> Result<CommandOutcome, WorldError> {
    let verb = match trigger {
        FixtureTrigger::OnTouch => "touch",
        FixtureTrigger::OnUse => "use",
        FixtureTrigger::OnLook => "look at",
    };
    if query.is_empty() {
        return Ok(CommandOutcome::text(format!("What do you want to {}?", verb)));
    }
    let room = ctx.catalog.require_room(&player.location)?;
    let fixture = match resolver::match_fixture(room, query) {
        Some(fixture) => fixture,
        None => {
            return Ok(CommandOutcome::text(format!(
                "You don't see anything like '{}' to {}.",
                query, verb
            )))
        }
    };
    let response = match fixture_hook_line(ctx, &room.id, fixture, trigger) {
        Some(line) => line,
        None => format!("You {} the {}. Nothing obvious happens.", verb, fixture.name),
    };
    Ok(CommandOutcome::text(response))
}

// ============================================================================
// Items
// ============================================================================

fn carried_weight(catalog: &WorldCatalog, player: &PlayerRecord) -> f32 {
    player
        .inventory
        .iter()
        .map(|id| catalog.item_or_unknown(id).weight)
        .sum()
}

fn handle_inventory(
    ctx: &CommandContext<'_>,
    player: &PlayerRecord,
) -> Result<CommandOutcome, WorldError> {
    let mut lines = Vec::new();
    if player.inventory.is_empty() {
        lines.push("You are not carrying anything.".to_string());
    } else {
        let grouped = textutil::group_counted(&player.inventory, |id, count| {
            counted_item_name(ctx.catalog, id, count)
        });
        lines.push(format!(
            "You are carrying {}.",
            textutil::join_names(&grouped)
        ));
    }
    if !player.currency.is_zero() {
        lines.push(format!("Your purse holds {}.", player.currency));
    }
    Ok(CommandOutcome::text(lines.join("\n")))
}

fn handle_purse(player: &PlayerRecord) -> Result<CommandOutcome, WorldError> {
    if player.currency.is_zero() {
        Ok(CommandOutcome::text("Your purse is empty."))
    } else {
        Ok(CommandOutcome::text(format!("You have {}.", player.currency)))
    }
}

fn handle_take(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
) -> Result<CommandOutcome, WorldError> {
    if target.is_empty() {
        return Ok(CommandOutcome::text("Take what?"));
    }
    let room_id = player.location.clone();
    let room_items = ctx.store.room_items(&room_id)?;
    if room_items.is_empty() {
        return Ok(CommandOutcome::text("There's nothing here to pick up."));
    }

    let mut outcome = CommandOutcome::default();
    if target == "all" || target == "everything" {
        let mut taken: Vec<String> = Vec::new();
        let mut overloaded = false;
        for item_id in room_items {
            let def = ctx.catalog.item_or_unknown(&item_id);
            if carried_weight(ctx.catalog, player) + def.weight > MAX_CARRY_WEIGHT {
                overloaded = true;
                continue;
            }
            // Someone else may have grabbed it since the listing.
            if ctx.store.take_room_item(&room_id, &item_id)? {
                player.inventory.push(item_id.clone());
                player.push_log(&format!("Picked up {}", def.name));
                outcome.events.push(GameEvent::TakeItem { item_id });
                taken.push(def.name);
            }
        }
        outcome.response = if taken.is_empty() {
            if overloaded {
                "You can't pick up much more, you'll fall over!".to_string()
            } else {
                "There's nothing here you can pick up.".to_string()
            }
        } else {
            let mut response = format!("You pick up: {}.", textutil::join_names(&taken));
            if overloaded {
                response.push_str("\nYou can't carry the rest, you'll fall over!");
            }
            response
        };
        return Ok(outcome);
    }

    let candidates: Vec<(&str, String)> = room_items
        .iter()
        .map(|id| (id.as_str(), ctx.catalog.item_name(id)))
        .collect();
    let item_id = match textutil::match_named(target, &candidates) {
        Some(id) => id.to_string(),
        None => {
            return Ok(CommandOutcome::text(format!(
                "You don't see a '{}' here.",
                target
            )))
        }
    };
    let def = ctx.catalog.item_or_unknown(&item_id);
    if carried_weight(ctx.catalog, player) + def.weight > MAX_CARRY_WEIGHT {
        return Ok(CommandOutcome::text(
            "You can't pick up much more, you'll fall over!",
        ));
    }
    if !ctx.store.take_room_item(&room_id, &item_id)? {
        return Ok(CommandOutcome::text(format!(
            "You don't see a '{}' here.",
            target
        )));
    }
    player.inventory.push(item_id.clone());
    player.push_log(&format!("Picked up {}", def.name));
    outcome.events.push(GameEvent::TakeItem { item_id });
    outcome.response = format!("You pick up the {}.", def.name);
    Ok(outcome)
}

fn handle_drop(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
) -> Result<CommandOutcome, WorldError> {
    if target.is_empty() {
        return Ok(CommandOutcome::text("Drop what?"));
    }
    if player.inventory.is_empty() {
        return Ok(CommandOutcome::text("You're not carrying anything."));
    }
    let room_id = player.location.clone();
    let mut outcome = CommandOutcome::default();

    if target == "all" || target == "everything" {
        let carried = player.inventory.clone();
        let mut dropped: Vec<String> = Vec::new();
        for item_id in carried {
            let def = ctx.catalog.item_or_unknown(&item_id);
            if !def.droppable || def.quest_item {
                continue;
            }
            if player.remove_item(&item_id) {
                ctx.store.add_room_item(&room_id, &item_id)?;
                player.push_log(&format!("Dropped {}", def.name));
                outcome.events.push(GameEvent::DropItem { item_id });
                dropped.push(def.name);
            }
        }
        outcome.response = if dropped.is_empty() {
            "You couldn't bring yourself to drop anything.".to_string()
        } else {
            format!("You drop: {}.", textutil::join_names(&dropped))
        };
        return Ok(outcome);
    }

    let candidates: Vec<(&str, String)> = player
        .inventory
        .iter()
        .map(|id| (id.as_str(), ctx.catalog.item_name(id)))
        .collect();
    let item_id = match textutil::match_named(target, &candidates) {
        Some(id) => id.to_string(),
        None => {
            return Ok(CommandOutcome::text(format!(
                "You don't have a '{}'.",
                target
            )))
        }
    };
    let def = ctx.catalog.item_or_unknown(&item_id);
    if !def.droppable || def.quest_item {
        return Ok(CommandOutcome::text(format!(
            "You can't bring yourself to part with the {}.",
            def.name
        )));
    }
    player.remove_item(&item_id);
    ctx.store.add_room_item(&room_id, &item_id)?;
    player.push_log(&format!("Dropped {}", def.name));
    outcome.events.push(GameEvent::DropItem { item_id });
    outcome.response = format!("You drop the {}.", def.name);
    Ok(outcome)
}

fn handle_bury(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
) -> Result<CommandOutcome, WorldError> {
    if target.is_empty() {
        return Ok(CommandOutcome::text("Bury what?"));
    }
    let room_id = player.location.clone();

    // Carried items first, then whatever is lying in the room.
    let carried: Vec<(&str, String)> = player
        .inventory
        .iter()
        .map(|id| (id.as_str(), ctx.catalog.item_name(id)))
        .collect();
    let (item_id, from_inventory) = match textutil::match_named(target, &carried) {
        Some(id) => (id.to_string(), true),
        None => {
            let room_items = ctx.store.room_items(&room_id)?;
            let grounded: Vec<(&str, String)> = room_items
                .iter()
                .map(|id| (id.as_str(), ctx.catalog.item_name(id)))
                .collect();
            match textutil::match_named(target, &grounded) {
                Some(id) => (id.to_string(), false),
                None => {
                    return Ok(CommandOutcome::text(format!(
                        "You don't see a '{}' here to bury.",
                        target
                    )))
                }
            }
        }
    };

    let def = ctx.catalog.item_or_unknown(&item_id);
    if !def.droppable || def.quest_item {
        return Ok(CommandOutcome::text(format!(
            "You can't bring yourself to bury the {}.",
            def.name
        )));
    }
    if from_inventory {
        player.remove_item(&item_id);
    } else if !ctx.store.take_room_item(&room_id, &item_id)? {
        return Ok(CommandOutcome::text(format!(
            "You don't see a '{}' here to bury.",
            target
        )));
    }
    ctx.store
        .bury_item(&room_id, &item_id, &player.username, ctx.now_minutes)?;
    player.push_log(&format!("Buried {}", def.name));
    ctx.hooks.broadcast(
        &room_id,
        &format!("{} digs a hole and buries something in the ground.", player.username),
    );
    Ok(CommandOutcome::text(format!(
        "You dig a small hole and bury the {}, covering it with earth. \
         You can recover it within a day.",
        def.name
    )))
}

fn handle_dig(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: Option<&str>,
) -> Result<CommandOutcome, WorldError> {
    let room_id = player.location.clone();
    let buried = ctx.store.buried_in(&room_id, ctx.now_minutes)?;
    if buried.is_empty() {
        return Ok(CommandOutcome::text("You dig around but turn up nothing."));
    }

    let item_id = match target {
        Some(query) => {
            let candidates: Vec<(&str, String)> = buried
                .iter()
                .map(|b| (b.item_id.as_str(), ctx.catalog.item_name(&b.item_id)))
                .collect();
            match textutil::match_named(query, &candidates) {
                Some(id) => id.to_string(),
                None => {
                    return Ok(CommandOutcome::text(format!(
                        "You don't find any '{}' buried here.",
                        query
                    )))
                }
            }
        }
        None => buried[0].item_id.clone(),
    };

    let def = ctx.catalog.item_or_unknown(&item_id);
    if carried_weight(ctx.catalog, player) + def.weight > MAX_CARRY_WEIGHT {
        return Ok(CommandOutcome::text(
            "You can't pick up much more, you'll fall over!",
        ));
    }
    // The hole may have been emptied, or its day may have run out, since the
    // listing above.
    match ctx.store.dig_up(&room_id, &item_id, ctx.now_minutes)? {
        Some(_) => {
            player.inventory.push(item_id.clone());
            player.push_log(&format!("Dug up {}", def.name));
            ctx.hooks.broadcast(
                &room_id,
                &format!("{} digs something out of the ground.", player.username),
            );
            let mut outcome =
                CommandOutcome::text(format!("You dig around and unearth the {}.", def.name));
            outcome.events.push(GameEvent::TakeItem { item_id });
            Ok(outcome)
        }
        None => Ok(CommandOutcome::text("You dig around but turn up nothing.")),
    }
}

fn handle_give(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    args: &str,
) -> Result<CommandOutcome, WorldError> {
    if args.is_empty() {
        return Ok(CommandOutcome::text("Give what to whom? Try: give <item> to <npc>"));
    }
    let room_id = player.location.clone();
    let present = ctx.store.npcs_in_room(&room_id)?;

    let (item_query, npc_query) = match args.split_once(" to ") {
        Some((item, npc)) => (item.trim().to_string(), npc.trim().to_string()),
        None => {
            let mut words = args.split_whitespace();
            let first = words.next().unwrap_or_default().to_string();
            let rest = words.collect::<Vec<_>>().join(" ");
            if rest.is_empty() {
                // Only the item was named; a lone NPC in the room is an
                // unambiguous recipient.
                if present.len() == 1 {
                    (first, present[0].clone())
                } else {
                    return Ok(CommandOutcome::text(
                        "Give what to whom? Try: give <item> to <npc>",
                    ));
                }
            } else {
                (first, rest)
            }
        }
    };

    let npc = match resolver::match_npc(ctx.catalog, &present, &npc_query) {
        Some(npc) => npc,
        None => {
            return Ok(CommandOutcome::text(
                "There's no one like that here to give things to.",
            ))
        }
    };
    if item_query.is_empty() {
        return Ok(CommandOutcome::text(format!(
            "What do you want to give to {}?",
            npc.name
        )));
    }

    let carried: Vec<(&str, String)> = player
        .inventory
        .iter()
        .map(|id| (id.as_str(), ctx.catalog.item_name(id)))
        .collect();
    let item_id = match textutil::match_named(&item_query, &carried) {
        Some(id) => id.to_string(),
        None => {
            return Ok(CommandOutcome::text(format!(
                "You don't have a '{}' to give.",
                item_query
            )))
        }
    };

    let display = ctx.catalog.item_name(&item_id);
    player.remove_item(&item_id);
    player.push_log(&format!("Gave {} to {}", display, npc.name));

    let mut outcome = CommandOutcome::text(format!(
        "You give the {} to {}.\n{} accepts the {} with a nod.",
        display, npc.name, npc.name, display
    ));
    outcome.events.push(GameEvent::GiveItem {
        item_id,
        npc_id: npc.id.clone(),
        room_id,
    });
    Ok(outcome)
}

// ============================================================================
// Trade
// ============================================================================

/// Merchants present in the player's room, in roster order.
fn merchants_present<'a>(
    ctx: &CommandContext<'a>,
    room_id: &str,
) -> Result<Vec<&'a NpcArchetype>, WorldError> {
    let present = ctx.store.npcs_in_room(room_id)?;
    Ok(present
        .iter()
        .filter_map(|id| ctx.catalog.npc(id))
        .filter(|npc| npc.merchant.is_some())
        .collect())
}

fn handle_buy<R: Rng>(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    args: &str,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    if args.is_empty() {
        return Ok(CommandOutcome::text("Buy what?"));
    }
    let room_id = player.location.clone();
    let merchants = merchants_present(ctx, &room_id)?;

    let (item_part, npc_part) = match args.split_once(" from ") {
        Some((item, npc)) => (item.trim().to_string(), Some(npc.trim().to_string())),
        None => (args.to_string(), None),
    };

    let npc = match npc_part {
        Some(query) => {
            let present = ctx.store.npcs_in_room(&room_id)?;
            match resolver::match_npc(ctx.catalog, &present, &query) {
                Some(npc) if npc.merchant.is_some() => npc,
                _ => return Ok(CommandOutcome::text("There's nobody here to serve you!")),
            }
        }
        None => match merchants.first() {
            Some(npc) => *npc,
            None => return Ok(CommandOutcome::text("There's nobody here to serve you!")),
        },
    };

    // A leading number is a quantity: "buy 3 bread".
    let mut words = item_part.split_whitespace();
    let (quantity, item_query) = match words.next().and_then(|w| w.parse::<u32>().ok()) {
        Some(quantity) => (quantity.max(1), words.collect::<Vec<_>>().join(" ")),
        None => (1, item_part.clone()),
    };
    if item_query.is_empty() {
        return Ok(CommandOutcome::text("Buy what?"));
    }

    let response = economy::buy(
        ctx.catalog,
        ctx.store,
        player,
        npc,
        &item_query,
        quantity,
        rng,
    )?;
    Ok(CommandOutcome::text(response))
}

fn handle_sell(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    args: &str,
) -> Result<CommandOutcome, WorldError> {
    if args.is_empty() {
        return Ok(CommandOutcome::text("Sell what?"));
    }
    let room_id = player.location.clone();
    let merchants = merchants_present(ctx, &room_id)?;

    let (item_part, npc_part) = match args.split_once(" to ") {
        Some((item, npc)) => (item.trim().to_string(), Some(npc.trim().to_string())),
        None => (args.to_string(), None),
    };
    let npc = match npc_part {
        Some(query) => {
            let present = ctx.store.npcs_in_room(&room_id)?;
            match resolver::match_npc(ctx.catalog, &present, &query) {
                Some(npc) if npc.merchant.is_some() => npc,
                _ => return Ok(CommandOutcome::text("There's nobody here to sell to!")),
            }
        }
        None => match merchants.first() {
            Some(npc) => *npc,
            None => return Ok(CommandOutcome::text("There's nobody here to sell to!")),
        },
    };

    let response = economy::sell(ctx.catalog, ctx.store, player, npc, &item_part)?;
    Ok(CommandOutcome::text(response))
}

fn handle_list_wares<R: Rng>(
    ctx: &CommandContext<'_>,
    player: &PlayerRecord,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    let merchants = merchants_present(ctx, &player.location)?;
    let npc = match merchants.first() {
        Some(npc) => *npc,
        None => return Ok(CommandOutcome::text("There's nothing for sale here.")),
    };
    let response = economy::list_wares(ctx.catalog, ctx.store, player, npc, rng)?;
    Ok(CommandOutcome::text(response))
}

// ============================================================================
// Speech
// ============================================================================

async fn handle_say<R: Rng + Send>(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    text: &str,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(CommandOutcome::text("You say nothing."));
    }
    let room = ctx.catalog.require_room(&player.location)?;
    let present = ctx.store.npcs_in_room(&room.id)?;
    let mut outcome = CommandOutcome::default();

    // A merchant in earshot gets first claim on anything that sounds like an
    // order. The exchange stays between buyer and seller.
    for npc_id in &present {
        let npc = match ctx.catalog.npc(npc_id) {
            Some(npc) if npc.merchant.is_some() => npc,
            _ => continue,
        };
        if let Some((item_id, quantity)) = parse_purchase_intent(ctx.catalog, npc, text) {
            economy::politeness_gain(player, &npc.id, text, rng);
            let sale = economy::buy(ctx.catalog, ctx.store, player, npc, &item_id, quantity, rng)?;
            outcome.response = format!("You say: \"{}\"\n{}", text, sale);
            outcome.events.push(GameEvent::SayToNpc {
                npc_id: npc.id.clone(),
                text: text.to_string(),
            });
            outcome.events.push(GameEvent::TalkToNpc {
                npc_id: npc.id.clone(),
            });
            return Ok(outcome);
        }
    }

    if is_charity_plea(text) {
        if let Some(npc) = present
            .iter()
            .filter_map(|id| ctx.catalog.npc(id))
            .find(|npc| npc.merchant.is_some())
        {
            let reply = charity_response(ctx, player, npc)?;
            outcome.response = format!("You say: \"{}\"\n{}", text, reply);
            outcome.events.push(GameEvent::SayToNpc {
                npc_id: npc.id.clone(),
                text: text.to_string(),
            });
            outcome.events.push(GameEvent::TalkToNpc {
                npc_id: npc.id.clone(),
            });
            return Ok(outcome);
        }
    }

    let mut response = format!("You say: \"{}\"", text);
    for npc_id in &present {
        let npc = match ctx.catalog.npc(npc_id) {
            Some(npc) => npc,
            None => continue,
        };
        economy::politeness_gain(player, &npc.id, text, rng);
        if let Some(offer) =
            quest::maybe_offer(ctx.catalog, ctx.store, player, &npc.id, text, ctx.now_minutes)?
        {
            response.push('\n');
            response.push_str(&offer);
        }
        if npc.use_dialogue {
            let request = DialogueRequest {
                npc,
                room,
                player,
                utterance: text,
                recent_log: recent_log_tail(&player.log, ctx.log_tail),
                direct: false,
            };
            let reply =
                dialogue::reply_with_timeout(ctx.dialogue, request, ctx.dialogue_timeout).await;
            if let Some(line) = reply.line {
                response.push('\n');
                response.push_str(&line);
            }
            if let Some(note) = reply.note {
                response.push('\n');
                response.push_str(&format!("[Note: {}]", note));
            }
        }
        outcome.events.push(GameEvent::SayToNpc {
            npc_id: npc.id.clone(),
            text: text.to_string(),
        });
        outcome.events.push(GameEvent::TalkToNpc {
            npc_id: npc.id.clone(),
        });
    }
    ctx.hooks.broadcast(
        &room.id,
        &format!("{} says: \"{}\"", player.username, text),
    );
    outcome.response = response;
    Ok(outcome)
}

async fn handle_talk(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
) -> Result<CommandOutcome, WorldError> {
    let room = ctx.catalog.require_room(&player.location)?;
    let present = ctx.store.npcs_in_room(&room.id)?;

    if target.is_empty() {
        let names: Vec<String> = present
            .iter()
            .filter_map(|id| ctx.catalog.npc(id))
            .map(|npc| npc.name.clone())
            .collect();
        return Ok(CommandOutcome::text(if names.is_empty() {
            "Syntax: talk <npc name>\n(No one is around to talk to.)".to_string()
        } else {
            format!(
                "Talk to whom? You can talk to: {}.\nSyntax: talk <npc name>",
                textutil::join_names(&names)
            )
        }));
    }

    let npc = match resolver::match_npc(ctx.catalog, &present, target) {
        Some(npc) => npc,
        None => {
            return Ok(CommandOutcome::text(
                "There's no one like that to talk to here.",
            ))
        }
    };

    // An NPC shunning the player after an attack refuses conversation until
    // the cooldown lapses.
    if player.npc_cooldowns.get(&npc.id).copied().unwrap_or(0) > ctx.now_minutes {
        return Ok(CommandOutcome::text(format!(
            "{} wants nothing to do with you right now.",
            npc.name
        )));
    }

    let utterance = format!("talk to {}", npc.name);
    let request = DialogueRequest {
        npc,
        room,
        player,
        utterance: &utterance,
        recent_log: recent_log_tail(&player.log, ctx.log_tail),
        direct: true,
    };
    let reply = dialogue::reply_with_timeout(ctx.dialogue, request, ctx.dialogue_timeout).await;

    let mut response = match reply.line {
        Some(line) => line,
        None => format!("{} has nothing to say right now.", npc.name),
    };
    if let Some(note) = reply.note {
        response.push('\n');
        response.push_str(&format!("[Note: {}]", note));
    }

    let mut outcome = CommandOutcome::text(response);
    outcome.events.push(GameEvent::TalkToNpc {
        npc_id: npc.id.clone(),
    });
    Ok(outcome)
}

fn handle_gesture(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    verb: &str,
    target: Option<&str>,
) -> Result<CommandOutcome, WorldError> {
    let emote = match emotes::lookup(verb) {
        Some(emote) => emote,
        None => return Ok(CommandOutcome::text("You flail about uncertainly.")),
    };
    let room_id = player.location.clone();

    let query = match target {
        None => {
            ctx.hooks
                .broadcast(&room_id, &emote.room_line(&player.username));
            return Ok(CommandOutcome::text(emote.self_line()));
        }
        Some(query) => query,
    };

    let present = ctx.store.npcs_in_room(&room_id)?;
    if let Some(npc) = resolver::match_npc(ctx.catalog, &present, query) {
        let mut response = emote.self_target_line(&npc.name);
        if let Some(reaction) = npc::gesture_reaction(ctx.catalog, ctx.store, &npc.id, verb)? {
            response.push('\n');
            response.push_str(&reaction);
        }
        ctx.hooks.broadcast(
            &room_id,
            &emote.room_target_line(&player.username, &npc.name),
        );
        return Ok(CommandOutcome::text(response));
    }

    let others = ctx.others_in_room(&room_id, &player.username);
    if let Some(name) = others.iter().find(|n| n.eq_ignore_ascii_case(query)) {
        ctx.hooks
            .broadcast(&room_id, &emote.room_target_line(&player.username, name));
        return Ok(CommandOutcome::text(emote.self_target_line(name)));
    }

    Ok(CommandOutcome::text(
        "You do not see anyone like that here.",
    ))
}

fn handle_attack(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
) -> Result<CommandOutcome, WorldError> {
    if target.is_empty() {
        return Ok(CommandOutcome::text("Attack whom?"));
    }
    let room_id = player.location.clone();
    let present = ctx.store.npcs_in_room(&room_id)?;
    let npc = match resolver::match_npc(ctx.catalog, &present, target) {
        Some(npc) => npc,
        None => {
            return Ok(CommandOutcome::text(
                "There's no one like that here to attack.",
            ))
        }
    };

    player.push_log(&format!("Attacked {}", npc.name));
    ctx.hooks.broadcast(
        &room_id,
        &format!("{} lunges at {}!", player.username, npc.name),
    );
    let response = match npc::handle_attack(ctx.catalog, ctx.store, player, &npc.id, ctx.now_minutes)? {
        Some(line) => line,
        None => format!("{} takes no notice of your clumsy swing.", npc.name),
    };
    Ok(CommandOutcome::text(response))
}

// ============================================================================
// Quests, time, weather, who
// ============================================================================

fn handle_board(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    number: Option<usize>,
) -> Result<CommandOutcome, WorldError> {
    let room_id = player.location.clone();
    let response = match number {
        None => quest::render_board(ctx.catalog, &room_id),
        Some(number) => {
            quest::board_detail(ctx.catalog, ctx.store, player, &room_id, number, ctx.now_minutes)?
        }
    };
    Ok(CommandOutcome::text(response))
}

fn handle_time(
    ctx: &CommandContext<'_>,
    player: &PlayerRecord,
) -> Result<CommandOutcome, WorldError> {
    let room_name = ctx
        .catalog
        .room(&player.location)
        .map(|room| room.name.clone())
        .unwrap_or_else(|| "this place".to_string());
    Ok(CommandOutcome::text(time_announcement(
        ctx.now_minutes,
        &room_name,
    )))
}

/// A deterministic hour announcement: the same hour always picks the same
/// line, so repeated checks read as the same bell rather than a slot machine.
fn time_announcement(now_minutes: u64, room_name: &str) -> String {
    let time_str = clock::clock_string(now_minutes);
    let hour = clock::minute_of_day(now_minutes) / 60;

    let mut pool = vec![
        format!("The bells of {} toll, marking the hour of {}.", room_name, time_str),
        format!("At the third stroke, it will be {}. More or less.", time_str),
        format!("A watchman somewhere calls out: \"{}, and all's well!\"", time_str),
        format!("You reckon by the light that it is about {}.", time_str),
        format!("Someone's cockerel insists that it is {}.", time_str),
        format!("The shadow on the old sundial puts it near {}.", time_str),
    ];
    match clock::day_period(now_minutes) {
        super::types::DayPeriod::Day => pool.push(format!(
            "Traders call the hour as they pack and unpack: {}.",
            time_str
        )),
        super::types::DayPeriod::Night => pool.push(format!(
            "Far off, a night bell counts the hour: {}.",
            time_str
        )),
    }
    let line = pool[(hour as usize) % pool.len()].clone();

    let (month, day_of_month) = clock::month(now_minutes);
    let season = clock::season(now_minutes);
    let moon = clock::moon_description(clock::moon_phase(now_minutes));
    format!(
        "{}\nIt is day {} of {}, in {}. {}",
        line,
        day_of_month,
        month,
        season.as_str(),
        moon
    )
}

fn handle_weather(
    ctx: &CommandContext<'_>,
    player: &PlayerRecord,
) -> Result<CommandOutcome, WorldError> {
    let state = ctx.store.weather()?;
    let room = ctx.catalog.require_room(&player.location)?;
    let mut lines = vec![weather::describe(&state)];
    lines.push(weather::sky_line(
        &state,
        clock::time_of_day(ctx.now_minutes),
        clock::moon_phase(ctx.now_minutes),
        room.outdoor,
    ));
    if let Some(status) = weather::exposure_line(&player.exposure) {
        lines.push(status);
    }
    Ok(CommandOutcome::text(lines.join("\n")))
}

fn handle_who(ctx: &CommandContext<'_>) -> Result<CommandOutcome, WorldError> {
    let online = ctx.hooks.who();
    if online.is_empty() {
        return Ok(CommandOutcome::text("You don't sense anyone else connected."));
    }
    let mut lines = vec!["Players online:".to_string()];
    for player in online {
        let place = ctx
            .catalog
            .room(&player.location)
            .map(|room| room.name.clone())
            .unwrap_or_else(|| player.location.clone());
        lines.push(format!("  {} - {}", player.username, place));
    }
    Ok(CommandOutcome::text(lines.join("\n")))
}

// ============================================================================
// Admin
// ============================================================================

fn handle_goto<R: Rng>(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
    rng: &mut R,
) -> Result<CommandOutcome, WorldError> {
    if !ctx.is_admin(&player.username) {
        return Ok(CommandOutcome::text("You don't have permission to do that."));
    }
    if target.is_empty() {
        return Ok(CommandOutcome::text("Usage: goto <room id or name>"));
    }
    let room = ctx
        .catalog
        .room(target)
        .or_else(|| {
            ctx.catalog
                .rooms()
                .find(|room| room.name.eq_ignore_ascii_case(target))
        });
    let room = match room {
        Some(room) => room,
        None => return Ok(CommandOutcome::text(format!("No such place: '{}'.", target))),
    };
    if room.id == player.location {
        return Ok(CommandOutcome::text("You are already there."));
    }

    let from = player.location.clone();
    player.location = room.id.clone();
    ctx.hooks
        .broadcast(&from, &format!("{} vanishes in a blink.", player.username));
    ctx.hooks.broadcast(
        &room.id,
        &format!("{} appears out of nowhere.", player.username),
    );

    let mut outcome = CommandOutcome::text(format!(
        "You step sideways through nothing and arrive in {}.\n\n{}",
        textutil::definite(&room.name),
        render_room(ctx, player, rng)?
    ));
    outcome.events.push(GameEvent::EnterRoom {
        room_id: player.location.clone(),
    });
    Ok(outcome)
}

const SET_USAGE: &str = "Usage: set lock|unlock|hide|reveal <room> <direction>\n       \
                         set clear <room> <direction>\n       \
                         set weather <type> [intensity]";

fn handle_set(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    args: &[String],
) -> Result<CommandOutcome, WorldError> {
    if !ctx.is_admin(&player.username) {
        return Ok(CommandOutcome::text("You don't have permission to do that."));
    }
    let subcommand = match args.first() {
        Some(subcommand) => subcommand.as_str(),
        None => return Ok(CommandOutcome::text(SET_USAGE)),
    };

    match subcommand {
        "lock" | "unlock" | "hide" | "reveal" | "clear" => {
            let (room_id, direction_text) = match (args.get(1), args.get(2)) {
                (Some(room), Some(direction)) => (room.as_str(), direction.as_str()),
                _ => return Ok(CommandOutcome::text(SET_USAGE)),
            };
            if ctx.catalog.room(room_id).is_none() {
                return Ok(CommandOutcome::text(format!("No such room: '{}'.", room_id)));
            }
            let direction = match Direction::parse(direction_text) {
                Some(direction) => direction,
                None => {
                    return Ok(CommandOutcome::text(format!(
                        "'{}' is not a direction.",
                        direction_text
                    )))
                }
            };
            let response = match subcommand {
                "lock" => {
                    ctx.store
                        .set_exit_override(room_id, direction, Some(true), None)?;
                    format!("The way {} in {} is now locked.", direction.as_str(), room_id)
                }
                "unlock" => {
                    ctx.store
                        .set_exit_override(room_id, direction, Some(false), None)?;
                    format!("The way {} in {} is now unlocked.", direction.as_str(), room_id)
                }
                "hide" => {
                    ctx.store
                        .set_exit_override(room_id, direction, None, Some(true))?;
                    format!("The way {} in {} is now hidden.", direction.as_str(), room_id)
                }
                "reveal" => {
                    ctx.store
                        .set_exit_override(room_id, direction, None, Some(false))?;
                    format!("The way {} in {} is now revealed.", direction.as_str(), room_id)
                }
                _ => {
                    ctx.store.clear_exit_override(room_id, direction)?;
                    format!(
                        "Overrides cleared for the way {} in {}.",
                        direction.as_str(),
                        room_id
                    )
                }
            };
            Ok(CommandOutcome::text(response))
        }
        "weather" => {
            let weather_type = match args.get(1).and_then(|w| parse_weather_type(w)) {
                Some(weather_type) => weather_type,
                None => {
                    return Ok(CommandOutcome::text(
                        "Usage: set weather <clear|windy|rain|storm|snow|sleet|overcast|heatwave> \
                         [none|light|moderate|heavy]",
                    ))
                }
            };
            // A clear sky has nothing to be intense about.
            let intensity = if weather_type == WeatherType::Clear {
                WeatherIntensity::None
            } else {
                match args.get(2) {
                    Some(word) => match parse_weather_intensity(word) {
                        Some(intensity) => intensity,
                        None => {
                            return Ok(CommandOutcome::text(format!(
                                "'{}' is not an intensity. Use none, light, moderate or heavy.",
                                word
                            )))
                        }
                    },
                    None => WeatherIntensity::Moderate,
                }
            };

            ctx.store.with_weather(|state| {
                state.weather = weather_type;
                state.intensity = intensity;
                state.last_roll_minutes = ctx.now_minutes;
            })?;

            // Word spreads only to rooms under open sky with someone in them.
            let shift = format!(
                "The weather suddenly shifts to {} ({})!",
                weather_type.as_str(),
                intensity.as_str()
            );
            let mut announced: Vec<String> = Vec::new();
            for online in ctx.hooks.who() {
                if announced.contains(&online.location) {
                    continue;
                }
                if let Some(room) = ctx.catalog.room(&online.location) {
                    if room.outdoor {
                        ctx.hooks.broadcast(&room.id, &shift);
                        announced.push(online.location);
                    }
                }
            }
            Ok(CommandOutcome::text(format!(
                "Weather set to {} ({}).",
                weather_type.as_str(),
                intensity.as_str()
            )))
        }
        _ => Ok(CommandOutcome::text(SET_USAGE)),
    }
}

fn parse_weather_type(word: &str) -> Option<WeatherType> {
    match word {
        "clear" => Some(WeatherType::Clear),
        "windy" => Some(WeatherType::Windy),
        "rain" => Some(WeatherType::Rain),
        "storm" => Some(WeatherType::Storm),
        "snow" => Some(WeatherType::Snow),
        "sleet" => Some(WeatherType::Sleet),
        "overcast" => Some(WeatherType::Overcast),
        "heatwave" => Some(WeatherType::Heatwave),
        _ => None,
    }
}

fn parse_weather_intensity(word: &str) -> Option<WeatherIntensity> {
    match word {
        "none" => Some(WeatherIntensity::None),
        "light" => Some(WeatherIntensity::Light),
        "moderate" => Some(WeatherIntensity::Moderate),
        "heavy" => Some(WeatherIntensity::Heavy),
        _ => None,
    }
}

fn handle_stat(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    target: &str,
) -> Result<CommandOutcome, WorldError> {
    if !ctx.is_admin(&player.username) {
        return Ok(CommandOutcome::text("You don't have permission to do that."));
    }
    let query = target.trim();
    if query.is_empty() {
        return Ok(CommandOutcome::text("Usage: stat <target> or stat me"));
    }
    if query == "me" || query.eq_ignore_ascii_case(&player.username) {
        return Ok(CommandOutcome::text(player_stat_block(player)));
    }
    if let Some(archetype) = ctx.catalog.npc(query) {
        let state = ctx.store.npc_state(&archetype.id)?;
        return Ok(CommandOutcome::text(npc_stat_block(archetype, &state)));
    }
    if let Some(def) = ctx.catalog.item(query) {
        return Ok(CommandOutcome::text(item_stat_block(def)));
    }
    if let Some(room) = ctx.catalog.room(query) {
        let items = ctx.store.room_items(&room.id)?;
        let buried = ctx.store.buried_in(&room.id, ctx.now_minutes)?;
        let npcs = ctx.store.npcs_in_room(&room.id)?;
        return Ok(CommandOutcome::text(room_stat_block(
            room, &items, &npcs, buried.len(),
        )));
    }
    Ok(CommandOutcome::text(format!(
        "You see nothing like '{}' to examine.",
        query
    )))
}

fn player_stat_block(player: &PlayerRecord) -> String {
    format!(
        "=== {} ===\nlocation: {}\npurse: {}\nitems: {}\nreputation entries: {}\n\
         active quests: {}\ncompleted quests: {}",
        player.username,
        player.location,
        player.currency,
        player.inventory.len(),
        player.reputation.len(),
        player.quests.len(),
        player.quests_completed()
    )
}

fn npc_stat_block(archetype: &NpcArchetype, state: &NpcState) -> String {
    let mut stock: Vec<String> = state
        .merchant_stock
        .iter()
        .map(|(id, count)| format!("{} x{}", id, count))
        .collect();
    stock.sort();
    let stock_line = if stock.is_empty() {
        "-".to_string()
    } else {
        stock.join(", ")
    };
    format!(
        "=== {} ===\nroom: {}\nhp: {}/{}\nalive: {}\nroute index: {}\nstock: {}",
        archetype.id,
        state.room_id,
        state.hp,
        archetype.stats.max_hp,
        state.alive,
        state.route_index,
        stock_line
    )
}

fn item_stat_block(def: &ItemDef) -> String {
    format!(
        "=== {} ===\nname: {}\nkind: {:?}\nweight: {}\ndroppable: {}\nquest item: {}",
        def.id, def.name, def.kind, def.weight, def.droppable, def.quest_item
    )
}

fn room_stat_block(room: &RoomDef, items: &[String], npcs: &[String], buried: usize) -> String {
    format!(
        "=== {} ===\nname: {}\noutdoor: {}\nitems: {}\nnpcs: {}\nburied items: {}",
        room.id,
        room.name,
        room.outdoor,
        if items.is_empty() { "-".to_string() } else { items.join(", ") },
        if npcs.is_empty() { "-".to_string() } else { npcs.join(", ") },
        buried
    )
}

// ============================================================================
// Spoken intent
// ============================================================================

/// Read a spoken line as a purchase order against one merchant's price list.
/// Returns the matched ware and quantity, or `None` when the line does not
/// read as an order for anything this merchant sells.
pub fn parse_purchase_intent(
    catalog: &WorldCatalog,
    merchant: &NpcArchetype,
    text: &str,
) -> Option<(String, u32)> {
    let lower = text.to_lowercase();
    if PURCHASE_BLOCKERS.iter().any(|b| lower.contains(b)) {
        return None;
    }
    if !PURCHASE_PHRASES.iter().any(|p| lower.contains(p)) {
        return None;
    }
    let prices = &merchant.merchant.as_ref()?.prices;

    // Punctuation is stripped word by word, so "stew," still reads as stew.
    let words: Vec<String> = lower
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|w| !w.is_empty())
        .collect();
    let quantity = words
        .iter()
        .find_map(|w| w.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);

    let mut best: Option<(&str, usize)> = None;
    for entry in prices {
        let name = catalog.item_name(&entry.item_id).to_lowercase();
        let id_spaced = entry.item_id.replace('_', " ");
        let mut ware_words: Vec<&str> = name.split_whitespace().collect();
        ware_words.extend(id_spaced.split_whitespace());
        ware_words.retain(|w| !matches!(*w, "of" | "a" | "an" | "the"));
        let overlap = ware_words
            .iter()
            .filter(|w| words.iter().any(|word| word == *w))
            .count();
        if overlap > 0 && best.map_or(true, |(_, score)| overlap > score) {
            best = Some((entry.item_id.as_str(), overlap));
        }
    }
    best.map(|(id, _)| (id.to_string(), quantity))
}

/// True when a spoken line reads as asking for something for nothing.
pub fn is_charity_plea(text: &str) -> bool {
    let lower = text.to_lowercase();
    CHARITY_PHRASES.iter().any(|p| lower.contains(p))
}

/// A merchant's answer to a plea for charity. Only a genuinely broke player
/// gets anywhere, and only with a generous merchant or real standing; the
/// handout is the cheapest thing still in stock, claimed under the NPC lock.
fn charity_response(
    ctx: &CommandContext<'_>,
    player: &mut PlayerRecord,
    npc: &NpcArchetype,
) -> Result<String, WorldError> {
    let merchant = match &npc.merchant {
        Some(merchant) => merchant,
        None => return Ok(format!("{} has nothing to spare.", npc.name)),
    };
    let cheapest = match merchant.prices.iter().map(|e| e.price).min() {
        Some(price) => price,
        None => return Ok(format!("{} shrugs. \"Nothing to spare today.\"", npc.name)),
    };
    if player.currency.can_afford(&CurrencyAmount::copper(cheapest)) {
        return Ok(format!(
            "{} looks you over. \"You've coin enough. This isn't a charity.\"",
            npc.name
        ));
    }
    let generous = matches!(merchant.temper, MerchantTemper::Generous)
        || player.reputation_with(&npc.id) >= 25;
    if !generous {
        return Ok(format!(
            "{} shakes {} head. \"Times are hard for everyone.\"",
            npc.name, npc.pronoun_possessive()
        ));
    }

    let mut by_price: Vec<(String, i64)> = merchant
        .prices
        .iter()
        .map(|e| (e.item_id.clone(), e.price))
        .collect();
    by_price.sort_by_key(|(_, price)| *price);
    let claimed = ctx.store.with_npc(&npc.id, |state| {
        for (item_id, _) in &by_price {
            let stock = state.merchant_stock.get(item_id).copied().unwrap_or(0);
            if stock > 0 {
                state.merchant_stock.insert(item_id.clone(), stock - 1);
                return Some(item_id.clone());
            }
        }
        None
    })?;

    match claimed {
        Some(item_id) => {
            let display = ctx.catalog.item_name(&item_id);
            player.inventory.push(item_id);
            player.push_log(&format!("Received {} as charity", display));
            Ok(format!(
                "{} studies you for a moment, then hands over {}. \
                 \"On the house. Don't make a habit of it.\"",
                npc.name,
                textutil::with_article(&display)
            ))
        }
        None => Ok(format!(
            "{} turns out an empty till. \"Nothing left to give, friend.\"",
            npc.name
        )),
    }
}

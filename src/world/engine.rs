//! The session facade. Callers hand in one line of player text (or an idle
//! poll) and get back the lines to print; everything else, from weather
//! re-rolls to quest expiry to snapshot writes, happens on the way through.
//!
//! Every entry point advances the world to the current instant before doing
//! its own work, so a world with no traffic simply stays frozen until the
//! next player shows up. Catch-up work is claimed under the store's record
//! locks, which keeps concurrent sessions from double-applying a weather
//! roll or replaying the same NPC patrol hop.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::Rng;

use crate::config::Config;
use crate::logutil::escape_log;

use super::ambiance;
use super::catalog::WorldCatalog;
use super::clock::{self, WorldClock};
use super::commands::{self, CommandContext, SessionHooks};
use super::dialogue::DialogueProvider;
use super::errors::WorldError;
use super::npc;
use super::quest;
use super::snapshot::SnapshotStore;
use super::store::WorldStore;
use super::types::{DayPeriod, PlayerRecord};
use super::weather;

/// World minutes between weather re-rolls.
pub const WEATHER_ROLL_INTERVAL_MINUTES: u64 = 30;

const DAWN_LINE: &str = "Another day has dawned.";
const DUSK_LINE: &str = "The cover of night sweeps over the land.";

/// What advancing the world produced for the acting player: the fixed
/// timestamp the rest of the invocation runs at, plus any lines that
/// should precede the command reply.
struct Prelude {
    now_minutes: u64,
    lines: Vec<String>,
}

/// One world, fully assembled: catalog, live state, clock, snapshots and
/// the dialogue provider. Sessions share a single instance and call
/// [`GameEngine::execute`] per command and [`GameEngine::poll`] while idle.
pub struct GameEngine {
    catalog: WorldCatalog,
    store: WorldStore,
    clock: WorldClock,
    snapshots: SnapshotStore,
    dialogue: Box<dyn DialogueProvider>,
    admins: Vec<String>,
    dialogue_timeout: Duration,
    log_tail: usize,
    autosave_interval: Duration,
    last_autosave: Mutex<DateTime<Utc>>,
}

impl GameEngine {
    /// Assemble a world from configuration: the packaged village unless
    /// `world.world_dir` points at a TOML world, restored from the latest
    /// snapshot when one exists.
    pub async fn new(config: &Config, dialogue: Box<dyn DialogueProvider>) -> Result<Self, WorldError> {
        let catalog = match &config.world.world_dir {
            Some(dir) => WorldCatalog::load(Path::new(dir))?,
            None => WorldCatalog::builtin()?,
        };
        Self::with_catalog(catalog, config, dialogue).await
    }

    /// Assemble a world around an already-built catalog.
    pub async fn with_catalog(
        catalog: WorldCatalog,
        config: &Config,
        dialogue: Box<dyn DialogueProvider>,
    ) -> Result<Self, WorldError> {
        let store = WorldStore::new(&catalog);
        let snapshots = SnapshotStore::open(config.storage.data_dir.as_str()).await?;
        // A saved world keeps its original epoch; the configured one only
        // seeds brand-new worlds.
        let epoch = snapshots
            .restore_world(&store)
            .await?
            .unwrap_or(config.world.epoch);
        let clock = WorldClock::new(epoch);
        info!(
            "world '{}' is live, day {} on the calendar",
            catalog.name(),
            clock::day_of_year(clock.now_minutes()) + 1
        );
        Ok(Self {
            catalog,
            store,
            clock,
            snapshots,
            dialogue,
            admins: config.world.admins.clone(),
            dialogue_timeout: Duration::from_millis(config.dialogue.timeout_ms),
            log_tail: config.dialogue.log_tail,
            autosave_interval: Duration::from_secs(config.storage.autosave_seconds),
            last_autosave: Mutex::new(Utc::now()),
        })
    }

    pub fn catalog(&self) -> &WorldCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Fetch a returning player's record, or start a fresh character at the
    /// spawn room. A record written by a newer build is an error rather than
    /// something to silently overwrite.
    pub async fn login(&self, username: &str) -> Result<PlayerRecord, WorldError> {
        match self.snapshots.load_player(username).await? {
            Some(record) => Ok(record),
            None => Ok(PlayerRecord::new_unboarded(
                username,
                self.catalog.spawn_room(),
            )),
        }
    }

    pub async fn save_player(&self, player: &PlayerRecord) -> Result<(), WorldError> {
        self.snapshots.save_player(player).await
    }

    /// Write the world snapshot now, regardless of the autosave clock.
    pub async fn save_world(&self) -> Result<(), WorldError> {
        self.snapshots.save_world(&self.store, self.clock.epoch()).await
    }

    /// Run one line of player input and return everything to print: lines
    /// the world produced while catching up, then the command's reply, then
    /// any quest notifications the command triggered.
    pub async fn execute<R: Rng + Send>(
        &self,
        player: &mut PlayerRecord,
        raw: &str,
        hooks: &dyn SessionHooks,
        rng: &mut R,
    ) -> Result<String, WorldError> {
        self.execute_at(Utc::now(), player, raw, hooks, rng).await
    }

    /// [`GameEngine::execute`] at an explicit wall-clock instant.
    pub async fn execute_at<R: Rng + Send>(
        &self,
        wall_now: DateTime<Utc>,
        player: &mut PlayerRecord,
        raw: &str,
        hooks: &dyn SessionHooks,
        rng: &mut R,
    ) -> Result<String, WorldError> {
        debug!("command from {}: {}", player.username, escape_log(raw));
        let prelude = self.advance(wall_now, player, hooks, false, rng)?;
        let ctx = CommandContext {
            catalog: &self.catalog,
            store: &self.store,
            now_minutes: prelude.now_minutes,
            wall_now,
            hooks,
            dialogue: self.dialogue.as_ref(),
            dialogue_timeout: self.dialogue_timeout,
            log_tail: self.log_tail,
            admins: &self.admins,
        };
        let outcome = commands::dispatch(&ctx, player, raw, rng).await?;

        let mut parts = prelude.lines;
        if !outcome.response.is_empty() {
            parts.push(outcome.response);
        }
        for event in &outcome.events {
            parts.extend(quest::handle_event(
                &self.catalog,
                &self.store,
                player,
                event,
                prelude.now_minutes,
            )?);
        }
        self.maybe_autosave(wall_now).await;
        Ok(parts.join("\n"))
    }

    /// Advance the world for an idle player and return any ambient lines
    /// that came due: weather turns, daybreak and nightfall, NPC comings and
    /// goings, room flavor, idle chatter.
    pub async fn poll<R: Rng + Send>(
        &self,
        player: &mut PlayerRecord,
        hooks: &dyn SessionHooks,
        rng: &mut R,
    ) -> Result<Vec<String>, WorldError> {
        self.poll_at(Utc::now(), player, hooks, rng).await
    }

    /// [`GameEngine::poll`] at an explicit wall-clock instant.
    pub async fn poll_at<R: Rng + Send>(
        &self,
        wall_now: DateTime<Utc>,
        player: &mut PlayerRecord,
        hooks: &dyn SessionHooks,
        rng: &mut R,
    ) -> Result<Vec<String>, WorldError> {
        let prelude = self.advance(wall_now, player, hooks, true, rng)?;
        self.maybe_autosave(wall_now).await;
        Ok(prelude.lines)
    }

    /// Catch the world up to `wall_now` on behalf of one player.
    ///
    /// One-shot transitions (weather turns, day and night edges, NPC patrol
    /// hops, quest expiries) are claimed here on every call, because whoever
    /// claims them must also deliver them. The ambient flavor cadence is
    /// only touched when `deliver_flavor` is set; command invocations leave
    /// those markers alone so the lines land on the next poll instead of
    /// being wedged into a command reply.
    fn advance<R: Rng>(
        &self,
        wall_now: DateTime<Utc>,
        player: &mut PlayerRecord,
        hooks: &dyn SessionHooks,
        deliver_flavor: bool,
        rng: &mut R,
    ) -> Result<Prelude, WorldError> {
        let now = self.clock.minutes_at(wall_now);
        let season = clock::season(now);
        let time = clock::time_of_day(now);
        let period_now = clock::day_period(now);

        // A stale record can point at a room the current world no longer
        // has, e.g. after a world_dir edit. Send the player home.
        if self.catalog.room(&player.location).is_none() {
            warn!(
                "player {} was in unknown room '{}', returning to spawn",
                player.username, player.location
            );
            player.location = self.catalog.spawn_room().to_string();
        }
        let room = self.catalog.require_room(&player.location)?;

        // Claim the weather re-roll and the day/night edge in one pass
        // under the weather lock. The stamp moves even when the roll keeps
        // the current weather, so the window stays fixed-width.
        let (shift_message, period_edge) = self.store.with_weather(|state| {
            let mut message = None;
            if now.saturating_sub(state.last_roll_minutes) >= WEATHER_ROLL_INTERVAL_MINUTES {
                state.last_roll_minutes = now;
                if let Some(shift) =
                    weather::roll_transition(state.weather, state.intensity, season, time, rng)
                {
                    state.weather = shift.weather;
                    state.intensity = shift.intensity;
                    state.temperature = shift.temperature;
                    message = shift.message;
                }
            }
            let edge = if state.period != period_now {
                state.period = period_now;
                Some(period_now)
            } else {
                None
            };
            (message, edge)
        })?;

        let mut lines = Vec::new();

        if let Some(period) = period_edge {
            let line = match period {
                DayPeriod::Day => DAWN_LINE,
                DayPeriod::Night => DUSK_LINE,
            };
            let mut announced: Vec<String> = Vec::new();
            for online in hooks.who() {
                if announced.contains(&online.location) {
                    continue;
                }
                hooks.broadcast(&online.location, line);
                announced.push(online.location);
            }
            lines.push(line.to_string());
        }

        if let Some(message) = shift_message {
            // Weather is only felt under the open sky.
            let mut announced: Vec<String> = Vec::new();
            for online in hooks.who() {
                if announced.contains(&online.location) {
                    continue;
                }
                let outdoor = self
                    .catalog
                    .room(&online.location)
                    .map(|r| r.outdoor)
                    .unwrap_or(false);
                if outdoor {
                    hooks.broadcast(&online.location, &message);
                }
                announced.push(online.location);
            }
            if room.outdoor {
                lines.push(message);
            }
        }

        let weather_now = self.store.weather()?;
        weather::update_exposure(&mut player.exposure, room.outdoor, &weather_now, season, wall_now);
        npc::update_exposure_all(&self.catalog, &self.store, &weather_now, season, wall_now)?;

        for hop in npc::advance_routes(&self.catalog, &self.store, now)? {
            let leave = npc::leave_line(&hop.npc_name, hop.direction);
            let arrive = npc::arrive_line(&hop.npc_name, hop.direction);
            hooks.broadcast(&hop.from_room, &leave);
            hooks.broadcast(&hop.to_room, &arrive);
            if hop.from_room == player.location {
                lines.push(leave);
            } else if hop.to_room == player.location {
                lines.push(arrive);
            }
        }
        npc::restock_merchants(&self.catalog, &self.store, now)?;

        lines.extend(quest::tick(&self.catalog, &self.store, player, now)?);

        if deliver_flavor {
            let (due, paid_to) = ambiance::ambient_accrual(player.ambient_paid_to, now);
            player.ambient_paid_to = paid_to;
            for _ in 0..due {
                if let Some(line) = ambiance::room_line(room, time, &weather_now, rng) {
                    lines.push(line);
                }
            }

            let present = self.store.npcs_in_room(&room.id)?;
            if !present.is_empty() {
                let interval = ambiance::idle_interval_for(present.len());
                let pulses = self.store.claim_idle_pulses(&room.id, now, interval)?;
                for line in
                    npc::idle_lines(&self.catalog, &self.store, room, &weather_now, pulses, rng)?
                {
                    hooks.broadcast(&room.id, &line);
                    lines.push(line);
                }
            }
        }

        Ok(Prelude {
            now_minutes: now,
            lines,
        })
    }

    /// Write the world snapshot when the autosave interval has elapsed.
    /// Failures are logged and swallowed; play continues on the in-memory
    /// state and the next interval tries again.
    async fn maybe_autosave(&self, wall_now: DateTime<Utc>) {
        let due = {
            let mut last = match self.last_autosave.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("autosave clock poisoned, skipping");
                    return;
                }
            };
            let elapsed = wall_now
                .signed_duration_since(*last)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if elapsed >= self.autosave_interval {
                *last = wall_now;
                true
            } else {
                false
            }
        };
        if due {
            if let Err(err) = self.save_world().await {
                warn!("world autosave failed: {}", err);
            }
        }
    }
}

//! # Hollowvale - simulation core for a persistent multiplayer text world
//!
//! Hollowvale is the shared-world engine behind a small multiplayer text
//! adventure: one world whose rooms, inhabitants, weather, and quests keep
//! moving according to real elapsed time while many players poke at it
//! concurrently with short text commands.
//!
//! ## Features
//!
//! - **Lazy world time**: the in-world clock is derived from wall-clock time
//!   on every call. There is no tick loop and no background scheduler, so the
//!   world survives process restarts and uneven request arrival without drift.
//! - **Probabilistic weather**: a two-stage transition machine (intensity
//!   first, then type) over season-weighted adjacency tables, with per-actor
//!   wetness/cold/heat exposure tracking.
//! - **Event-driven quests**: stage graphs of typed objectives advanced by
//!   game events, with shared/exclusive availability policies and timeouts.
//! - **Registry-based commands**: verbs resolve through a handler registry
//!   with aliases, falling back to a broad built-in dispatch.
//! - **Fine-grained locking**: the world state store locks per logical record
//!   (room, NPC, quest roster), never globally.
//! - **Tolerant persistence**: point-in-time JSON snapshots whose loaders
//!   backfill missing fields instead of failing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hollowvale::config::Config;
//! use hollowvale::world::{GameEngine, NullHooks, ScriptedDialogue};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let engine = GameEngine::new(&config, Box::new(ScriptedDialogue)).await?;
//!
//!     let mut player = engine.login("mira").await?;
//!     let mut rng = StdRng::from_entropy();
//!     let reply = engine.execute(&mut player, "look", &NullHooks, &mut rng).await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`world`] - The simulation core: catalog, clock, weather, store, NPC,
//!   quest, and command engines plus the session-facing facade
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Log sanitization helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   GameEngine     │ ← advance world to now, run command, append log
//! └──────────────────┘
//!          │
//! ┌──────────────────┐
//! │  Command Engine  │ ← parse, resolve targets, mutate, emit events
//! └──────────────────┘
//!          │
//! ┌──────────────────┐
//! │   WorldStore     │ ← per-record locked shared state
//! └──────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod world;

//! The simulated world: an accelerated calendar, weather, a village of NPCs
//! with routines and stock, quests, and the command engine that turns player
//! text into effects on all of it. [`GameEngine`] is the front door; session
//! layers hold one engine and call it per command and per idle poll.

pub mod ambiance;
pub mod catalog;
pub mod clock;
pub mod commands;
pub mod dialogue;
pub mod economy;
pub mod emotes;
pub mod engine;
pub mod errors;
pub mod npc;
pub mod onboarding;
pub mod quest;
pub mod resolver;
pub mod seed;
pub mod snapshot;
pub mod store;
pub mod textutil;
pub mod types;
pub mod weather;

pub use catalog::WorldCatalog;
pub use clock::WorldClock;
pub use commands::{
    dispatch, CommandContext, CommandOutcome, NullHooks, OnlinePlayer, SessionHooks,
};
pub use dialogue::{
    DialogueOutcome, DialogueProvider, DialogueRequest, ScriptedDialogue, DIALOGUE_TIMEOUT,
};
pub use engine::{GameEngine, WEATHER_ROLL_INTERVAL_MINUTES};
pub use errors::WorldError;
pub use snapshot::{SnapshotStore, WorldSnapshot, WORLD_FILE};
pub use store::WorldStore;
pub use types::*;

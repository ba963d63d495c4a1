//! Pluggable NPC dialogue generation.
//!
//! The engine never talks to a language model directly. It hands a
//! [`DialogueRequest`] to whatever [`DialogueProvider`] it was constructed
//! with and waits a bounded time for the outcome. "No line" is a perfectly
//! good outcome; the command response simply goes out without NPC flavor.
//! The built-in [`ScriptedDialogue`] provider is fully deterministic and is
//! what the test suite runs against.

use std::time::Duration;

use async_trait::async_trait;

use super::types::{LogEntry, NpcArchetype, PlayerRecord, RoomDef};

/// Default bound on how long a provider may take before the engine gives up
/// on it. Configurable per deployment.
pub const DIALOGUE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Everything a provider may draw on for one reply. The addressed NPC is
/// always explicit; providers never guess the speaker from session state.
pub struct DialogueRequest<'a> {
    pub npc: &'a NpcArchetype,
    pub room: &'a RoomDef,
    pub player: &'a PlayerRecord,
    /// The raw player text that triggered this reply.
    pub utterance: &'a str,
    /// Tail of the player's event log, oldest first.
    pub recent_log: &'a [LogEntry],
    /// True for a direct `talk` command, false for overheard room speech.
    pub direct: bool,
}

/// A generated line, an explicit none, and an optional error note the
/// command engine appends as `[Note: ...]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueOutcome {
    pub line: Option<String>,
    pub note: Option<String>,
}

impl DialogueOutcome {
    pub fn line(text: String) -> Self {
        Self {
            line: Some(text),
            note: None,
        }
    }

    pub fn silence() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait DialogueProvider: Send + Sync {
    async fn reply(&self, request: DialogueRequest<'_>) -> DialogueOutcome;
}

/// Run a provider under a timeout. A provider that overruns is treated as
/// silence with a note, never as an error.
pub async fn reply_with_timeout(
    provider: &dyn DialogueProvider,
    request: DialogueRequest<'_>,
    timeout: Duration,
) -> DialogueOutcome {
    match tokio::time::timeout(timeout, provider.reply(request)).await {
        Ok(outcome) => outcome,
        Err(_) => DialogueOutcome {
            line: None,
            note: Some("The reply took too long and was dropped.".to_string()),
        },
    }
}

/// Deterministic dialogue keyed off the NPC's authored line and personality
/// text. No external calls, no randomness.
pub struct ScriptedDialogue;

#[async_trait]
impl DialogueProvider for ScriptedDialogue {
    async fn reply(&self, request: DialogueRequest<'_>) -> DialogueOutcome {
        let npc = request.npc;
        if let Some(line) = &npc.scripted_line {
            return DialogueOutcome::line(format!("{} says: \"{}\"", npc.name, line));
        }
        let reputation = request.player.reputation_with(&npc.id);
        let username = request.player.username.as_str();
        let personality = npc.personality.to_lowercase();

        let line = if request.direct {
            greeting(&npc.name, &personality, username, reputation)
        } else {
            overheard(&npc.name, &personality, reputation, username)
        };
        DialogueOutcome::line(line)
    }
}

fn greeting(name: &str, personality: &str, username: &str, reputation: i32) -> String {
    if personality.contains("gruff") {
        if reputation > 0 {
            format!(
                "{} gives you a knowing look. 'Back again, {}? What is it this time?'",
                name, username
            )
        } else if reputation < 0 {
            format!("{} looks at you. 'You again. What do you want?'", name)
        } else {
            format!(
                "{} looks at you with a gruff expression. 'Well, {}, what do you need?'",
                name, username
            )
        }
    } else if personality.contains("kind") {
        if reputation > 0 {
            format!(
                "{} greets you warmly. 'Welcome back, {}! Good to see you again.'",
                name, username
            )
        } else {
            format!(
                "{} smiles warmly. 'Hello, {}! How can I help you today?'",
                name, username
            )
        }
    } else {
        format!(
            "{} looks at you. 'Greetings, {}. What brings you here?'",
            name, username
        )
    }
}

fn overheard(name: &str, personality: &str, reputation: i32, username: &str) -> String {
    if personality.contains("gruff") {
        if reputation > 0 {
            format!(
                "{} looks up from their work. 'I heard that. Makes sense, I suppose.'",
                name
            )
        } else if reputation < 0 {
            format!("{} glares at you. 'I don't appreciate that kind of talk.'", name)
        } else {
            format!("{} glances over. 'Hmm, interesting.'", name)
        }
    } else if personality.contains("kind") {
        if reputation > 0 {
            format!("{} smiles. 'I agree, {}. That's a good point.'", name, username)
        } else {
            format!("{} nods thoughtfully. 'I see what you mean.'", name)
        }
    } else {
        format!("{} looks in your direction, considering your words.", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::RoomDef;

    fn request<'a>(
        npc: &'a NpcArchetype,
        room: &'a RoomDef,
        player: &'a PlayerRecord,
        direct: bool,
    ) -> DialogueRequest<'a> {
        DialogueRequest {
            npc,
            room,
            player,
            utterance: "hello",
            recent_log: &[],
            direct,
        }
    }

    #[tokio::test]
    async fn authored_lines_win_over_personality() {
        let npc = NpcArchetype::new("bard", "Bram", "A bard.", "inn")
            .with_scripted_line("Songs cost a copper, stories are free.");
        let room = RoomDef::new("inn", "Inn", "An inn.");
        let player = PlayerRecord::new("mira", "inn");

        let outcome = ScriptedDialogue.reply(request(&npc, &room, &player, true)).await;
        assert_eq!(
            outcome.line.unwrap(),
            "Bram says: \"Songs cost a copper, stories are free.\""
        );
        assert!(outcome.note.is_none());
    }

    #[tokio::test]
    async fn greetings_track_personality_and_standing() {
        let npc = NpcArchetype::new("smith", "Hett", "A smith.", "forge")
            .with_personality("gruff, takes pride in the work");
        let room = RoomDef::new("forge", "Forge", "A forge.");
        let mut player = PlayerRecord::new("mira", "forge");

        let cold = ScriptedDialogue.reply(request(&npc, &room, &player, true)).await;
        assert!(cold.line.unwrap().contains("gruff expression"));

        player.adjust_reputation("smith", 10);
        let warm = ScriptedDialogue.reply(request(&npc, &room, &player, true)).await;
        assert!(warm.line.unwrap().contains("Back again, mira?"));

        let aside = ScriptedDialogue.reply(request(&npc, &room, &player, false)).await;
        assert!(aside.line.unwrap().contains("I heard that"));
    }

    #[tokio::test]
    async fn slow_providers_degrade_to_a_note() {
        struct Sleeper;
        #[async_trait]
        impl DialogueProvider for Sleeper {
            async fn reply(&self, _request: DialogueRequest<'_>) -> DialogueOutcome {
                tokio::time::sleep(Duration::from_secs(60)).await;
                DialogueOutcome::line("too late".to_string())
            }
        }

        let npc = NpcArchetype::new("bard", "Bram", "A bard.", "inn");
        let room = RoomDef::new("inn", "Inn", "An inn.");
        let player = PlayerRecord::new("mira", "inn");

        // Paused time fast-forwards to the earlier of the sleep and the
        // timeout, so the timeout fires without a real 1.5s wait.
        tokio::time::pause();
        let outcome =
            reply_with_timeout(&Sleeper, request(&npc, &room, &player, true), DIALOGUE_TIMEOUT)
                .await;
        assert!(outcome.line.is_none());
        assert!(outcome.note.unwrap().contains("took too long"));
    }
}

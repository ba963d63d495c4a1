//! Character creation. A brand-new player is walked through a short series
//! of prompts before any world command is accepted: name, race, gender, a
//! ten-point stat spread, and a backstory. The current step lives on the
//! player record, so a half-finished character survives a disconnect and
//! resumes where it left off.

use chrono::Utc;

use super::catalog::WorldCatalog;
use super::types::{CharStats, OnboardingState, OnboardingStep, PlayerRecord};

/// Every character spends exactly this many points across the five stats.
pub const TOTAL_STAT_POINTS: u32 = 10;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 20;

pub const RACES: &[(&str, &str)] = &[
    ("human", "Found in every corner of the realm, adaptable and restless."),
    ("elf", "Long-lived and deliberate, with an ear for the old magics."),
    ("dwarf", "Stout and stubborn, happiest with stone overhead."),
    ("halfling", "Small of stature, large of appetite, luckier than they deserve."),
    ("fae-touched", "Marked by the fair folk. Strange things happen nearby."),
    ("outlander", "From beyond the mapped lands, carrying unfamiliar customs."),
];

pub const GENDERS: &[&str] = &["male", "female", "nonbinary", "other"];

pub const BACKSTORIES: &[(&str, &str)] = &[
    ("scarred_past", "You carry marks from a fight you rarely speak of."),
    ("forgotten_lineage", "Your family name means something, somewhere. You mean to find out what."),
    ("broken_oath", "You swore something once, and broke it. The weight has not lifted."),
    ("hopeful_spark", "You left home with nothing but the conviction that things can be better."),
    ("quiet_mystery", "You do not talk about before. People have stopped asking."),
];

/// The prompt for whichever step the player is on, shown on first contact
/// and re-shown after a blank line.
pub fn step_prompt(catalog: &WorldCatalog, step: OnboardingStep) -> String {
    match step {
        OnboardingStep::ChooseName => format!(
            "A new face at the gates of {}. What name will you be known by? \
             (2-20 characters)",
            catalog.name()
        ),
        OnboardingStep::ChooseRace => {
            let mut lines = vec!["And what blood runs in your veins?".to_string()];
            for (key, blurb) in RACES {
                lines.push(format!("  {} - {}", key, blurb));
            }
            lines.push("Choose a race.".to_string());
            lines.join("\n")
        }
        OnboardingStep::ChooseGender => format!(
            "How should the folk of {} speak of you?\nOptions: {}.",
            catalog.name(),
            GENDERS.join(", ")
        ),
        OnboardingStep::AllocateStats => format!(
            "Now, your measure. Divide exactly {} points among five talents:\n  \
             str (strength), agi (agility), wis (wisdom), wil (willpower), luck\n\
             Answer like: str 3, agi 2, wis 2, wil 2, luck 1",
            TOTAL_STAT_POINTS
        ),
        OnboardingStep::Backstory => {
            let mut lines = vec!["Last of all: what brought you here?".to_string()];
            for (key, blurb) in BACKSTORIES {
                lines.push(format!("  {} - {}", key, blurb));
            }
            lines.push("  custom - tell your own tale".to_string());
            lines.push("Choose one.".to_string());
            lines.join("\n")
        }
        OnboardingStep::CustomBackstory => {
            "Then tell it. A sentence or two will do.".to_string()
        }
    }
}

/// Feed one line of player input into the creation flow. Returns the text to
/// show the player; on the final step this completes the record and moves the
/// player to the spawn room.
pub fn advance(catalog: &WorldCatalog, player: &mut PlayerRecord, input: &str) -> String {
    let step = match player.onboarding {
        OnboardingState::InProgress { step } => step,
        OnboardingState::Complete { .. } => return String::new(),
    };
    let text = input.trim();
    if text.is_empty() {
        return step_prompt(catalog, step);
    }

    match step {
        OnboardingStep::ChooseName => {
            let length = text.chars().count();
            if !(NAME_MIN..=NAME_MAX).contains(&length) {
                return format!(
                    "That name won't do. Choose a name between {} and {} characters.",
                    NAME_MIN, NAME_MAX
                );
            }
            player.character.name = text.to_string();
            move_to(player, OnboardingStep::ChooseRace);
            format!(
                "Well met, {}.\n\n{}",
                text,
                step_prompt(catalog, OnboardingStep::ChooseRace)
            )
        }
        OnboardingStep::ChooseRace => {
            let choice = text.to_lowercase().replace(' ', "-");
            match RACES.iter().find(|(key, _)| *key == choice) {
                Some((key, _)) => {
                    player.character.race = key.to_string();
                    move_to(player, OnboardingStep::ChooseGender);
                    step_prompt(catalog, OnboardingStep::ChooseGender)
                }
                None => format!(
                    "That is no folk known here. Choose one of: {}.",
                    RACES
                        .iter()
                        .map(|(key, _)| *key)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }
        OnboardingStep::ChooseGender => {
            let choice = text.to_lowercase();
            if GENDERS.contains(&choice.as_str()) {
                player.character.gender = choice;
                move_to(player, OnboardingStep::AllocateStats);
                step_prompt(catalog, OnboardingStep::AllocateStats)
            } else {
                format!("Options: {}.", GENDERS.join(", "))
            }
        }
        OnboardingStep::AllocateStats => match parse_stats(text) {
            Ok(stats) => {
                player.character.stats = stats;
                move_to(player, OnboardingStep::Backstory);
                step_prompt(catalog, OnboardingStep::Backstory)
            }
            Err(message) => message,
        },
        OnboardingStep::Backstory => {
            let choice = text.to_lowercase().replace([' ', '-'], "_");
            if choice == "custom" {
                move_to(player, OnboardingStep::CustomBackstory);
                return step_prompt(catalog, OnboardingStep::CustomBackstory);
            }
            match BACKSTORIES.iter().find(|(key, _)| *key == choice) {
                Some((_, blurb)) => {
                    player.character.backstory = Some(blurb.to_string());
                    finish(catalog, player)
                }
                None => format!(
                    "Choose one of: {}, or 'custom' to tell your own.",
                    BACKSTORIES
                        .iter()
                        .map(|(key, _)| *key)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }
        OnboardingStep::CustomBackstory => {
            if text.chars().count() <= 5 {
                return "Please provide a brief backstory (at least a few words).".to_string();
            }
            player.character.backstory = Some(text.to_string());
            finish(catalog, player)
        }
    }
}

fn move_to(player: &mut PlayerRecord, step: OnboardingStep) {
    player.onboarding = OnboardingState::InProgress { step };
}

fn finish(catalog: &WorldCatalog, player: &mut PlayerRecord) -> String {
    player.onboarding = OnboardingState::Complete {
        completed_at: Utc::now(),
    };
    player.location = catalog.spawn_room().to_string();
    player.push_log("completed character creation");
    format!(
        "The gate swings open.\n\nWelcome to {}, {}.",
        catalog.name(),
        player.character.name
    )
}

/// Parse a comma-separated stat allocation such as
/// `str 3, agi 2, wis 2, wil 2, luck 1`. Colons and equals signs are
/// tolerated; unlisted stats stay at zero; the total must land exactly on
/// [`TOTAL_STAT_POINTS`].
fn parse_stats(input: &str) -> Result<CharStats, String> {
    let mut stats = CharStats::default();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let cleaned = part.replace([':', '='], " ");
        let mut words = cleaned.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let value: u8 = match words.next().and_then(|v| v.parse().ok()) {
            Some(value) => value,
            None => {
                return Err(format!(
                    "Couldn't read '{}'. Answer like: str 3, agi 2, wis 2, wil 2, luck 1",
                    part
                ))
            }
        };
        match name.as_str() {
            "str" | "strength" => stats.strength = value,
            "agi" | "agility" => stats.agility = value,
            "wis" | "wisdom" => stats.wisdom = value,
            "wil" | "willpower" => stats.willpower = value,
            "luck" => stats.luck = value,
            other => {
                return Err(format!(
                    "Unknown stat '{}'. Use: str, agi, wis, wil, luck.",
                    other
                ))
            }
        }
    }
    let total = stats.total();
    if total != TOTAL_STAT_POINTS {
        return Err(format!(
            "Your stats must total exactly {} points. You allocated {} points. \
             Please try again.",
            TOTAL_STAT_POINTS, total
        ));
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_player() -> PlayerRecord {
        PlayerRecord::new_unboarded("wanderer", "nowhere")
    }

    fn catalog() -> WorldCatalog {
        WorldCatalog::builtin().unwrap()
    }

    #[test]
    fn full_walkthrough_completes_and_moves_to_spawn() {
        let catalog = catalog();
        let mut player = fresh_player();

        let reply = advance(&catalog, &mut player, "Rowan");
        assert!(reply.contains("Well met, Rowan"));
        advance(&catalog, &mut player, "elf");
        advance(&catalog, &mut player, "nonbinary");
        advance(&catalog, &mut player, "str 3, agi 2, wis 2, wil 2, luck 1");
        let reply = advance(&catalog, &mut player, "hopeful_spark");

        assert!(player.onboarded());
        assert!(reply.contains("Welcome to Hollowvale, Rowan"));
        assert_eq!(player.location, "town_square");
        assert_eq!(player.character.race, "elf");
        assert_eq!(player.character.gender, "nonbinary");
        assert_eq!(player.character.stats.strength, 3);
        assert_eq!(player.character.stats.total(), TOTAL_STAT_POINTS);
        assert!(player
            .character
            .backstory
            .as_deref()
            .unwrap()
            .contains("conviction"));
    }

    #[test]
    fn rejects_names_outside_length_bounds() {
        let catalog = catalog();
        let mut player = fresh_player();

        let reply = advance(&catalog, &mut player, "X");
        assert!(reply.contains("between 2 and 20"));
        let reply = advance(&catalog, &mut player, "a name much too long to accept here");
        assert!(reply.contains("between 2 and 20"));
        assert_eq!(
            player.onboarding,
            OnboardingState::InProgress {
                step: OnboardingStep::ChooseName
            }
        );
    }

    #[test]
    fn unknown_race_reprompts_without_advancing() {
        let catalog = catalog();
        let mut player = fresh_player();
        advance(&catalog, &mut player, "Rowan");

        let reply = advance(&catalog, &mut player, "goblin");
        assert!(reply.contains("no folk known here"));
        assert_eq!(
            player.onboarding,
            OnboardingState::InProgress {
                step: OnboardingStep::ChooseRace
            }
        );
        // Spaced spelling of a hyphenated race is accepted.
        advance(&catalog, &mut player, "fae touched");
        assert_eq!(player.character.race, "fae-touched");
    }

    #[test]
    fn stats_must_total_exactly_ten() {
        let catalog = catalog();
        let mut player = fresh_player();
        advance(&catalog, &mut player, "Rowan");
        advance(&catalog, &mut player, "dwarf");
        advance(&catalog, &mut player, "male");

        let reply = advance(&catalog, &mut player, "str 5, agi 2, wis 2, wil 2, luck 1");
        assert!(reply.contains("You allocated 12 points"));
        let reply = advance(&catalog, &mut player, "str 2, luck 2");
        assert!(reply.contains("You allocated 4 points"));
        assert_eq!(
            player.onboarding,
            OnboardingState::InProgress {
                step: OnboardingStep::AllocateStats
            }
        );

        // Colon-separated form works too.
        let reply = advance(&catalog, &mut player, "str:4, agi:3, wis:1, wil:1, luck:1");
        assert!(reply.contains("what brought you here"));
        assert_eq!(player.character.stats.strength, 4);
    }

    #[test]
    fn unknown_stat_name_is_an_error() {
        let catalog = catalog();
        let mut player = fresh_player();
        advance(&catalog, &mut player, "Rowan");
        advance(&catalog, &mut player, "human");
        advance(&catalog, &mut player, "other");

        let reply = advance(&catalog, &mut player, "str 5, charm 5");
        assert!(reply.contains("Unknown stat 'charm'"));
    }

    #[test]
    fn custom_backstory_requires_a_few_words() {
        let catalog = catalog();
        let mut player = fresh_player();
        advance(&catalog, &mut player, "Rowan");
        advance(&catalog, &mut player, "halfling");
        advance(&catalog, &mut player, "female");
        advance(&catalog, &mut player, "str 2, agi 2, wis 2, wil 2, luck 2");

        let reply = advance(&catalog, &mut player, "custom");
        assert!(reply.contains("Then tell it"));
        let reply = advance(&catalog, &mut player, "nope");
        assert!(reply.contains("at least a few words"));
        assert!(!player.onboarded());

        let reply = advance(&catalog, &mut player, "I walked out of the fog and kept walking.");
        assert!(player.onboarded());
        assert!(reply.contains("Welcome to Hollowvale"));
        assert_eq!(
            player.character.backstory.as_deref(),
            Some("I walked out of the fog and kept walking.")
        );
    }

    #[test]
    fn blank_input_reshows_current_prompt() {
        let catalog = catalog();
        let mut player = fresh_player();

        let reply = advance(&catalog, &mut player, "   ");
        assert!(reply.contains("What name will you be known by"));
        assert!(!player.onboarded());
    }
}

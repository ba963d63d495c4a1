//! Quest engine: offers, acceptance, event-driven progression, timed
//! expiry, and the availability rules that decide who may hold a quest.
//!
//! Progression is event-driven. The command engine emits [`GameEvent`]s as
//! side effects of player actions; `handle_event` matches them against the
//! unsatisfied objectives of the player's active quests. Timeouts are the
//! one polled concern, checked by `tick` during the advancement prelude.
//! Availability is enforced only at offer and accept time; once an instance
//! is running, nothing re-checks the roster.

use log::warn;

use super::catalog::WorldCatalog;
use super::economy;
use super::errors::WorldError;
use super::store::WorldStore;
use super::textutil;
use super::types::{
    GameEvent, Objective, PendingOffer, PlayerRecord, QuestInstance, QuestStatus, QuestTemplate,
};

/// Players with at least this many completions no longer count as
/// newcomers for newbie-priority slot holds.
pub const NEWBIE_COMPLETIONS: u32 = 3;

/// Does this event satisfy this objective? Pure predicate, no side effects.
pub fn objective_matches(objective: &Objective, event: &GameEvent) -> bool {
    match (objective, event) {
        (Objective::ReachRoom { room_id }, GameEvent::EnterRoom { room_id: entered }) => {
            room_id == entered
        }
        (Objective::TalkToNpc { npc_id }, GameEvent::TalkToNpc { npc_id: talked }) => {
            npc_id == talked
        }
        (
            Objective::SayKeyword { npc_id, keywords },
            GameEvent::SayToNpc { npc_id: heard, text },
        ) => npc_id == heard && textutil::contains_keyword(text, keywords),
        (Objective::ObtainItem { item_id }, GameEvent::TakeItem { item_id: taken }) => {
            item_id == taken
        }
        (
            Objective::DeliverItem { item_id, npc_id, room_id },
            GameEvent::GiveItem { item_id: given, npc_id: receiver, room_id: place },
        ) => {
            item_id == given
                && npc_id == receiver
                && room_id.as_ref().map(|r| r == place).unwrap_or(true)
        }
        _ => false,
    }
}

/// Feed one event through every active quest instance the player holds.
/// Satisfied objectives are marked once and stay marked, so replaying an
/// event is a no-op. Returns progress lines for the player.
pub fn handle_event(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    event: &GameEvent,
    now_minutes: u64,
) -> Result<Vec<String>, WorldError> {
    let mut lines = Vec::new();
    let active: Vec<String> = player
        .quests
        .iter()
        .filter(|(_, q)| q.is_active())
        .map(|(id, _)| id.clone())
        .collect();

    for quest_id in active {
        let template = match catalog.quest(&quest_id) {
            Some(template) => template.clone(),
            None => {
                warn!("active quest '{}' has no template, leaving it untouched", quest_id);
                continue;
            }
        };
        let instance = match player.quests.get_mut(&quest_id) {
            Some(instance) => instance,
            None => continue,
        };
        let stage = match template.stages.get(instance.current_stage) {
            Some(stage) => stage,
            None => continue,
        };

        let mut touched = false;
        for (idx, objective) in stage.objectives.iter().enumerate() {
            let done = instance.stage_progress.get(idx).copied().unwrap_or(false);
            if done || !objective_matches(objective, event) {
                continue;
            }
            if let Some(flag) = instance.stage_progress.get_mut(idx) {
                *flag = true;
                touched = true;
                lines.push(format!("[Quest] {}", objective.describe()));
            }
        }
        if !touched || !instance.stage_progress.iter().all(|f| *f) {
            continue;
        }

        // Stage complete: advance or finish.
        instance.current_stage += 1;
        match template.stages.get(instance.current_stage) {
            Some(next) => {
                instance.stage_progress = vec![false; next.objectives.len()];
                instance.notes.push(format!("Objective: {}", next.description));
                lines.push(format!("[Quest] New objective: {}", next.description));
            }
            None => {
                instance.status = QuestStatus::Completed { at_minutes: now_minutes };
                lines.push(format!("[Quest] Complete: {}!", template.name));
                lines.extend(apply_rewards(catalog, &template, player));
                finish_instance(store, player, &quest_id, true)?;
            }
        }
    }
    Ok(lines)
}

/// Fail every active instance whose expiry minute has passed. Called from
/// the advancement prelude, so a player discovers the failure the next time
/// they act.
pub fn tick(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    now_minutes: u64,
) -> Result<Vec<String>, WorldError> {
    let expired: Vec<String> = player
        .quests
        .iter()
        .filter(|(_, q)| {
            q.is_active() && q.expires_at_minutes.map(|t| t <= now_minutes).unwrap_or(false)
        })
        .map(|(id, _)| id.clone())
        .collect();

    let mut lines = Vec::new();
    for quest_id in expired {
        let template = match catalog.quest(&quest_id) {
            Some(template) => template.clone(),
            None => continue,
        };
        if let Some(instance) = player.quests.get_mut(&quest_id) {
            instance.status = QuestStatus::Failed {
                at_minutes: now_minutes,
                reason: "time ran out".to_string(),
            };
        }
        lines.push(format!("[Quest] Failed: {}. Time ran out.", template.name));
        for delta in &template.failure_reputation {
            player.adjust_reputation(&delta.npc_id, delta.amount);
            if !delta.reason.is_empty() {
                player.push_log(&format!("Reputation: {}", delta.reason));
            }
        }
        finish_instance(store, player, &quest_id, false)?;
    }
    Ok(lines)
}

/// Why a quest cannot be offered to or accepted by this player right now,
/// or `None` when it is available. Capacity is advisory here; `accept`
/// re-checks it under the roster lock before claiming.
pub fn availability_block(
    store: &WorldStore,
    template: &QuestTemplate,
    player: &PlayerRecord,
) -> Result<Option<String>, WorldError> {
    if player.quests.get(&template.id).map(|q| q.is_active()).unwrap_or(false) {
        return Ok(Some("You are already on that quest.".to_string()));
    }
    let roster = store.roster(&template.id)?;
    if let Some(cap) = template.availability.max_per_player {
        if roster.completions_for(&player.username) >= cap {
            return Ok(Some(
                "You have already done all you can with that task.".to_string(),
            ));
        }
    }
    Ok(slot_block(template, roster.holders.len(), player))
}

fn slot_block(template: &QuestTemplate, holders: usize, player: &PlayerRecord) -> Option<String> {
    if template.availability.shared {
        return None;
    }
    let cap = template.availability.max_holders.unwrap_or(1) as usize;
    if holders >= cap {
        return Some("Someone else is already seeing to that.".to_string());
    }
    if template.availability.newbie_priority
        && cap - holders == 1
        && player.quests_completed() >= NEWBIE_COMPLETIONS
    {
        return Some(
            "That task is being held for newer adventurers. Leave it for them.".to_string(),
        );
    }
    None
}

/// Scan an utterance aimed at an NPC for quest-offer keywords. On a match
/// the offer becomes the player's pending offer and the offer text is
/// returned for display. An existing pending offer is left alone.
pub fn maybe_offer(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    npc_id: &str,
    text: &str,
    now_minutes: u64,
) -> Result<Option<String>, WorldError> {
    if player.pending_offer.is_some() {
        return Ok(None);
    }
    for (template, offer) in catalog.npc_offers(npc_id) {
        let (keywords, offer_text) = match offer {
            super::types::OfferSource::NpcDialogue { keywords, offer_text, .. } => {
                (keywords, offer_text)
            }
            _ => continue,
        };
        if !textutil::contains_keyword(text, keywords) {
            continue;
        }
        if availability_block(store, template, player)?.is_some() {
            continue;
        }
        player.pending_offer = Some(PendingOffer {
            quest_id: template.id.clone(),
            source: npc_id.to_string(),
            offered_at_minutes: now_minutes,
        });
        return Ok(Some(format!(
            "{}\n(Type 'accept' to take this quest, or 'decline' to pass.)",
            offer_text
        )));
    }
    Ok(None)
}

/// Accept the pending offer: re-check availability, claim a roster slot
/// under the roster lock, start the instance, and run item placements.
pub fn accept(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    now_minutes: u64,
) -> Result<String, WorldError> {
    let offer = match player.pending_offer.clone() {
        Some(offer) => offer,
        None => return Ok("You have no quest offer to accept.".to_string()),
    };
    let template = match catalog.quest(&offer.quest_id) {
        Some(template) => template.clone(),
        None => {
            player.pending_offer = None;
            return Ok("That offer is no longer on the table.".to_string());
        }
    };
    if let Some(reason) = availability_block(store, &template, player)? {
        player.pending_offer = None;
        return Ok(reason);
    }

    // Claim the slot with the capacity check re-run under the lock, so two
    // players racing for an exclusive quest cannot both win.
    let username = player.username.clone();
    let quests_done = player.quests_completed();
    let claimed = store.with_roster(&template.id, |roster| {
        if !template.availability.shared {
            let cap = template.availability.max_holders.unwrap_or(1) as usize;
            if roster.holders.len() >= cap {
                return false;
            }
            if template.availability.newbie_priority
                && cap - roster.holders.len() == 1
                && quests_done >= NEWBIE_COMPLETIONS
            {
                return false;
            }
        }
        roster.holders.insert(username.clone());
        true
    })?;
    player.pending_offer = None;
    if !claimed {
        return Ok("Someone else took that task just ahead of you.".to_string());
    }

    let instance = QuestInstance::start(&template, now_minutes);
    player.quests.insert(template.id.clone(), instance);
    player.push_log(&format!("Accepted quest: {}", template.name));

    for placement in &template.placements {
        store.place_item_once(&placement.room_id, &placement.item_id)?;
    }

    let mut response = format!("Quest accepted: {}.", template.name);
    if let Some(stage) = template.stages.first() {
        response.push_str(&format!("\nObjective: {}", stage.description));
    }
    if let Some(limit) = template.time_limit_minutes {
        response.push_str(&format!("\nYou have {} to finish it.", world_duration(limit)));
    }
    Ok(response)
}

/// Turn down the pending offer, if any.
pub fn decline(player: &mut PlayerRecord) -> String {
    match player.pending_offer.take() {
        Some(_) => "You decline the offer. Perhaps another time.".to_string(),
        None => "You have no quest offer to decline.".to_string(),
    }
}

/// The numbered noticeboard listing for a room.
pub fn render_board(catalog: &WorldCatalog, room_id: &str) -> String {
    let posted = catalog.noticeboard_quests(room_id);
    if posted.is_empty() {
        return "The noticeboard is empty. No quests are posted here right now.".to_string();
    }
    let mut out = String::from("=== Village Noticeboard ===\n");
    for (idx, quest) in posted.iter().enumerate() {
        let mut teaser = quest.description.clone();
        if teaser.len() > 60 {
            teaser.truncate(60);
            teaser.push_str("...");
        }
        out.push_str(&format!(
            "{}. {} ({})\n   {}\n",
            idx + 1,
            quest.name,
            quest.difficulty.as_str(),
            teaser
        ));
    }
    out.push_str("(Type 'board <number>' to read a posting in detail.)");
    out
}

/// A full posting. Reading it makes the quest the player's pending offer so
/// a plain `accept` takes it.
pub fn board_detail(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    room_id: &str,
    number: usize,
    now_minutes: u64,
) -> Result<String, WorldError> {
    let posted = catalog.noticeboard_quests(room_id);
    let template = match number.checked_sub(1).and_then(|i| posted.get(i)) {
        Some(template) => *template,
        None => return Ok("There is no posting with that number.".to_string()),
    };

    let mut out = format!("=== {} ({}) ===\n{}\n", template.name, template.difficulty.as_str(), template.description);
    if let Some(stage) = template.stages.first() {
        out.push_str(&format!("First task: {}\n", stage.description));
    }
    if !template.rewards.currency.is_zero() {
        out.push_str(&format!("Reward: {}\n", template.rewards.currency));
    }
    if let Some(limit) = template.time_limit_minutes {
        out.push_str(&format!("Time limit: {}\n", world_duration(limit)));
    }
    match availability_block(store, template, player)? {
        Some(reason) => out.push_str(&reason),
        None => {
            player.pending_offer = Some(PendingOffer {
                quest_id: template.id.clone(),
                source: format!("noticeboard:{}", room_id),
                offered_at_minutes: now_minutes,
            });
            out.push_str("(Type 'accept' to take this task, or 'decline' to pass.)");
        }
    }
    Ok(out)
}

/// The player's active quest list with objectives and remaining time.
pub fn quest_log(catalog: &WorldCatalog, player: &PlayerRecord, now_minutes: u64) -> String {
    let mut active: Vec<&QuestInstance> =
        player.quests.values().filter(|q| q.is_active()).collect();
    if active.is_empty() {
        return "You have no active quests.".to_string();
    }
    active.sort_by(|a, b| a.quest_id.cmp(&b.quest_id));

    let mut out = String::from("=== Your Quests ===\n");
    for instance in active {
        let template = match catalog.quest(&instance.quest_id) {
            Some(template) => template,
            None => continue,
        };
        out.push_str(&format!("- {} ({})\n", template.name, template.difficulty.as_str()));
        if let Some(stage) = template.stages.get(instance.current_stage) {
            out.push_str(&format!("    {}\n", stage.description));
            for (idx, objective) in stage.objectives.iter().enumerate() {
                let mark = if instance.stage_progress.get(idx).copied().unwrap_or(false) {
                    "x"
                } else {
                    " "
                };
                out.push_str(&format!("    [{}] {}\n", mark, objective.describe()));
            }
        }
        if let Some(expires) = instance.expires_at_minutes {
            let left = expires.saturating_sub(now_minutes);
            out.push_str(&format!("    Time left: {}\n", world_duration(left)));
        }
    }
    out.trim_end().to_string()
}

fn apply_rewards(
    catalog: &WorldCatalog,
    template: &QuestTemplate,
    player: &mut PlayerRecord,
) -> Vec<String> {
    let mut lines = Vec::new();
    if !template.rewards.currency.is_zero() {
        player.currency = player.currency.add(&template.rewards.currency);
        lines.push(format!("You receive {}.", template.rewards.currency));
    }
    for grant in &template.rewards.items {
        for _ in 0..grant.quantity.max(1) {
            player.inventory.push(grant.item_id.clone());
        }
        lines.push(format!("You receive {}.", catalog.item_name(&grant.item_id)));
    }
    for delta in &template.rewards.reputation {
        player.adjust_reputation(&delta.npc_id, delta.amount);
        let name = catalog
            .npc(&delta.npc_id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| delta.npc_id.replace('_', " "));
        if let Some(line) = economy::standing_shift_line(&name, delta.amount) {
            lines.push(line);
        }
        if !delta.reason.is_empty() {
            player.push_log(&format!("Reputation: {}", delta.reason));
        }
    }
    lines
}

/// Move a finished instance to history and release its roster slot. A
/// completion also bumps the per-player completion counter.
fn finish_instance(
    store: &WorldStore,
    player: &mut PlayerRecord,
    quest_id: &str,
    completed: bool,
) -> Result<(), WorldError> {
    if let Some(instance) = player.quests.remove(quest_id) {
        player.completed_quests.insert(quest_id.to_string(), instance);
    }
    let username = player.username.clone();
    store.with_roster(quest_id, |roster| {
        roster.holders.remove(&username);
        if completed {
            *roster.completions.entry(username.clone()).or_insert(0) += 1;
        }
    })
}

/// Render a world-minute count as hours and minutes.
fn world_duration(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 && mins > 0 {
        format!("{} hours {} minutes", hours, mins)
    } else if hours > 0 {
        format!("{} hours", hours)
    } else {
        format!("{} minutes", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::{
        CurrencyAmount, OfferSource, QuestDifficulty, QuestGiver, QuestStage, RoomDef,
    };

    fn errand_world() -> (WorldCatalog, WorldStore) {
        let rooms = vec![
            RoomDef::new("square", "Square", "A square."),
            RoomDef::new("cellar", "Cellar", "A cellar."),
        ];
        let quests = vec![
            QuestTemplate::new(
                "fetch_cask",
                "The Missing Cask",
                "A cask has gone missing from the cellar. Bring it back to the square.",
                QuestGiver::Noticeboard { room_id: "square".to_string() },
                QuestDifficulty::Easy,
            )
            .with_stage(
                QuestStage::new("reach", "Search the cellar.")
                    .with_objective(Objective::ReachRoom { room_id: "cellar".to_string() }),
            )
            .with_stage(
                QuestStage::new("deliver", "Hand the cask to the steward in the square.")
                    .with_objective(Objective::DeliverItem {
                        item_id: "cask".to_string(),
                        npc_id: "steward".to_string(),
                        room_id: Some("square".to_string()),
                    }),
            )
            .with_reward_currency(CurrencyAmount::from_parts(0, 5, 0))
            .with_offer(OfferSource::Noticeboard { room_id: "square".to_string() })
            .with_placement("cellar", "cask"),
            QuestTemplate::new(
                "guard_post",
                "A Quiet Watch",
                "Stand a watch nobody else wants.",
                QuestGiver::Noticeboard { room_id: "square".to_string() },
                QuestDifficulty::Easy,
            )
            .exclusive()
            .with_stage(
                QuestStage::new("reach", "Walk to the cellar door.")
                    .with_objective(Objective::ReachRoom { room_id: "cellar".to_string() }),
            )
            .with_offer(OfferSource::Noticeboard { room_id: "square".to_string() }),
        ];
        let catalog = WorldCatalog::from_parts(
            "errand",
            "square",
            rooms,
            Vec::new(),
            Vec::new(),
            quests,
        )
        .unwrap();
        let store = WorldStore::new(&catalog);
        (catalog, store)
    }

    fn accept_from_board(
        catalog: &WorldCatalog,
        store: &WorldStore,
        player: &mut PlayerRecord,
        number: usize,
    ) -> String {
        board_detail(catalog, store, player, "square", number, 0).unwrap();
        accept(catalog, store, player, 0).unwrap()
    }

    #[test]
    fn reach_then_deliver_completes_and_pays() {
        let (catalog, store) = errand_world();
        let mut player = PlayerRecord::new("mira", "square");
        let start = player.currency;

        let response = accept_from_board(&catalog, &store, &mut player, 1);
        assert!(response.contains("Quest accepted: The Missing Cask"));
        // Accepting spawned the objective item.
        assert!(store.room_items("cellar").unwrap().contains(&"cask".to_string()));
        assert!(store.roster("fetch_cask").unwrap().holders.contains("mira"));

        let lines = handle_event(
            &catalog,
            &store,
            &mut player,
            &GameEvent::EnterRoom { room_id: "cellar".to_string() },
            10,
        )
        .unwrap();
        assert!(lines.iter().any(|l| l.contains("New objective")));
        assert!(player.quests["fetch_cask"].is_active());

        let lines = handle_event(
            &catalog,
            &store,
            &mut player,
            &GameEvent::GiveItem {
                item_id: "cask".to_string(),
                npc_id: "steward".to_string(),
                room_id: "square".to_string(),
            },
            20,
        )
        .unwrap();
        assert!(lines.iter().any(|l| l.contains("Complete: The Missing Cask")));
        assert!(lines.iter().any(|l| l.contains("You receive 5 silver.")));
        assert_eq!(player.currency, start.add(&CurrencyAmount::from_parts(0, 5, 0)));
        assert!(!player.quests.contains_key("fetch_cask"));
        assert!(player.completed_quests.contains_key("fetch_cask"));
        let roster = store.roster("fetch_cask").unwrap();
        assert!(roster.holders.is_empty());
        assert_eq!(roster.completions_for("mira"), 1);
    }

    #[test]
    fn replayed_events_do_not_double_apply() {
        let (catalog, store) = errand_world();
        let mut player = PlayerRecord::new("mira", "square");
        accept_from_board(&catalog, &store, &mut player, 1);

        let event = GameEvent::EnterRoom { room_id: "cellar".to_string() };
        let first = handle_event(&catalog, &store, &mut player, &event, 10).unwrap();
        assert!(!first.is_empty());
        let replay = handle_event(&catalog, &store, &mut player, &event, 11).unwrap();
        assert!(replay.is_empty());
        assert_eq!(player.quests["fetch_cask"].current_stage, 1);
    }

    #[test]
    fn wrong_room_delivery_does_not_count() {
        let (catalog, store) = errand_world();
        let mut player = PlayerRecord::new("mira", "square");
        accept_from_board(&catalog, &store, &mut player, 1);
        handle_event(
            &catalog,
            &store,
            &mut player,
            &GameEvent::EnterRoom { room_id: "cellar".to_string() },
            10,
        )
        .unwrap();

        let lines = handle_event(
            &catalog,
            &store,
            &mut player,
            &GameEvent::GiveItem {
                item_id: "cask".to_string(),
                npc_id: "steward".to_string(),
                room_id: "cellar".to_string(),
            },
            20,
        )
        .unwrap();
        assert!(lines.is_empty());
        assert!(player.quests["fetch_cask"].is_active());
    }

    #[test]
    fn exclusive_quests_hold_one_slot() {
        let (catalog, store) = errand_world();
        let mut first = PlayerRecord::new("mira", "square");
        let response = accept_from_board(&catalog, &store, &mut first, 2);
        assert!(response.contains("Quest accepted"));

        let mut second = PlayerRecord::new("tom", "square");
        let detail = board_detail(&catalog, &store, &mut second, "square", 2, 0).unwrap();
        assert!(detail.contains("Someone else is already seeing to that."));
        assert!(second.pending_offer.is_none());
    }

    #[test]
    fn veterans_leave_newbie_slots_alone() {
        let (catalog, store) = errand_world();
        let mut veteran = PlayerRecord::new("vet", "square");
        for n in 0..NEWBIE_COMPLETIONS {
            let id = format!("old_{}", n);
            let done = QuestInstance {
                quest_id: id.clone(),
                status: QuestStatus::Completed { at_minutes: 0 },
                current_stage: 0,
                stage_progress: Vec::new(),
                started_at_minutes: 0,
                expires_at_minutes: None,
                notes: Vec::new(),
            };
            veteran.completed_quests.insert(id, done);
        }

        let detail = board_detail(&catalog, &store, &mut veteran, "square", 2, 0).unwrap();
        assert!(detail.contains("held for newer adventurers"));
        assert!(veteran.pending_offer.is_none());

        // A fresh player walks straight into the same slot.
        let mut newbie = PlayerRecord::new("kit", "square");
        let response = accept_from_board(&catalog, &store, &mut newbie, 2);
        assert!(response.contains("Quest accepted"));
    }

    #[test]
    fn expiry_fails_the_quest_and_frees_the_slot() {
        let rooms = vec![RoomDef::new("square", "Square", "A square.")];
        let quests = vec![QuestTemplate::new(
            "rites",
            "Evening Rites",
            "Gather what the rites need before nightfall.",
            QuestGiver::Noticeboard { room_id: "square".to_string() },
            QuestDifficulty::Easy,
        )
        .timed(120)
        .with_stage(
            QuestStage::new("gather", "Find the offering.")
                .with_objective(Objective::ObtainItem { item_id: "offering".to_string() }),
        )
        .with_failure_reputation("acolyte", -2, "Let the evening rites go wanting")
        .with_offer(OfferSource::Noticeboard { room_id: "square".to_string() })];
        let catalog =
            WorldCatalog::from_parts("rites", "square", rooms, Vec::new(), Vec::new(), quests)
                .unwrap();
        let store = WorldStore::new(&catalog);

        let mut player = PlayerRecord::new("mira", "square");
        board_detail(&catalog, &store, &mut player, "square", 1, 0).unwrap();
        accept(&catalog, &store, &mut player, 0).unwrap();
        assert_eq!(player.quests["rites"].expires_at_minutes, Some(120));

        assert!(tick(&catalog, &store, &mut player, 119).unwrap().is_empty());
        let lines = tick(&catalog, &store, &mut player, 120).unwrap();
        assert!(lines.iter().any(|l| l.contains("Failed: Evening Rites")));
        assert!(!player.quests.contains_key("rites"));
        assert_eq!(player.reputation_with("acolyte"), -2);
        assert!(store.roster("rites").unwrap().holders.is_empty());
        assert_eq!(store.roster("rites").unwrap().completions_for("mira"), 0);
        // A failed run does not count toward experience.
        assert_eq!(player.quests_completed(), 0);
    }

    #[test]
    fn board_lists_postings_and_truncates_teasers() {
        let (catalog, _store) = errand_world();
        let listing = render_board(&catalog, "square");
        assert!(listing.starts_with("=== Village Noticeboard ==="));
        assert!(listing.contains("1. The Missing Cask (Easy)"));
        assert!(listing.contains("2. A Quiet Watch (Easy)"));
        assert!(listing.contains("..."));
        assert!(listing.contains("board <number>"));
        assert_eq!(
            render_board(&catalog, "cellar"),
            "The noticeboard is empty. No quests are posted here right now."
        );
    }

    #[test]
    fn decline_clears_the_pending_offer() {
        let (catalog, store) = errand_world();
        let mut player = PlayerRecord::new("mira", "square");
        board_detail(&catalog, &store, &mut player, "square", 1, 0).unwrap();
        assert!(player.pending_offer.is_some());
        assert_eq!(decline(&mut player), "You decline the offer. Perhaps another time.");
        assert!(player.pending_offer.is_none());
        assert_eq!(decline(&mut player), "You have no quest offer to decline.");
    }

    #[test]
    fn keyword_offers_come_from_npc_talk() {
        let rooms = vec![RoomDef::new("inn", "Inn", "An inn.")];
        let npcs = vec![crate::world::types::NpcArchetype::new(
            "keeper",
            "Keeper",
            "The keeper.",
            "inn",
        )];
        let quests = vec![QuestTemplate::new(
            "errand",
            "A Small Errand",
            "The keeper needs a hand.",
            QuestGiver::Npc { npc_id: "keeper".to_string() },
            QuestDifficulty::Easy,
        )
        .with_stage(
            QuestStage::new("help", "Offer to help.")
                .with_objective(Objective::TalkToNpc { npc_id: "keeper".to_string() }),
        )
        .with_offer(OfferSource::NpcDialogue {
            npc_id: "keeper".to_string(),
            keywords: vec!["help".to_string(), "errand".to_string()],
            offer_text: "\"Could you run a small errand for me?\"".to_string(),
        })];
        let catalog =
            WorldCatalog::from_parts("inn", "inn", rooms, Vec::new(), npcs, quests).unwrap();
        let store = WorldStore::new(&catalog);

        let mut player = PlayerRecord::new("mira", "inn");
        let silent = maybe_offer(&catalog, &store, &mut player, "keeper", "nice weather", 0)
            .unwrap();
        assert!(silent.is_none());

        let offered = maybe_offer(&catalog, &store, &mut player, "keeper", "Need any help?", 0)
            .unwrap()
            .unwrap();
        assert!(offered.contains("small errand"));
        assert!(offered.contains("'accept'"));
        assert_eq!(player.pending_offer.as_ref().unwrap().quest_id, "errand");

        let response = accept(&catalog, &store, &mut player, 0).unwrap();
        assert!(response.contains("Quest accepted: A Small Errand"));
        assert!(player.quests.contains_key("errand"));
    }
}

/// Quest flow through the engine facade: noticeboard postings, item
/// placement, stage progress on world events, rewards, expiry, and the
/// exclusive-errand roster.
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hollowvale::config::Config;
use hollowvale::world::clock::SECONDS_PER_WORLD_MINUTE;
use hollowvale::world::{GameEngine, NullHooks, PlayerRecord, ScriptedDialogue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn wall_at(minutes: u64) -> DateTime<Utc> {
    epoch() + ChronoDuration::seconds((minutes * SECONDS_PER_WORLD_MINUTE) as i64)
}

fn config_for(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = dir.path().join("data").to_string_lossy().into_owned();
    config.storage.autosave_seconds = 86_400;
    config.world.epoch = epoch();
    config
}

async fn boot(dir: &TempDir) -> GameEngine {
    GameEngine::new(&config_for(dir), Box::new(ScriptedDialogue))
        .await
        .expect("engine boots")
}

async fn run(
    engine: &GameEngine,
    minute: u64,
    player: &mut PlayerRecord,
    line: &str,
    rng: &mut StdRng,
) -> String {
    engine
        .execute_at(wall_at(minute), player, line, &NullHooks, rng)
        .await
        .expect("command runs")
}

#[tokio::test]
async fn herb_errand_runs_from_noticeboard_to_reward() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(51);
    let mut player = PlayerRecord::new("fern", engine.catalog().spawn_room());

    let reply = run(&engine, 1, &mut player, "board", &mut rng).await;
    assert!(reply.contains("=== Village Noticeboard ==="), "{}", reply);
    assert!(reply.contains("Herbs for the Shrine"), "{}", reply);

    let reply = run(&engine, 2, &mut player, "board 1", &mut rng).await;
    assert!(reply.contains("Herbs for the Shrine"), "{}", reply);
    assert!(reply.contains("'accept'"), "{}", reply);
    assert!(player.pending_offer.is_some());

    let reply = run(&engine, 3, &mut player, "accept", &mut rng).await;
    assert!(
        reply.contains("Quest accepted: Herbs for the Shrine."),
        "{}",
        reply
    );
    assert!(player.pending_offer.is_none());

    run(&engine, 4, &mut player, "west", &mut rng).await;
    assert_eq!(player.location, "forest_edge");

    let reply = run(&engine, 5, &mut player, "take bundle of herbs", &mut rng).await;
    assert!(reply.contains("You pick up the bundle of herbs."), "{}", reply);
    assert!(reply.contains("[Quest] Obtain bundle of herbs"), "{}", reply);
    assert!(
        reply.contains("[Quest] New objective: Bring the herbs to the Quiet Acolyte"),
        "{}",
        reply
    );

    run(&engine, 6, &mut player, "east", &mut rng).await;
    run(&engine, 7, &mut player, "east", &mut rng).await;
    run(&engine, 8, &mut player, "south", &mut rng).await;
    assert_eq!(player.location, "shrine_of_the_forgotten");

    let reply = run(&engine, 9, &mut player, "give herbs to acolyte", &mut rng).await;
    assert!(reply.contains("You give the bundle of herbs"), "{}", reply);
    assert!(
        reply.contains("[Quest] Complete: Herbs for the Shrine!"),
        "{}",
        reply
    );
    assert!(reply.contains("You receive 1 gold."), "{}", reply);

    // 50 starting gold plus the reward.
    assert_eq!(player.currency.parts(), (51, 0, 0));
    assert!(!player.inventory.contains(&"bundle_of_herbs".to_string()));

    // The roster slot is released and the completion is on record.
    let roster = engine
        .store()
        .roster("herbs_for_the_shrine")
        .expect("roster");
    assert!(roster.holders.is_empty());
    assert_eq!(roster.completions_for("fern"), 1);
}

#[tokio::test]
async fn a_timed_errand_fails_once_its_window_closes() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(52);
    let mut player = PlayerRecord::new("fern", engine.catalog().spawn_room());

    run(&engine, 1, &mut player, "board 1", &mut rng).await;
    run(&engine, 2, &mut player, "accept", &mut rng).await;
    assert!(player.quests["herbs_for_the_shrine"].is_active());

    // The posting allows twelve world hours. Idle past the deadline.
    let lines = engine
        .poll_at(wall_at(2 + 721), &mut player, &NullHooks, &mut rng)
        .await
        .expect("poll");
    assert!(
        lines
            .iter()
            .any(|l| l.contains("[Quest] Failed: Herbs for the Shrine. Time ran out.")),
        "{:?}",
        lines
    );
    // The instance is archived, not left among the active quests.
    assert!(!player.quests.contains_key("herbs_for_the_shrine"));
    assert!(!player.completed_quests["herbs_for_the_shrine"].is_active());

    // Failure frees the roster slot so someone else can take the posting.
    let roster = engine
        .store()
        .roster("herbs_for_the_shrine")
        .expect("roster");
    assert!(roster.holders.is_empty());

    // Letting the rites go wanting is remembered at the shrine.
    assert!(player.reputation.get("quiet_acolyte").copied().unwrap_or(0) < 0);
}

#[tokio::test]
async fn an_exclusive_errand_admits_only_one_player() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(53);

    let mut alice = PlayerRecord::new("alice", "tavern");
    let mut bob = PlayerRecord::new("bob", "tavern");

    // Mentioning the parcel in Mara's earshot earns the offer.
    let reply = run(&engine, 1, &mut alice, "say package", &mut rng).await;
    assert!(reply.contains("'accept'"), "{}", reply);
    assert!(alice.pending_offer.is_some());

    let reply = run(&engine, 2, &mut alice, "accept", &mut rng).await;
    assert!(reply.contains("Quest accepted: Lost Package."), "{}", reply);

    // The same words get Bob nothing while Alice holds the errand.
    let reply = run(&engine, 3, &mut bob, "say package", &mut rng).await;
    assert!(!reply.contains("'accept'"), "{}", reply);
    assert!(bob.pending_offer.is_none());

    let reply = run(&engine, 4, &mut bob, "accept", &mut rng).await;
    assert!(reply.contains("You have no quest offer to accept."), "{}", reply);

    let roster = engine.store().roster("lost_package").expect("roster");
    assert_eq!(roster.holders.len(), 1);
    assert!(roster.holders.contains("alice"));
}

#[tokio::test]
async fn accepting_places_the_quest_item_only_once() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(54);

    let before = engine
        .store()
        .room_items("forest_edge")
        .expect("items")
        .iter()
        .filter(|id| id.as_str() == "bundle_of_herbs")
        .count();

    let mut player = PlayerRecord::new("fern", engine.catalog().spawn_room());
    run(&engine, 1, &mut player, "board 1", &mut rng).await;
    run(&engine, 2, &mut player, "accept", &mut rng).await;

    // The forest already grows one bundle; accepting must not stack more.
    let after = engine
        .store()
        .room_items("forest_edge")
        .expect("items")
        .iter()
        .filter(|id| id.as_str() == "bundle_of_herbs")
        .count();
    assert_eq!(before, 1);
    assert_eq!(after, 1);
}

#[tokio::test]
async fn quest_journal_tracks_stage_and_deadline() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(55);
    let mut player = PlayerRecord::new("fern", engine.catalog().spawn_room());

    let reply = run(&engine, 1, &mut player, "quests", &mut rng).await;
    assert!(reply.contains("You have no active quests."), "{}", reply);

    run(&engine, 2, &mut player, "board 1", &mut rng).await;
    run(&engine, 3, &mut player, "accept", &mut rng).await;

    let reply = run(&engine, 4, &mut player, "quests", &mut rng).await;
    assert!(reply.contains("=== Your Quests ==="), "{}", reply);
    assert!(reply.contains("Herbs for the Shrine"), "{}", reply);
    assert!(reply.contains("Time left:"), "{}", reply);
    assert!(reply.contains("[ ]"), "unfinished objectives show open boxes: {}", reply);
}

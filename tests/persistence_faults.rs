/// Fault tolerance around the on-disk state: corrupt or foreign
/// snapshots, failing autosaves, racing writers, and leftovers from
/// interrupted writes. The world must keep running in every case.
use std::fs;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hollowvale::config::Config;
use hollowvale::world::clock::SECONDS_PER_WORLD_MINUTE;
use hollowvale::world::{
    GameEngine, NullHooks, PlayerRecord, ScriptedDialogue, SnapshotStore, PLAYER_SCHEMA_VERSION,
};
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

#[tokio::test]
async fn a_corrupt_snapshot_boots_a_seeded_world() {
    let dir = TempDir::new().expect("tempdir");
    let data = dir.path().join("data");
    fs::create_dir_all(&data).expect("data dir");
    fs::write(data.join("world.json"), "{ this is not json").expect("write");

    let engine = boot(&dir).await;
    assert_eq!(engine.clock().epoch(), epoch());
    let items = engine
        .store()
        .room_items("town_square")
        .expect("room items");
    assert!(items.contains(&"copper_coin".to_string()));
}

#[tokio::test]
async fn a_snapshot_from_a_newer_build_is_refused_and_the_world_starts_over() {
    let dir = TempDir::new().expect("tempdir");
    let data = dir.path().join("data");
    fs::create_dir_all(&data).expect("data dir");
    fs::write(
        data.join("world.json"),
        r#"{
            "schema_version": 99,
            "saved_at": "2026-02-01T08:30:00Z",
            "epoch": "2020-05-05T00:00:00Z"
        }"#,
    )
    .expect("write");

    let engine = boot(&dir).await;
    // The foreign epoch is not trusted; the configured one applies.
    assert_eq!(engine.clock().epoch(), epoch());
    let items = engine
        .store()
        .room_items("town_square")
        .expect("room items");
    assert!(items.contains(&"copper_coin".to_string()));
}

#[tokio::test]
async fn a_failing_autosave_never_interrupts_play() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = config_for(&dir);
    config.storage.autosave_seconds = 0;
    let engine = GameEngine::new(&config, Box::new(ScriptedDialogue))
        .await
        .expect("engine boots");
    let mut rng = StdRng::seed_from_u64(71);
    let mut player = PlayerRecord::new("rook", engine.catalog().spawn_room());

    // A directory squatting on the document path makes every save fail.
    let world_path = dir.path().join("data").join("world.json");
    fs::create_dir_all(&world_path).expect("squat");

    assert!(engine.save_world().await.is_err());

    let reply = engine
        .execute_at(wall_at(1), &mut player, "look", &NullHooks, &mut rng)
        .await
        .expect("play continues");
    assert!(reply.contains("Hollowvale Town Square"), "{}", reply);
}

#[tokio::test]
async fn racing_world_saves_leave_one_valid_document() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;

    let (a, b) = tokio::join!(engine.save_world(), engine.save_world());
    a.expect("first save");
    b.expect("second save");

    let snapshots = SnapshotStore::open(dir.path().join("data"))
        .await
        .expect("open");
    let snapshot = snapshots
        .load_world()
        .await
        .expect("document parses")
        .expect("document exists");
    assert_eq!(snapshot.epoch, epoch());
}

#[tokio::test]
async fn an_older_player_record_logs_into_the_current_build() {
    let dir = TempDir::new().expect("tempdir");
    let players = dir.path().join("data").join("players");
    fs::create_dir_all(&players).expect("players dir");
    fs::write(
        players.join("rook.json"),
        r#"{
            "username": "rook",
            "location": "tavern",
            "created_at": "2025-06-01T12:00:00Z",
            "schema_version": 1
        }"#,
    )
    .expect("write");

    let engine = boot(&dir).await;
    let mut player = engine.login("rook").await.expect("login");
    assert!(player.onboarded(), "records predating onboarding pass the gate");
    assert_eq!(player.location, "tavern");
    assert_eq!(player.schema_version, PLAYER_SCHEMA_VERSION);
    assert!(player.inventory.is_empty());

    let mut rng = StdRng::seed_from_u64(72);
    let reply = engine
        .execute_at(wall_at(1), &mut player, "look", &NullHooks, &mut rng)
        .await
        .expect("command runs");
    assert!(reply.contains("The Rusty Tankard Tavern"), "{}", reply);
}

#[tokio::test]
async fn interrupted_write_leftovers_are_not_mistaken_for_players() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let player = PlayerRecord::new("rook", engine.catalog().spawn_room());
    engine.save_player(&player).await.expect("save");

    let players = dir.path().join("data").join("players");
    fs::write(players.join(".rook.json.tmp-12-0"), "partial").expect("leftover");

    let snapshots = SnapshotStore::open(dir.path().join("data"))
        .await
        .expect("open");
    let names = snapshots.player_names().await.expect("names");
    assert_eq!(names, vec!["rook".to_string()]);
}

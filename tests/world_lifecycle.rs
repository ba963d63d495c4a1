/// End-to-end session lifecycle through the engine facade.
///
/// A stranger logs in, builds a character at the gates, plays a little,
/// and finds the same world waiting after a full process restart.
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hollowvale::config::Config;
use hollowvale::world::clock::SECONDS_PER_WORLD_MINUTE;
use hollowvale::world::{GameEngine, NullHooks, PlayerRecord, ScriptedDialogue, WeatherType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Wall-clock instant at which the world clock reads `minutes`.
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

/// Run one command and hand back the full reply, prelude included.
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
async fn a_new_player_is_walked_through_character_creation() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(41);

    let mut player = engine.login("Fern").await.expect("login");
    assert!(!player.onboarded(), "no record on disk means a fresh start");

    // A blank line shows the current prompt without consuming an answer.
    let reply = run(&engine, 1, &mut player, "", &mut rng).await;
    assert!(reply.contains("What name will you be known by"), "{}", reply);

    let reply = run(&engine, 2, &mut player, "Fern", &mut rng).await;
    assert!(reply.contains("Well met, Fern"), "{}", reply);
    assert!(reply.contains("what blood runs in your veins"), "{}", reply);

    let reply = run(&engine, 3, &mut player, "elf", &mut rng).await;
    assert!(reply.contains("male, female, nonbinary, other"), "{}", reply);

    let reply = run(&engine, 4, &mut player, "nonbinary", &mut rng).await;
    assert!(reply.contains("Divide exactly 10 points"), "{}", reply);

    let reply = run(
        &engine,
        5,
        &mut player,
        "str 3, agi 2, wis 2, wil 2, luck 1",
        &mut rng,
    )
    .await;
    assert!(reply.contains("what brought you here"), "{}", reply);

    let reply = run(&engine, 6, &mut player, "quiet mystery", &mut rng).await;
    assert!(reply.contains("The gate swings open."), "{}", reply);
    assert!(reply.contains("Welcome to Hollowvale, Fern."), "{}", reply);

    assert!(player.onboarded());
    assert_eq!(player.location, "town_square");
    assert_eq!(player.character.name, "Fern");
    assert_eq!(player.character.race, "elf");
    assert_eq!(player.character.gender, "nonbinary");
    assert_eq!(player.character.stats.strength, 3);
    assert_eq!(player.character.stats.luck, 1);

    // The first real command lands in the spawn room.
    let reply = run(&engine, 7, &mut player, "look", &mut rng).await;
    assert!(reply.contains("Hollowvale Town Square"), "{}", reply);
}

#[tokio::test]
async fn a_bad_creation_answer_reprompts_without_advancing() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(42);

    let mut player = engine.login("rook").await.expect("login");
    run(&engine, 1, &mut player, "Rook", &mut rng).await;

    let reply = run(&engine, 2, &mut player, "gnome", &mut rng).await;
    assert!(reply.contains("That is no folk known here"), "{}", reply);
    assert!(!player.onboarded());

    // The step is still waiting for a race, not a gender.
    let reply = run(&engine, 3, &mut player, "dwarf", &mut rng).await;
    assert!(reply.contains("male, female, nonbinary, other"), "{}", reply);
}

#[tokio::test]
async fn play_survives_a_process_restart() {
    let dir = TempDir::new().expect("tempdir");
    let mut rng = StdRng::seed_from_u64(43);

    {
        let engine = boot(&dir).await;
        let mut player = PlayerRecord::new("rook", engine.catalog().spawn_room());

        let reply = run(&engine, 1, &mut player, "take copper coin", &mut rng).await;
        assert!(reply.contains("You pick up the"), "{}", reply);
        assert!(player.inventory.contains(&"copper_coin".to_string()));

        run(&engine, 2, &mut player, "south", &mut rng).await;
        assert_eq!(player.location, "tavern");

        engine.save_player(&player).await.expect("save player");
        engine.save_world().await.expect("save world");
    }

    // New process, same data directory.
    let engine = boot(&dir).await;
    let player = engine.login("ROOK").await.expect("login is case-folded");
    assert!(player.onboarded());
    assert_eq!(player.location, "tavern");
    assert!(player.inventory.contains(&"copper_coin".to_string()));

    // The coin left the square for good.
    let items = engine
        .store()
        .room_items("town_square")
        .expect("room items");
    assert!(!items.contains(&"copper_coin".to_string()));
}

#[tokio::test]
async fn admin_weather_override_persists_across_restart() {
    let dir = TempDir::new().expect("tempdir");
    let mut rng = StdRng::seed_from_u64(44);
    let mut config = config_for(&dir);
    config.world.admins = vec!["rook".to_string()];

    {
        let engine = GameEngine::new(&config, Box::new(ScriptedDialogue))
            .await
            .expect("engine boots");
        let mut player = PlayerRecord::new("rook", engine.catalog().spawn_room());
        let reply = run(&engine, 1, &mut player, "set weather rain heavy", &mut rng).await;
        assert!(reply.contains("Weather set to rain (heavy)."), "{}", reply);
        engine.save_world().await.expect("save world");
    }

    let engine = boot(&dir).await;
    let weather = engine.store().weather().expect("weather");
    assert_eq!(weather.weather, WeatherType::Rain);
}

#[tokio::test]
async fn weather_commands_are_refused_without_the_admin_list() {
    let dir = TempDir::new().expect("tempdir");
    let engine = boot(&dir).await;
    let mut rng = StdRng::seed_from_u64(45);
    let mut player = PlayerRecord::new("rook", engine.catalog().spawn_room());

    let reply = run(&engine, 1, &mut player, "set weather snow", &mut rng).await;
    assert!(
        reply.contains("You don't have permission to do that."),
        "{}",
        reply
    );
}

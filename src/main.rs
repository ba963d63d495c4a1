//! Binary entrypoint for the Hollowvale CLI.
//!
//! Commands:
//! - `play <username>` - log into the world from this terminal
//! - `init` - create a starter `config.toml` and the data directory
//! - `snapshot` - summarize the saved world snapshot and player records
//!
//! The binary is a thin single-player shell around the library; it owns
//! stdin, stdout, and process lifetime, and everything else lives in
//! `hollowvale::world`.

use std::io::Write as _;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::AsyncBufReadExt;

use hollowvale::config::Config;
use hollowvale::world::{GameEngine, NullHooks, ScriptedDialogue, SnapshotStore};

#[derive(Parser)]
#[command(name = "hollowvale")]
#[command(about = "A persistent multiplayer text world")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter the world as the named character
    Play {
        /// Character name to log in as
        username: String,
    },
    /// Create a starter configuration file and data directory
    Init,
    /// Summarize the saved world snapshot and player records
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(None, cli.verbose);
            Config::create_default(&cli.config).await?;
            let config = Config::load(&cli.config).await?;
            SnapshotStore::open(config.storage.data_dir.as_str()).await?;
            info!("configuration written to {}", cli.config);
            info!("data directory ready at {}", config.storage.data_dir);
        }
        Commands::Play { username } => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            info!("starting hollowvale v{}", env!("CARGO_PKG_VERSION"));
            let engine = GameEngine::new(&config, Box::new(ScriptedDialogue)).await?;
            play(&engine, &username).await?;
        }
        Commands::Snapshot => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let snapshots = SnapshotStore::open(config.storage.data_dir.as_str()).await?;
            match snapshots.load_world().await? {
                Some(snapshot) => {
                    println!(
                        "world snapshot: saved {}, epoch {}",
                        snapshot.saved_at, snapshot.epoch
                    );
                    println!("  rooms:         {}", snapshot.rooms.len());
                    println!("  npcs:          {}", snapshot.npcs.len());
                    println!("  quest rosters: {}", snapshot.rosters.len());
                }
                None => println!("no world snapshot yet"),
            }
            let names = snapshots.player_names().await?;
            println!("players: {}", names.len());
            for name in names {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

/// Read commands from stdin until the player quits or the stream closes.
/// Each prompt first drains ambient lines that came due while the player
/// sat idle, then runs the command.
async fn play(engine: &GameEngine, username: &str) -> Result<()> {
    let mut player = engine.login(username).await?;
    let mut rng = StdRng::from_entropy();

    println!("Welcome to {}.", engine.catalog().name());
    // A blank line shows the character-creation prompt to a new player;
    // anything else would be swallowed as their answer to it.
    let opening_line = if player.onboarded() { "look" } else { "" };
    let opening = engine
        .execute(&mut player, opening_line, &NullHooks, &mut rng)
        .await?;
    if !opening.is_empty() {
        println!("{}", opening);
    }
    engine.save_player(&player).await?;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }
        for ambient in engine.poll(&mut player, &NullHooks, &mut rng).await? {
            println!("{}", ambient);
        }
        if input.is_empty() {
            continue;
        }
        let reply = engine
            .execute(&mut player, input, &NullHooks, &mut rng)
            .await?;
        if !reply.is_empty() {
            println!("{}", reply);
        }
        engine.save_player(&player).await?;
    }

    engine.save_player(&player).await?;
    engine.save_world().await?;
    println!("Until next time.");
    Ok(())
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let level = match (verbosity, config) {
        (0, Some(cfg)) => cfg
            .logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    builder.format(|fmt, record| {
        writeln!(
            fmt,
            "{} [{}] {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.args()
        )
    });
    let _ = builder.try_init();
}

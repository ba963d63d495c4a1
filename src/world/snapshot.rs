//! Durable world and player state.
//!
//! The recoverable world lives in one pretty-printed JSON document
//! (`world.json`) under the data directory; each player record is its own
//! file under `players/`. Only runtime drift is saved. Everything the seed
//! rebuilds from the catalog stays out, so a snapshot from an older build
//! simply overlays whatever still exists.
//!
//! Writes go to a uniquely named temp file that is renamed over the target
//! while holding an fs2 exclusive lock on the destination, so a crash or a
//! second process mid-write never leaves a torn file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{info, warn};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::errors::WorldError;
use super::store::{RoomRecord, WorldStore};
use super::types::{
    NpcState, PlayerRecord, RosterEntry, WeatherState, PLAYER_SCHEMA_VERSION,
    SNAPSHOT_SCHEMA_VERSION,
};

/// File name of the world document inside the data directory.
pub const WORLD_FILE: &str = "world.json";
const PLAYERS_DIR: &str = "players";

/// On-disk form of the world's runtime drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub schema_version: u8,
    /// Wall-clock instant the snapshot was written.
    pub saved_at: DateTime<Utc>,
    /// Wall-clock instant the world clock counts from. Restored on boot so
    /// the calendar keeps counting from the world's first launch.
    pub epoch: DateTime<Utc>,
    #[serde(default)]
    pub weather: Option<WeatherState>,
    #[serde(default)]
    pub rooms: HashMap<String, RoomRecord>,
    #[serde(default)]
    pub npcs: HashMap<String, NpcState>,
    #[serde(default)]
    pub rosters: HashMap<String, RosterEntry>,
}

/// JSON-file persistence rooted at a data directory.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open the data directory, creating it (and `players/`) on first run.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, WorldError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;
        tokio::fs::create_dir_all(data_dir.join(PLAYERS_DIR)).await?;
        Ok(Self { data_dir })
    }

    pub fn world_path(&self) -> PathBuf {
        self.data_dir.join(WORLD_FILE)
    }

    fn player_path(&self, username: &str) -> PathBuf {
        let safe = utf8_percent_encode(&username.to_lowercase(), NON_ALPHANUMERIC).to_string();
        self.data_dir
            .join(PLAYERS_DIR)
            .join(format!("{}.json", safe))
    }

    /// Capture the store's current state and replace the world document
    /// atomically.
    pub async fn save_world(
        &self,
        store: &WorldStore,
        epoch: DateTime<Utc>,
    ) -> Result<(), WorldError> {
        let snapshot = WorldSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            epoch,
            weather: Some(store.weather()?),
            rooms: store.export_rooms()?,
            npcs: store.export_npcs()?,
            rosters: store.export_rosters()?,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_file_locked(&self.world_path(), &json).await
    }

    /// Read the world document back. `Ok(None)` means no snapshot exists yet.
    /// A document written by a newer build is refused rather than guessed at.
    pub async fn load_world(&self) -> Result<Option<WorldSnapshot>, WorldError> {
        let path = self.world_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let snapshot: WorldSnapshot = serde_json::from_str(&content)?;
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(WorldError::SchemaMismatch {
                entity: "world snapshot",
                expected: SNAPSHOT_SCHEMA_VERSION,
                found: snapshot.schema_version,
            });
        }
        Ok(Some(snapshot))
    }

    /// Overlay the saved world, if any, onto a freshly seeded store. Returns
    /// the epoch recorded in the snapshot. A missing or unreadable snapshot
    /// is logged and leaves the store in its seeded state; the world starts
    /// over rather than refusing to boot.
    pub async fn restore_world(
        &self,
        store: &WorldStore,
    ) -> Result<Option<DateTime<Utc>>, WorldError> {
        match self.load_world().await {
            Ok(Some(snapshot)) => {
                let epoch = snapshot.epoch;
                store.restore(
                    snapshot.rooms,
                    snapshot.npcs,
                    snapshot.rosters,
                    snapshot.weather,
                )?;
                info!("restored world snapshot saved at {}", snapshot.saved_at);
                Ok(Some(epoch))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!("ignoring unreadable world snapshot: {}", err);
                Ok(None)
            }
        }
    }

    pub async fn save_player(&self, player: &PlayerRecord) -> Result<(), WorldError> {
        let json = serde_json::to_string_pretty(player)?;
        write_file_locked(&self.player_path(&player.username), &json).await
    }

    /// Fetch a player record by username. Records from an older build come
    /// back with new fields at their defaults and the version bumped; records
    /// from a newer build are refused.
    pub async fn load_player(&self, username: &str) -> Result<Option<PlayerRecord>, WorldError> {
        let path = self.player_path(username);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let mut record: PlayerRecord = serde_json::from_str(&content)?;
        if record.schema_version > PLAYER_SCHEMA_VERSION {
            return Err(WorldError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        record.schema_version = PLAYER_SCHEMA_VERSION;
        Ok(Some(record))
    }

    /// Usernames with a record on disk, decoded back from their file names.
    pub async fn player_names(&self) -> Result<Vec<String>, WorldError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.data_dir.join(PLAYERS_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let raw = entry.file_name();
            let Some(name) = raw.to_str() else { continue };
            // Skip temp files left behind by an interrupted write.
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            names.push(percent_decode_str(stem).decode_utf8_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }
}

/// Replace `path` with `content` atomically under an exclusive lock.
async fn write_file_locked(path: &Path, content: &str) -> Result<(), WorldError> {
    use std::fs::{self, File, OpenOptions};
    use std::io::Write;

    // fs2 locking is synchronous, so the whole write runs as blocking I/O.
    // Step 1: open (or create) the destination to take the exclusive lock.
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;

    lock_file.lock_exclusive()?;

    // Step 2: write a unique temp file in the same directory.
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("data.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    };

    // Step 3: atomically replace the destination with the temp file.
    fs::rename(&tmp_path, path)?;

    // Step 4: fsync the directory to persist the rename (best-effort).
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }

    // Step 5: unlock by dropping the lock file.
    drop(lock_file);

    Ok(())
}

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::StoreError;
use crate::games::GameKind;

/// Synchronous get/set-by-key store holding one integer per key.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Result<Option<u32>, StoreError>;
    fn set(&mut self, key: &str, value: u32) -> Result<(), StoreError>;
}

/// JSON object on disk, `{ "snake": 12, ... }`, rewritten on every set.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, u32>,
}

impl FileStore {
    /// Loads `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: BTreeMap<String, u32>,
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Per-game best scores backed by a `ScoreStore`.
///
/// Any store failure switches to memory-only for the rest of the session:
/// the player keeps seeing their best score, it just isn't saved.
pub struct HighScores {
    store: Box<dyn ScoreStore>,
    best: BTreeMap<&'static str, u32>,
    persistent: bool,
    /// Track which games have had their score submitted this session
    /// to avoid duplicate submissions
    submitted: [bool; GameKind::COUNT],
}

impl HighScores {
    pub fn new(store: Box<dyn ScoreStore>, persistent: bool) -> Self {
        Self {
            store,
            best: BTreeMap::new(),
            persistent,
            submitted: [false; GameKind::COUNT],
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::<MemoryStore>::default(), false)
    }

    /// Opens the file store, degrading to memory when it can't be read.
    pub fn open(path: &Path) -> Self {
        match FileStore::open(path) {
            Ok(store) => {
                info!("high scores at {}", store.path().display());
                Self::new(Box::new(store), true)
            }
            Err(e) => {
                warn!("{e}; high scores will not be saved this session");
                Self::in_memory()
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Best score for a game, 0 when none was recorded or the game keeps none.
    pub fn best(&mut self, kind: GameKind) -> u32 {
        let Some(key) = kind.score_key() else { return 0 };
        if let Some(&v) = self.best.get(key) {
            return v;
        }
        let value = match self.store.get(key) {
            Ok(v) => v.unwrap_or(0),
            Err(e) => {
                self.degrade(&e);
                0
            }
        };
        self.best.insert(key, value);
        value
    }

    /// Records `score` if it beats the best. Returns true for a new record.
    pub fn submit(&mut self, kind: GameKind, score: u32) -> bool {
        let Some(key) = kind.score_key() else { return false };
        if score == 0 || score <= self.best(kind) {
            return false;
        }
        self.best.insert(key, score);
        info!("new {} high score: {}", kind.title(), score);
        if self.persistent {
            if let Err(e) = self.store.set(key, score) {
                self.degrade(&e);
            }
        }
        true
    }

    fn degrade(&mut self, e: &StoreError) {
        if self.persistent {
            warn!("{e}; high scores will not be saved this session");
        }
        self.persistent = false;
    }

    /// Check if a game score has been submitted this run (to avoid duplicates)
    pub fn was_submitted(&self, kind: GameKind) -> bool {
        self.submitted[kind.index()]
    }

    pub fn mark_submitted(&mut self, kind: GameKind) {
        self.submitted[kind.index()] = true;
    }

    /// Clear submitted flag (called when game resets)
    pub fn clear_submitted(&mut self, kind: GameKind) {
        self.submitted[kind.index()] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_path(tag: &str) -> PathBuf {
        static N: AtomicU32 = AtomicU32::new(0);
        let n = N.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("rustcade-{tag}-{}-{n}.json", std::process::id()))
    }

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<u32>, StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("nowhere"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn set(&mut self, key: &str, _value: u32) -> Result<(), StoreError> {
            self.get(key).map(|_| ())
        }
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let path = temp_path("roundtrip");
        {
            let mut store = FileStore::open(&path).unwrap();
            assert_eq!(store.get("snake").unwrap(), None);
            store.set("snake", 7).unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("snake").unwrap(), Some(7));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_degrades_to_memory() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Parse { .. })));
        let mut hs = HighScores::open(&path);
        assert!(!hs.is_persistent());
        assert!(hs.submit(GameKind::Snake, 3));
        assert_eq!(hs.best(GameKind::Snake), 3);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn only_improvements_are_recorded() {
        let mut hs = HighScores::in_memory();
        assert!(hs.submit(GameKind::WhackAMole, 50));
        assert!(!hs.submit(GameKind::WhackAMole, 50));
        assert!(!hs.submit(GameKind::WhackAMole, 40));
        assert!(hs.submit(GameKind::WhackAMole, 60));
        assert_eq!(hs.best(GameKind::WhackAMole), 60);
    }

    #[test]
    fn games_without_a_key_keep_nothing() {
        let mut hs = HighScores::in_memory();
        assert!(!hs.submit(GameKind::TicTacToe, 3));
        assert_eq!(hs.best(GameKind::TicTacToe), 0);
    }

    #[test]
    fn store_failure_keeps_session_best() {
        let mut hs = HighScores::new(Box::new(BrokenStore), true);
        assert_eq!(hs.best(GameKind::Game2048), 0);
        assert!(!hs.is_persistent());
        assert!(hs.submit(GameKind::Game2048, 128));
        assert_eq!(hs.best(GameKind::Game2048), 128);
    }

    #[test]
    fn submitted_latch() {
        let mut hs = HighScores::in_memory();
        assert!(!hs.was_submitted(GameKind::Snake));
        hs.mark_submitted(GameKind::Snake);
        assert!(hs.was_submitted(GameKind::Snake));
        hs.clear_submitted(GameKind::Snake);
        assert!(!hs.was_submitted(GameKind::Snake));
    }
}

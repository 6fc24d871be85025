//! Session ledger: best score per player
//!
//! The engine only reads a player's best at session start and offers a
//! candidate score when a finished session is reset. Persistence, retries and
//! identity policy belong to the ledger implementation.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, unbounded};
use serde::{Deserialize, Serialize};

/// Opaque player key. The engine never inspects or validates it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[derive(Debug)]
pub enum LedgerError {
    Io { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
    /// Background writer has shut down
    WriterClosed,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "ledger I/O on {}: {}", path.display(), source),
            Self::Serialize(e) => write!(f, "ledger serialization: {}", e),
            Self::WriterClosed => write!(f, "ledger writer is closed"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(e) => Some(e),
            Self::WriterClosed => None,
        }
    }
}

/// Best-score store consumed by the game state machine
pub trait SessionLedger {
    /// Best recorded score for a player (0 if unknown)
    fn get_best(&self, player: &PlayerId) -> u64;

    /// Record `score` if it beats the player's best. A no-op otherwise.
    fn record_if_better(&mut self, player: &PlayerId, score: u64) -> Result<(), LedgerError>;

    /// Best score across all players
    fn all_time_best(&self) -> u64;
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: PlayerId,
    pub score: u64,
}

/// In-memory ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    best: HashMap<PlayerId, u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the score replaced the player's best
    pub fn update(&mut self, player: &PlayerId, score: u64) -> bool {
        let best = self.best.entry(player.clone()).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }

    /// Top `n` players, sorted by score descending then by key
    pub fn leaderboard(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .best
            .iter()
            .filter(|(_, score)| **score > 0)
            .map(|(player, score)| LeaderboardEntry { player: player.clone(), score: *score })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.player.cmp(&b.player)));
        entries.truncate(n);
        entries
    }

    /// Rank a score would take on the leaderboard (1-indexed, None for 0)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        Some(self.best.values().filter(|best| **best >= score).count() + 1)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

impl SessionLedger for MemoryLedger {
    fn get_best(&self, player: &PlayerId) -> u64 {
        self.best.get(player).copied().unwrap_or(0)
    }

    fn record_if_better(&mut self, player: &PlayerId, score: u64) -> Result<(), LedgerError> {
        self.update(player, score);
        Ok(())
    }

    fn all_time_best(&self) -> u64 {
        self.best.values().copied().max().unwrap_or(0)
    }
}

/// Ledger persisted as a JSON object `{ player: best }`
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    scores: MemoryLedger,
}

impl JsonFileLedger {
    /// Open a ledger file. A missing or unreadable-as-JSON file starts fresh.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let scores = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<MemoryLedger>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} ledger entries from {}", scores.len(), path.display());
                    scores
                }
                Err(e) => {
                    log::warn!("Ledger {} is corrupt ({}), starting fresh", path.display(), e);
                    MemoryLedger::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No ledger at {}, starting fresh", path.display());
                MemoryLedger::new()
            }
            Err(source) => return Err(LedgerError::Io { path, source }),
        };
        Ok(Self { path, scores })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scores(&self) -> &MemoryLedger {
        &self.scores
    }

    /// Write `scores` to a sibling temp file, then rename over the ledger
    fn save(&self, scores: &MemoryLedger) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(scores).map_err(LedgerError::Serialize)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|source| LedgerError::Io { path: tmp.clone(), source })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Ledger saved ({} entries)", scores.len());
        Ok(())
    }
}

impl SessionLedger for JsonFileLedger {
    fn get_best(&self, player: &PlayerId) -> u64 {
        self.scores.get_best(player)
    }

    fn record_if_better(&mut self, player: &PlayerId, score: u64) -> Result<(), LedgerError> {
        // The in-memory copy only changes once the file holds the new score
        let mut next = self.scores.clone();
        if next.update(player, score) {
            self.save(&next)?;
            self.scores = next;
        }
        Ok(())
    }

    fn all_time_best(&self) -> u64 {
        self.scores.all_time_best()
    }
}

/// Moves writes of an inner ledger onto a worker thread.
///
/// `record_if_better` queues the write and returns at once. Failed writes are
/// retried up to `retries` times, then logged and dropped. Reads see queued
/// scores immediately.
pub struct BackgroundLedger<L: SessionLedger + Send + 'static> {
    inner: Arc<Mutex<L>>,
    /// Scores queued from this side, visible to reads before the worker lands them
    queued: HashMap<PlayerId, u64>,
    tx: Option<Sender<(PlayerId, u64)>>,
    worker: Option<JoinHandle<()>>,
}

fn lock<L>(inner: &Mutex<L>) -> MutexGuard<'_, L> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<L: SessionLedger + Send + 'static> BackgroundLedger<L> {
    pub fn new(inner: L) -> Self {
        Self::with_retries(inner, 2)
    }

    pub fn with_retries(inner: L, retries: u32) -> Self {
        let inner = Arc::new(Mutex::new(inner));
        let (tx, rx) = unbounded::<(PlayerId, u64)>();
        let shared = Arc::clone(&inner);

        let worker = std::thread::spawn(move || {
            for (player, score) in rx {
                let mut attempt = 0;
                loop {
                    match lock(&shared).record_if_better(&player, score) {
                        Ok(()) => break,
                        Err(e) if attempt < retries => {
                            attempt += 1;
                            log::warn!("Ledger write for {} failed ({}), retry {}", player, e, attempt);
                        }
                        Err(e) => {
                            log::error!("Dropping score {} for {}: {}", score, player, e);
                            break;
                        }
                    }
                }
            }
            log::debug!("Ledger writer stopped");
        });

        Self {
            inner,
            queued: HashMap::new(),
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Wait for queued writes and hand back the inner ledger
    pub fn into_inner(mut self) -> Arc<Mutex<L>> {
        self.shutdown();
        Arc::clone(&self.inner)
    }

    fn shutdown(&mut self) {
        self.tx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Ledger writer panicked");
            }
        }
    }
}

impl<L: SessionLedger + Send + 'static> SessionLedger for BackgroundLedger<L> {
    fn get_best(&self, player: &PlayerId) -> u64 {
        let stored = lock(&self.inner).get_best(player);
        stored.max(self.queued.get(player).copied().unwrap_or(0))
    }

    fn record_if_better(&mut self, player: &PlayerId, score: u64) -> Result<(), LedgerError> {
        let tx = self.tx.as_ref().ok_or(LedgerError::WriterClosed)?;
        tx.send((player.clone(), score))
            .map_err(|_| LedgerError::WriterClosed)?;
        let queued = self.queued.entry(player.clone()).or_insert(0);
        *queued = (*queued).max(score);
        Ok(())
    }

    fn all_time_best(&self) -> u64 {
        let stored = lock(&self.inner).all_time_best();
        stored.max(self.queued.values().copied().max().unwrap_or(0))
    }
}

impl<L: SessionLedger + Send + 'static> Drop for BackgroundLedger<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! JSON persistence for game sessions behind a key-value store boundary.
//!
//! Wire format (matching the payload the original game kept in its host
//! store): `{ "board": N x N array, "score": int, "undo": [{board, score}] }`.
//! Decoding validates shape and tile values; anything malformed is rejected
//! and the caller falls back to a fresh game instead of crashing.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::Grid;
use crate::game::Game;
use crate::history::HistoryEntry;

/// Fixed identifier under which the running game is stored.
pub const SAVE_KEY: &str = "twenty48-save";

/// One undo entry on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntry {
    pub board: Vec<Vec<u32>>,
    pub score: u64,
}

/// A full session on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub board: Vec<Vec<u32>>,
    pub score: u64,
    pub undo: Vec<SavedEntry>,
}

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("malformed save payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("board is not {expected}x{expected}")]
    Dimensions { expected: usize },
    #[error("tile value {0} is not zero or a power of two")]
    TileValue(u32),
}

/// Key-value persistence boundary: a store the host session hands the
/// engine, read once at startup and written on save.
pub trait Store {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()>;
}

/// In-memory store, used in tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: HashMap<String, Vec<u8>>,
}

impl Store for MemStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One file per key under a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        fs::write(self.path(key), value)
    }
}

/// Serialize a session to wire bytes.
pub fn encode(game: &Game) -> Result<Vec<u8>, PersistError> {
    let saved = SavedGame {
        board: game.grid().to_rows(),
        score: game.score(),
        undo: game
            .history()
            .iter()
            .map(|entry| SavedEntry {
                board: entry.grid.to_rows(),
                score: entry.score,
            })
            .collect(),
    };
    Ok(serde_json::to_vec(&saved)?)
}

/// Deserialize and validate a session. Every board in the payload, undo
/// entries included, must be `expected` x `expected` with cells that are
/// zero or a power of two >= 2.
pub fn decode(bytes: &[u8], expected: usize) -> Result<Game, PersistError> {
    let saved: SavedGame = serde_json::from_slice(bytes)?;
    let grid = validated_grid(&saved.board, expected)?;
    let mut undo = Vec::with_capacity(saved.undo.len());
    for entry in &saved.undo {
        undo.push(HistoryEntry {
            grid: validated_grid(&entry.board, expected)?,
            score: entry.score,
        });
    }
    Ok(Game::resume(grid, saved.score, undo))
}

fn validated_grid(rows: &[Vec<u32>], expected: usize) -> Result<Grid, PersistError> {
    if rows.len() != expected {
        return Err(PersistError::Dimensions { expected });
    }
    let grid = Grid::from_rows(rows).ok_or(PersistError::Dimensions { expected })?;
    for row in grid.rows() {
        for &v in row {
            if v != 0 && !(v >= 2 && v.is_power_of_two()) {
                return Err(PersistError::TileValue(v));
            }
        }
    }
    Ok(grid)
}

/// Load the session stored under `key`, falling back to a fresh `n` x `n`
/// game when the key is absent or the payload does not validate. Never
/// propagates a failure. `n` must be positive, as for [`Game::new`].
pub fn load_or_start(store: &impl Store, key: &str, n: usize) -> Game {
    match store.get(key) {
        None => Game::new(n),
        Some(bytes) => match decode(&bytes, n) {
            Ok(game) => game,
            Err(err) => {
                warn!(%err, key, "discarding saved game, starting fresh");
                Game::new(n)
            }
        },
    }
}

/// Write the session under `key`. A store failure (quota, disabled store)
/// is logged and swallowed; the game continues in memory.
pub fn save(store: &mut impl Store, key: &str, game: &Game) {
    let bytes = match encode(game) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, key, "could not encode save payload");
            return;
        }
    };
    if let Err(err) = store.set(key, &bytes) {
        warn!(%err, key, "store rejected write, continuing in memory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Move;

    fn played_game() -> Game {
        let mut game = Game::with_seed(4, 17);
        for dir in [Move::Left, Move::Up, Move::Right, Move::Down, Move::Left] {
            game.make_move(dir);
        }
        game
    }

    fn assert_same_session(a: &Game, b: &Game) {
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.history().len(), b.history().len());
        for (x, y) in a.history().iter().zip(b.history().iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn round_trip_preserves_grid_score_and_history() {
        let game = played_game();
        let bytes = encode(&game).unwrap();
        let loaded = decode(&bytes, 4).unwrap();
        assert_same_session(&game, &loaded);
    }

    #[test]
    fn decode_rejects_wrong_dimensions() {
        let saved = SavedGame {
            board: vec![vec![2, 0, 0]; 3],
            score: 0,
            undo: Vec::new(),
        };
        let bytes = serde_json::to_vec(&saved).unwrap();
        assert!(matches!(
            decode(&bytes, 4),
            Err(PersistError::Dimensions { expected: 4 })
        ));
    }

    #[test]
    fn decode_rejects_invalid_tile_values() {
        for bad in [1u32, 3, 6, 100] {
            let mut board = vec![vec![0u32; 4]; 4];
            board[1][2] = bad;
            let saved = SavedGame {
                board,
                score: 0,
                undo: Vec::new(),
            };
            let bytes = serde_json::to_vec(&saved).unwrap();
            assert!(matches!(
                decode(&bytes, 4),
                Err(PersistError::TileValue(v)) if v == bad
            ));
        }
    }

    #[test]
    fn decode_validates_undo_entries_too() {
        let saved = SavedGame {
            board: vec![vec![0u32; 4]; 4],
            score: 0,
            undo: vec![SavedEntry {
                board: vec![vec![0u32; 2]; 2],
                score: 0,
            }],
        };
        let bytes = serde_json::to_vec(&saved).unwrap();
        assert!(decode(&bytes, 4).is_err());
    }

    #[test]
    fn loaded_ceiling_tiles_survive_moves_without_panicking() {
        // 2^31 passes validation (it is a power of two), and doubling it
        // would overflow a cell; moves on such a board must stay benign.
        let top = 1u32 << 31;
        let mut board = vec![vec![0u32; 4]; 4];
        board[0][1] = top;
        board[0][3] = top;
        let saved = SavedGame {
            board,
            score: 0,
            undo: Vec::new(),
        };
        let bytes = serde_json::to_vec(&saved).unwrap();
        let mut game = decode(&bytes, 4).unwrap();

        // First left slides the pair together without merging...
        let slid = game.make_move(Move::Left);
        assert_eq!(slid.grid.get(0, 0), top);
        assert_eq!(slid.grid.get(0, 1), top);
        // ...and no merge means no points from the pair.
        assert_eq!(slid.score, 0);

        // Repeating the move keeps the pair intact, crash-free.
        let again = game.make_move(Move::Left);
        assert_eq!(again.grid.get(0, 0), top);
        assert_eq!(again.grid.get(0, 1), top);
    }

    #[test]
    fn decode_rejects_junk_bytes() {
        assert!(matches!(
            decode(b"not json at all", 4),
            Err(PersistError::Json(_))
        ));
    }

    #[test]
    fn decode_recomputes_game_over_status() {
        let saved = SavedGame {
            board: vec![
                vec![2, 4, 2, 4],
                vec![4, 2, 4, 2],
                vec![2, 4, 2, 4],
                vec![4, 2, 4, 2],
            ],
            score: 500,
            undo: Vec::new(),
        };
        let bytes = serde_json::to_vec(&saved).unwrap();
        let game = decode(&bytes, 4).unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.score(), 500);
    }

    #[test]
    fn load_or_start_falls_back_on_missing_or_bad_payloads() {
        let mut store = MemStore::default();
        let fresh = load_or_start(&store, SAVE_KEY, 4);
        assert_eq!(fresh.score(), 0);
        assert_eq!(fresh.grid().size(), 4);

        store.set(SAVE_KEY, b"{\"board\": \"oops\"}").unwrap();
        let recovered = load_or_start(&store, SAVE_KEY, 4);
        assert_eq!(recovered.score(), 0);
        assert!(!recovered.is_game_over());
    }

    #[test]
    fn save_then_load_through_mem_store() {
        let game = played_game();
        let mut store = MemStore::default();
        save(&mut store, SAVE_KEY, &game);
        let loaded = load_or_start(&store, SAVE_KEY, 4);
        assert_same_session(&game, &loaded);
    }

    #[test]
    fn save_then_load_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let game = played_game();
        let mut store = FileStore::new(dir.path());
        save(&mut store, SAVE_KEY, &game);
        let loaded = load_or_start(&store, SAVE_KEY, 4);
        assert_same_session(&game, &loaded);
    }

    #[test]
    fn save_swallows_store_failure() {
        struct BrokenStore;
        impl Store for BrokenStore {
            fn get(&self, _key: &str) -> Option<Vec<u8>> {
                None
            }
            fn set(&mut self, _key: &str, _value: &[u8]) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::Other, "quota exceeded"))
            }
        }
        let game = played_game();
        let mut store = BrokenStore;
        // Must not panic or propagate; the session continues in memory.
        save(&mut store, SAVE_KEY, &game);
    }
}

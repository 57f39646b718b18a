use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::engine::{self, Grid, Move, DEFAULT_SIZE};
use crate::history::{History, HistoryEntry};

/// Lifecycle state of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    GameOver,
}

/// Render-ready copy of the current state, returned by every public
/// operation. Fully materialized; mutating the game afterwards does not
/// touch a snapshot already handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: u64,
    pub game_over: bool,
}

/// The single mutable root of one play session: grid, score, undo history,
/// status, and the seeded RNG feeding tile spawns.
///
/// All operations run to completion synchronously; a multi-actor host wraps
/// the whole value in a mutex and treats each call as atomic.
pub struct Game {
    grid: Grid,
    score: u64,
    history: History,
    status: Status,
    rng: StdRng,
}

impl Game {
    /// Fresh game: empty history, score 0, two spawned tiles.
    ///
    /// `n` must be positive; a zero-sized board panics at construction.
    pub fn new(n: usize) -> Self {
        Self::from_rng(n, StdRng::from_entropy())
    }

    /// Fresh game with a deterministic spawn sequence. `n` must be positive.
    pub fn with_seed(n: usize, seed: u64) -> Self {
        Self::from_rng(n, StdRng::seed_from_u64(seed))
    }

    fn from_rng(n: usize, rng: StdRng) -> Self {
        let mut game = Game {
            grid: Grid::new(n),
            score: 0,
            history: History::new(),
            status: Status::Playing,
            rng,
        };
        game.spawn();
        game.spawn();
        game
    }

    /// Rebuild a session from persisted parts. The caller (the persist
    /// module) has already validated the grids; status is recomputed since
    /// the wire format does not carry it.
    pub fn resume(grid: Grid, score: u64, undo: Vec<HistoryEntry>) -> Self {
        let status = if engine::has_move_available(&grid) {
            Status::Playing
        } else {
            Status::GameOver
        };
        let mut history = History::new();
        for entry in undo {
            history.save(&entry.grid, entry.score);
        }
        Game {
            grid,
            score,
            history,
            status,
            rng: StdRng::from_entropy(),
        }
    }

    fn spawn(&mut self) -> bool {
        engine::spawn_tile(&mut self.grid, &mut self.rng)
    }

    /// Attempt a move. A direction that changes nothing is a defined no-op:
    /// score, history, and status stay exactly as they were.
    pub fn make_move(&mut self, direction: Move) -> Snapshot {
        if self.status == Status::GameOver {
            return self.snapshot();
        }
        self.history.save(&self.grid, self.score);
        let outcome = engine::shift(&self.grid, direction);
        if !outcome.changed {
            self.history.discard_last();
            return self.snapshot();
        }
        self.grid = outcome.grid;
        self.score += outcome.gained;
        // Spawn can only fail when the board is simultaneously full and
        // immovable; the terminal check below handles that case.
        self.spawn();
        if !engine::has_move_available(&self.grid) {
            debug!(score = self.score, "no move available, game over");
            self.status = Status::GameOver;
        }
        self.snapshot()
    }

    /// Revert to the state before the most recent changed move. Undo on an
    /// empty history is a no-op; undoing out of game over resumes play,
    /// since the restored board predates the terminal position.
    pub fn undo(&mut self) -> Snapshot {
        if let Some(HistoryEntry { grid, score }) = self.history.pop() {
            self.grid = grid;
            self.score = score;
            self.status = Status::Playing;
        }
        self.snapshot()
    }

    /// Reset to a fresh game, keeping the board size and RNG.
    pub fn restart(&mut self) -> Snapshot {
        debug!("restart");
        self.history.clear();
        self.score = 0;
        self.grid = Grid::new(self.grid.size());
        self.status = Status::Playing;
        self.spawn();
        self.spawn();
        self.snapshot()
    }

    /// Read-only copy of the current state, for the initial render.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            score: self.score,
            game_over: self.status == Status::GameOver,
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.status == Status::GameOver
    }

    pub(crate) fn history(&self) -> &History {
        &self.history
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new(DEFAULT_SIZE)
    }
}

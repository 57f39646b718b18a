//! twenty48-engine: the rule engine of a sliding-tile merge puzzle.
//!
//! This crate provides:
//! - Pure board logic (`engine` module): the compress/merge pass,
//!   rotation-based direction handling, tile spawning, terminal detection
//! - A `Game` orchestrator (`game` module) with bounded undo (`history`)
//! - JSON persistence behind a key-value store boundary (`persist`)
//!
//! Rendering and input handling are not part of this crate; a UI layer calls
//! the public operations and draws the returned snapshots.
//!
//! Quick start:
//! ```
//! use twenty48_engine::engine::Move;
//! use twenty48_engine::game::Game;
//!
//! // Deterministic game with a seeded RNG
//! let mut game = Game::with_seed(4, 42);
//! let snap = game.make_move(Move::Left);
//! assert_eq!(snap.grid.size(), 4);
//! assert!(!snap.game_over);
//! ```
//!
//! Note: every operation is a pure function of its inputs except tile
//! spawning, which draws from the RNG injected at construction. Prefer
//! `Game::with_seed` when you need reproducibility.

pub mod engine;
pub mod game;
pub mod history;
pub mod persist;

//! LLM Chess Library
//!
//! Keeps a rules authority, a piece layout of stable entities and a move
//! history in agreement while moves arrive from clicks, typed coordinates or
//! language-model suggestions.

pub mod board;
pub mod error;
pub mod game;
pub mod oracle;
pub mod pgn;

pub use board::{CoordinateMove, MoveDescriptor, PieceLayout, Square};
pub use error::{ChessError, Result};
pub use game::{GameSession, RulesAuthority, ShakmatyRules};
pub use oracle::{GeminiOracle, MoveOracle, MoveSuggestionClient};

use std::io;

use thiserror::Error;

use crate::board::Square;

/// Errors produced by the board, game and oracle layers
#[derive(Debug, Error)]
pub enum ChessError {
    /// Compact board notation violates the rank grammar
    #[error("malformed notation: {0}")]
    MalformedNotation(String),

    /// The piece layout no longer matches the rules authority's position.
    /// Recovered internally by a full resync; callers normally only see it in logs.
    #[error("piece layout out of sync at {square}: {reason}")]
    DesyncDetected { square: Square, reason: String },

    #[error("illegal move {from}{to}")]
    IllegalMoveRejected { from: Square, to: Square },

    #[error("position rejected: {0}")]
    PositionRejected(String),

    #[error("API key is missing")]
    MissingCredential,

    #[error("invalid move format received: {0:?}")]
    InvalidSuggestionFormat(String),

    #[error("move suggestion unavailable: {0}")]
    SuggestionUnavailable(String),

    #[error("a move suggestion is already in progress")]
    SuggestionInFlight,

    #[error("the game is over")]
    GameOver,

    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    #[error("invalid coordinate move: {0:?}")]
    InvalidMove(String),

    #[error("settings file error: {0}")]
    SettingsIo(#[from] io::Error),

    #[error("settings format error: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChessError>;

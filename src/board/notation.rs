//! Compact board notation codec.
//!
//! The notation is the piece-placement field of a FEN string: eight ranks
//! separated by `/`, rank 8 first. Each rank is a run of piece letters
//! (uppercase white, lowercase black) and digits counting empty squares.

use std::collections::BTreeSet;

use super::square::{Piece, Square};
use crate::error::{ChessError, Result};

pub const STARTING_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const RANK_DELIMITER: char = '/';

/// Structured 8x8 board, indexed by (row, col) with row 0 = rank 8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    pub fn empty() -> Self {
        Board { squares: [[None; 8]; 8] }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.row() as usize][square.col() as usize]
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.row() as usize][square.col() as usize] = piece;
    }

    /// Occupied squares with their pieces, in notation order
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| self.piece_at(square).map(|piece| (square, piece)))
    }

    pub fn occupied_squares(&self) -> BTreeSet<Square> {
        self.pieces().map(|(square, _)| square).collect()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

/// Extract the placement field from a full FEN string (or return a bare placement unchanged)
pub fn placement_field(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap_or("")
}

/// Parse a compact placement string into a board.
///
/// Digits must be 1-8 and may not be adjacent, so that every accepted string
/// is the canonical encoding of its board.
pub fn decode(notation: &str) -> Result<Board> {
    let ranks: Vec<&str> = notation.split(RANK_DELIMITER).collect();
    if ranks.len() != 8 {
        return Err(ChessError::MalformedNotation(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    let mut board = Board::empty();
    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0usize;
        let mut previous_was_digit = false;

        for c in rank.chars() {
            if let Some(run) = c.to_digit(10) {
                if !(1..=8).contains(&run) {
                    return Err(ChessError::MalformedNotation(format!(
                        "invalid empty-square count '{}' in rank {}",
                        c,
                        8 - row
                    )));
                }
                if previous_was_digit {
                    return Err(ChessError::MalformedNotation(format!(
                        "adjacent empty-square counts in rank {}",
                        8 - row
                    )));
                }
                col += run as usize;
                previous_was_digit = true;
            } else if let Some(piece) = Piece::from_char(c) {
                if col >= 8 {
                    return Err(ChessError::MalformedNotation(format!(
                        "rank {} is longer than 8 squares",
                        8 - row
                    )));
                }
                board.squares[row][col] = Some(piece);
                col += 1;
                previous_was_digit = false;
            } else {
                return Err(ChessError::MalformedNotation(format!(
                    "unexpected character '{}' in rank {}",
                    c,
                    8 - row
                )));
            }
        }

        if col != 8 {
            return Err(ChessError::MalformedNotation(format!(
                "rank {} covers {} squares, expected 8",
                8 - row,
                col
            )));
        }
    }

    Ok(board)
}

/// Serialize a board into its canonical compact placement string
pub fn encode(board: &Board) -> String {
    let mut out = String::with_capacity(64);

    for (row, rank) in board.squares.iter().enumerate() {
        if row > 0 {
            out.push(RANK_DELIMITER);
        }

        let mut empty = 0u8;
        for square in rank {
            match square {
                Some(piece) => {
                    if empty > 0 {
                        out.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push((b'0' + empty) as char);
        }
    }

    out
}

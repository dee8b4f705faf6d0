//! Committed-move descriptors and coordinate move notation
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::square::{Color, PieceKind, Square};
use crate::error::ChessError;

bitflags! {
    /// Special semantics of a committed move
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MoveFlags: u8 {
        /// Captures the piece standing on the destination square
        const CAPTURE = 1 << 0;
        /// Pawn capture where the captured pawn sits beside the destination
        const EN_PASSANT = 1 << 1;
        const KINGSIDE_CASTLE = 1 << 2;
        const QUEENSIDE_CASTLE = 1 << 3;
        const PROMOTION = 1 << 4;
        /// Pawn advanced two squares from its starting rank
        const DOUBLE_PAWN_PUSH = 1 << 5;
    }
}

impl MoveFlags {
    pub fn is_castle(self) -> bool {
        self.intersects(MoveFlags::KINGSIDE_CASTLE | MoveFlags::QUEENSIDE_CASTLE)
    }
}

/// Result of a move accepted by the rules authority.
///
/// Castles are described by the king's origin and destination squares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub color: Color,
    pub promotion: Option<PieceKind>,
    pub captured: Option<PieceKind>,
    pub flags: MoveFlags,
    /// Standard algebraic notation, including check suffixes
    pub san: String,
}

impl MoveDescriptor {
    /// Square of the captured piece, if any
    pub fn capture_square(&self) -> Option<Square> {
        if self.flags.contains(MoveFlags::EN_PASSANT) {
            Square::new(self.from.row(), self.to.col()).ok()
        } else if self.flags.contains(MoveFlags::CAPTURE) {
            Some(self.to)
        } else {
            None
        }
    }

    pub fn to_coordinate(&self) -> CoordinateMove {
        CoordinateMove {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

/// Origin, destination and optional promotion, as in `e2e4` or `e7e8q`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl CoordinateMove {
    pub fn new(from: Square, to: Square) -> Self {
        CoordinateMove { from, to, promotion: None }
    }

    pub fn with_promotion(mut self, promotion: Option<PieceKind>) -> Self {
        self.promotion = promotion;
        self
    }
}

impl FromStr for CoordinateMove {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !(s.len() == 4 || s.len() == 5) || !s.is_ascii() {
            return Err(ChessError::InvalidMove(s.to_string()));
        }

        let from = Square::from_algebraic(&s[0..2]).map_err(|_| ChessError::InvalidMove(s.to_string()))?;
        let to = Square::from_algebraic(&s[2..4]).map_err(|_| ChessError::InvalidMove(s.to_string()))?;

        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c @ ('q' | 'r' | 'b' | 'n')) => PieceKind::from_char(c),
            Some(_) => return Err(ChessError::InvalidMove(s.to_string())),
        };

        Ok(CoordinateMove { from, to, promotion })
    }
}

impl fmt::Display for CoordinateMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut text = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion {
            text.push(kind.to_char());
        }
        f.pad(&text)
    }
}

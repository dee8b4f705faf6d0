//! Square, color and piece identity shared by the codec, the layout and the game layer
//!
//! Orientation: row 0 is rank 8 (the first rank listed in the compact notation),
//! row 7 is rank 1. Column 0 is the a-file, column 7 the h-file.

use std::fmt;
use std::str::FromStr;

use crate::error::ChessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Result<Square, ChessError> {
        if row >= 8 || col >= 8 {
            return Err(ChessError::InvalidSquare(format!("row={}, col={}", row, col)));
        }
        Ok(Square { row, col })
    }

    /// Build a square from indices already known to be in range
    pub(crate) fn from_indices(row: u8, col: u8) -> Square {
        debug_assert!(row < 8 && col < 8);
        Square { row: row & 7, col: col & 7 }
    }

    pub fn from_algebraic(notation: &str) -> Result<Square, ChessError> {
        let bytes = notation.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(notation.to_string()));
        }

        let col = match bytes[0] {
            b'a'..=b'h' => bytes[0] - b'a',
            _ => return Err(ChessError::InvalidSquare(notation.to_string())),
        };

        let rank = match bytes[1] {
            b'1'..=b'8' => bytes[1] - b'1',
            _ => return Err(ChessError::InvalidSquare(notation.to_string())),
        };

        Ok(Square { row: 7 - rank, col })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Zero-based rank index, 0 = rank 1
    pub fn rank_index(self) -> u8 {
        7 - self.row
    }

    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.col) as char;
        let rank = (b'1' + self.rank_index()) as char;
        format!("{}{}", file, rank)
    }

    /// All 64 squares in notation order (rank 8 first, a-file first)
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    /// Lowercase letter used in notation and promotion suffixes
    pub fn to_char(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PieceKind::King => "King",
            PieceKind::Queen => "Queen",
            PieceKind::Rook => "Rook",
            PieceKind::Bishop => "Bishop",
            PieceKind::Knight => "Knight",
            PieceKind::Pawn => "Pawn",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    /// Notation letter: uppercase for white, lowercase for black
    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece { kind, color })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_creation() {
        let square = Square::from_algebraic("e4").unwrap();
        assert_eq!(square.col(), 4);
        assert_eq!(square.row(), 4);
        assert_eq!(square.rank_index(), 3);
        assert_eq!(square.to_algebraic(), "e4");
    }

    #[test]
    fn test_orientation_corners() {
        assert_eq!(Square::from_algebraic("a8").unwrap(), Square::new(0, 0).unwrap());
        assert_eq!(Square::from_algebraic("h1").unwrap(), Square::new(7, 7).unwrap());
    }

    #[test]
    fn test_algebraic_is_bijective() {
        let mut seen = std::collections::HashSet::new();
        for square in Square::all() {
            let label = square.to_algebraic();
            assert_eq!(Square::from_algebraic(&label).unwrap(), square);
            assert!(seen.insert(label));
        }
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_invalid_squares() {
        assert!(Square::from_algebraic("i1").is_err());
        assert!(Square::from_algebraic("a9").is_err());
        assert!(Square::from_algebraic("e").is_err());
        assert!(Square::new(8, 0).is_err());
    }

    #[test]
    fn test_piece_letters() {
        let white_knight = Piece::from_char('N').unwrap();
        assert_eq!(white_knight, Piece::new(PieceKind::Knight, Color::White));
        assert_eq!(white_knight.to_char(), 'N');
        assert_eq!(Piece::from_char('q').unwrap().color, Color::Black);
        assert!(Piece::from_char('x').is_none());
    }
}

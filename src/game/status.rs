use std::fmt;

use crate::board::Color;

/// Game state summary shown next to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress { turn: Color, in_check: bool },
    Checkmate { winner: Color },
    /// Stalemate, insufficient material or another drawn ending
    Draw,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::InProgress { .. })
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameStatus::Checkmate { .. } => write!(f, "Checkmate!"),
            GameStatus::Draw => write!(f, "Stalemate / Draw"),
            GameStatus::InProgress { turn, in_check } => {
                write!(f, "{}'s Turn", turn)?;
                if *in_check {
                    write!(f, " (Check!)")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let white = GameStatus::InProgress { turn: Color::White, in_check: false };
        assert_eq!(white.to_string(), "White's Turn");

        let black_check = GameStatus::InProgress { turn: Color::Black, in_check: true };
        assert_eq!(black_check.to_string(), "Black's Turn (Check!)");

        assert_eq!(GameStatus::Checkmate { winner: Color::White }.to_string(), "Checkmate!");
        assert_eq!(GameStatus::Draw.to_string(), "Stalemate / Draw");
        assert!(GameStatus::Draw.is_over());
        assert!(!white.is_over());
    }
}

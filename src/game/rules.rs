//! Rules authority: the single owner and mutator of the canonical game state.
//!
//! The rest of the crate only reads position snapshots and move descriptors
//! through [`RulesAuthority`]. [`ShakmatyRules`] implements it on top of the
//! `shakmaty` move generator.

use log::debug;
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Rank, Role};

use super::status::GameStatus;
use crate::board::{Color, MoveDescriptor, MoveFlags, Piece, PieceKind, Square};
use crate::error::{ChessError, Result};

pub trait RulesAuthority {
    /// Full FEN of the current position
    fn current_position(&self) -> String;

    fn current_turn(&self) -> Color;

    fn is_game_over(&self) -> bool;

    fn in_check(&self) -> bool;

    /// SAN of every move played since the last reset or load
    fn history_entries(&self) -> &[String];

    /// Legal moves starting on `square`; empty when the square is empty,
    /// holds an opponent piece, or the piece cannot move
    fn legal_moves(&self, square: Square) -> Vec<MoveDescriptor>;

    /// Commit a move. Fails with [`ChessError::IllegalMoveRejected`] and leaves
    /// the position untouched when no legal move matches.
    fn commit_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> Result<MoveDescriptor>;

    fn reset(&mut self);

    fn load_position(&mut self, notation: &str) -> Result<()>;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn status(&self) -> GameStatus {
        let turn = self.current_turn();
        if !self.is_game_over() {
            GameStatus::InProgress {
                turn,
                in_check: self.in_check(),
            }
        } else if self.in_check() {
            GameStatus::Checkmate { winner: turn.opposite() }
        } else {
            GameStatus::Draw
        }
    }
}

/// Standard chess rules backed by `shakmaty`
#[derive(Debug, Clone, Default)]
pub struct ShakmatyRules {
    position: Chess,
    history: Vec<String>,
}

impl ShakmatyRules {
    pub fn new() -> Self {
        ShakmatyRules {
            position: Chess::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut rules = ShakmatyRules::new();
        rules.load_position(fen)?;
        Ok(rules)
    }

    fn describe(&self, m: &Move) -> Option<MoveDescriptor> {
        let color = color_from_shakmaty(self.position.turn());

        let (from, to, piece, captured, promotion, flags) = match m {
            Move::Normal {
                role,
                from,
                capture,
                to,
                promotion,
            } => {
                let mut flags = MoveFlags::empty();
                if capture.is_some() {
                    flags |= MoveFlags::CAPTURE;
                }
                if promotion.is_some() {
                    flags |= MoveFlags::PROMOTION;
                }
                let from = square_from_shakmaty(*from);
                let to = square_from_shakmaty(*to);
                if *role == Role::Pawn && from.row().abs_diff(to.row()) == 2 {
                    flags |= MoveFlags::DOUBLE_PAWN_PUSH;
                }
                (
                    from,
                    to,
                    kind_from_role(*role),
                    capture.map(kind_from_role),
                    promotion.map(kind_from_role),
                    flags,
                )
            }
            Move::EnPassant { from, to } => (
                square_from_shakmaty(*from),
                square_from_shakmaty(*to),
                PieceKind::Pawn,
                Some(PieceKind::Pawn),
                None,
                MoveFlags::EN_PASSANT,
            ),
            Move::Castle { king, rook } => {
                let kingside = (rook.file() as u8) > (king.file() as u8);
                let (file, flag) = if kingside {
                    (File::G, MoveFlags::KINGSIDE_CASTLE)
                } else {
                    (File::C, MoveFlags::QUEENSIDE_CASTLE)
                };
                (
                    square_from_shakmaty(*king),
                    square_from_shakmaty(shakmaty::Square::from_coords(file, king.rank())),
                    PieceKind::King,
                    None,
                    None,
                    flag,
                )
            }
            Move::Put { .. } => return None,
        };

        let mut scratch = self.position.clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut scratch, m).to_string();

        Some(MoveDescriptor {
            from,
            to,
            piece,
            color,
            promotion,
            captured,
            flags,
            san,
        })
    }
}

impl RulesAuthority for ShakmatyRules {
    fn current_position(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    fn current_turn(&self) -> Color {
        color_from_shakmaty(self.position.turn())
    }

    fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    fn in_check(&self) -> bool {
        self.position.is_check()
    }

    fn history_entries(&self) -> &[String] {
        &self.history
    }

    fn legal_moves(&self, square: Square) -> Vec<MoveDescriptor> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| self.describe(m))
            .filter(|d| d.from == square)
            .collect()
    }

    fn commit_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> Result<MoveDescriptor> {
        let legal = self.position.legal_moves();
        let chosen = legal.iter().find(|m| {
            let Some(d) = self.describe(m) else {
                return false;
            };
            if d.from != from || d.to != to {
                return false;
            }
            // A promotion letter on a non-promotion move is ignored; an
            // unspecified promotion defaults to a queen.
            match (d.promotion, promotion) {
                (None, _) => true,
                (Some(kind), Some(requested)) => kind == requested,
                (Some(kind), None) => kind == PieceKind::Queen,
            }
        });

        let m = chosen.ok_or(ChessError::IllegalMoveRejected { from, to })?.clone();
        let descriptor = self.describe(&m).ok_or(ChessError::IllegalMoveRejected { from, to })?;

        self.position.play_unchecked(&m);
        self.history.push(descriptor.san.clone());
        debug!("Committed {} ({})", descriptor.to_coordinate(), descriptor.san);

        Ok(descriptor)
    }

    fn reset(&mut self) {
        self.position = Chess::default();
        self.history.clear();
    }

    fn load_position(&mut self, notation: &str) -> Result<()> {
        let fen: Fen = notation
            .trim()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| ChessError::PositionRejected(e.to_string()))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| ChessError::PositionRejected(e.to_string()))?;

        self.position = position;
        self.history.clear();
        Ok(())
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position
            .board()
            .piece_at(square_to_shakmaty(square))
            .map(|p| Piece::new(kind_from_role(p.role), color_from_shakmaty(p.color)))
    }
}

pub fn square_to_shakmaty(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(square.col())),
        Rank::new(u32::from(square.rank_index())),
    )
}

pub fn square_from_shakmaty(square: shakmaty::Square) -> Square {
    let rank = square.rank() as u8;
    let file = square.file() as u8;
    Square::from_indices(7 - rank, file)
}

fn color_from_shakmaty(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn kind_from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

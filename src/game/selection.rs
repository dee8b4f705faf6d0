//! Selection and interaction controller.
//!
//! Tracks the selected square and the legal destinations highlighted for it.
//! Candidates are always computed against the current position; any committed
//! move clears them.

use std::collections::BTreeSet;

use log::debug;

use super::rules::RulesAuthority;
use crate::board::{CoordinateMove, MoveDescriptor, PieceKind, PieceLayout, Square};
use crate::error::{ChessError, Result};

/// What a square click did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click completed a move that the rules authority accepted
    Moved(MoveDescriptor),
    /// The click completed a move that the rules authority declined
    Rejected { from: Square, to: Square },
    /// A piece of the side to move is now selected
    Selected { square: Square, destinations: usize },
    /// Any previous selection was dropped
    Cleared,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<Square>,
    candidates: Vec<MoveDescriptor>,
}

impl SelectionController {
    pub fn new() -> Self {
        SelectionController {
            selected: None,
            candidates: Vec::new(),
        }
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn candidates(&self) -> &[MoveDescriptor] {
        &self.candidates
    }

    /// Highlighted destination squares, one per square even when several
    /// promotion choices share it
    pub fn destinations(&self) -> Vec<Square> {
        let squares: BTreeSet<Square> = self.candidates.iter().map(|c| c.to).collect();
        squares.into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.candidates.clear();
    }

    /// The move a click on `square` would submit, if any.
    ///
    /// When several candidates share the destination (promotion choices) the
    /// queen promotion is preferred.
    pub fn pending_move(&self, square: Square) -> Option<CoordinateMove> {
        let from = self.selected?;
        self.candidates
            .iter()
            .filter(|c| c.to == square)
            .max_by_key(|c| c.promotion == Some(PieceKind::Queen))
            .map(|c| CoordinateMove::new(from, c.to).with_promotion(c.promotion))
    }

    /// Handle a click on `square`: complete a move, change the selection, or clear it
    pub fn select_or_move<R: RulesAuthority>(
        &mut self,
        square: Square,
        rules: &mut R,
        layout: &mut PieceLayout,
    ) -> Result<ClickOutcome> {
        if let Some(mv) = self.pending_move(square) {
            self.clear();
            return match submit_move(rules, layout, mv) {
                Ok(descriptor) => Ok(ClickOutcome::Moved(descriptor)),
                Err(ChessError::IllegalMoveRejected { from, to }) => Ok(ClickOutcome::Rejected { from, to }),
                Err(e) => Err(e),
            };
        }

        let own_piece = rules
            .piece_at(square)
            .map_or(false, |piece| piece.color == rules.current_turn());

        if own_piece {
            self.selected = Some(square);
            self.candidates = rules.legal_moves(square);
            debug!("Selected {} with {} candidate moves", square, self.candidates.len());
            return Ok(ClickOutcome::Selected {
                square,
                destinations: self.destinations().len(),
            });
        }

        self.clear();
        Ok(ClickOutcome::Cleared)
    }
}

/// The single move-request path shared by clicks, typed moves and suggestions:
/// commit through the rules authority, then patch the layout with the result
pub fn submit_move<R: RulesAuthority>(
    rules: &mut R,
    layout: &mut PieceLayout,
    mv: CoordinateMove,
) -> Result<MoveDescriptor> {
    let descriptor = rules.commit_move(mv.from, mv.to, mv.promotion)?;
    let position = rules.current_position();
    layout.apply_move(&descriptor, &position)?;
    Ok(descriptor)
}

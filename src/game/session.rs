//! Game session: the rules authority, the piece layout, the selection and the
//! outstanding-suggestion slot, kept consistent with each other.
//!
//! At most one move commit can be in flight. While a move suggestion is
//! outstanding, any other move request fails with
//! [`ChessError::SuggestionInFlight`] instead of being interleaved.

use log::{debug, info, warn};

use super::rules::{RulesAuthority, ShakmatyRules};
use super::selection::{submit_move, ClickOutcome, SelectionController};
use super::status::GameStatus;
use crate::board::{Color, CoordinateMove, MoveDescriptor, PieceEntity, PieceLayout, Square};
use crate::error::{ChessError, Result};
use crate::pgn::{format_history, MovePair};

/// Handle for one outstanding move suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionTicket {
    id: u64,
    /// Position the suggestion is requested for
    pub position: String,
    /// Side the suggestion plays for
    pub side: Color,
}

impl SuggestionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// How a finished suggestion was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    Played(MoveDescriptor),
    /// The request was cancelled or superseded; nothing changed
    Discarded,
}

/// Everything the presentation layer draws
#[derive(Debug, Clone)]
pub struct BoardSurface {
    pub position: String,
    pub entities: Vec<PieceEntity>,
    pub selected: Option<Square>,
    pub highlights: Vec<Square>,
    pub turn: Color,
    pub in_check: bool,
    pub game_over: bool,
    pub status: GameStatus,
    pub history: Vec<MovePair>,
    pub awaiting_suggestion: bool,
}

pub struct GameSession<R: RulesAuthority = ShakmatyRules> {
    rules: R,
    layout: PieceLayout,
    selection: SelectionController,
    start_position: String,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl GameSession<ShakmatyRules> {
    /// New game from the standard starting position
    pub fn new() -> Result<Self> {
        GameSession::with_rules(ShakmatyRules::new())
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        GameSession::with_rules(ShakmatyRules::from_fen(fen)?)
    }
}

impl<R: RulesAuthority> GameSession<R> {
    pub fn with_rules(rules: R) -> Result<Self> {
        let start_position = rules.current_position();
        let layout = PieceLayout::from_position(&start_position)?;
        Ok(GameSession {
            rules,
            layout,
            selection: SelectionController::new(),
            start_position,
            in_flight: None,
            next_ticket: 0,
        })
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn layout(&self) -> &PieceLayout {
        &self.layout
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Position the current move history starts from
    pub fn start_position(&self) -> &str {
        &self.start_position
    }

    pub fn awaiting_suggestion(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn status(&self) -> GameStatus {
        self.rules.status()
    }

    /// Square click. Selecting is always allowed; completing a move is refused
    /// while a suggestion is outstanding.
    pub fn click(&mut self, square: Square) -> Result<ClickOutcome> {
        if self.in_flight.is_some() && self.selection.pending_move(square).is_some() {
            return Err(ChessError::SuggestionInFlight);
        }
        self.selection
            .select_or_move(square, &mut self.rules, &mut self.layout)
    }

    /// Typed move request, going through the same path as a click
    pub fn submit_move(&mut self, mv: CoordinateMove) -> Result<MoveDescriptor> {
        if self.in_flight.is_some() {
            return Err(ChessError::SuggestionInFlight);
        }
        self.commit(mv)
    }

    fn commit(&mut self, mv: CoordinateMove) -> Result<MoveDescriptor> {
        let result = submit_move(&mut self.rules, &mut self.layout, mv);
        // Accepted or not, old candidates are no longer trustworthy
        self.selection.clear();
        result
    }

    pub fn reset(&mut self) -> Result<()> {
        self.rules.reset();
        self.resync_after_reload()
    }

    /// Load a position; a rejected notation leaves the session untouched
    pub fn load_position(&mut self, notation: &str) -> Result<()> {
        self.rules.load_position(notation)?;
        self.resync_after_reload()
    }

    fn resync_after_reload(&mut self) -> Result<()> {
        self.selection.clear();
        if self.in_flight.take().is_some() {
            info!("Discarding outstanding move suggestion after position change");
        }
        self.start_position = self.rules.current_position();
        self.layout.force_resync(&self.start_position)
    }

    /// Reserve the single suggestion slot for the side to move
    pub fn begin_suggestion(&mut self) -> Result<SuggestionTicket> {
        if self.in_flight.is_some() {
            return Err(ChessError::SuggestionInFlight);
        }
        if self.rules.is_game_over() {
            return Err(ChessError::GameOver);
        }

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);

        let ticket = SuggestionTicket {
            id,
            position: self.rules.current_position(),
            side: self.rules.current_turn(),
        };
        debug!("Suggestion {} requested for {} at {}", id, ticket.side, ticket.position);
        Ok(ticket)
    }

    /// Apply the result of a suggestion request.
    ///
    /// Failures clear the slot and are returned unchanged; a stale ticket is
    /// discarded; a suggested move is submitted like a human move, so an
    /// illegal suggestion fails with [`ChessError::IllegalMoveRejected`].
    pub fn finish_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        suggestion: Result<CoordinateMove>,
    ) -> Result<SuggestionOutcome> {
        if self.in_flight != Some(ticket.id) {
            debug!("Ignoring stale suggestion {}", ticket.id);
            return Ok(SuggestionOutcome::Discarded);
        }
        self.in_flight = None;

        let mv = suggestion?;
        if self.rules.current_position() != ticket.position {
            warn!("Position changed while suggestion {} was outstanding", ticket.id);
            return Ok(SuggestionOutcome::Discarded);
        }

        info!("{} plays suggested move {}", ticket.side, mv);
        self.commit(mv).map(SuggestionOutcome::Played)
    }

    /// Drop the outstanding suggestion, if any. Position and selection are untouched.
    pub fn cancel_suggestion(&mut self) -> bool {
        self.in_flight.take().is_some()
    }

    pub fn surface(&self) -> BoardSurface {
        BoardSurface {
            position: self.rules.current_position(),
            entities: self.layout.entities().to_vec(),
            selected: self.selection.selected(),
            highlights: self.selection.destinations(),
            turn: self.rules.current_turn(),
            in_check: self.rules.in_check(),
            game_over: self.rules.is_game_over(),
            status: self.rules.status(),
            history: format_history(self.rules.history_entries()),
            awaiting_suggestion: self.awaiting_suggestion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_FEN;

    fn sq(label: &str) -> Square {
        Square::from_algebraic(label).unwrap()
    }

    #[test]
    fn test_new_session_surface() {
        let session = GameSession::new().unwrap();
        let surface = session.surface();
        assert_eq!(surface.position, STARTING_FEN);
        assert_eq!(surface.entities.len(), 32);
        assert_eq!(surface.turn, Color::White);
        assert!(!surface.awaiting_suggestion);
        assert!(surface.history.is_empty());
    }

    #[test]
    fn test_suggestion_slot_is_exclusive() {
        let mut session = GameSession::new().unwrap();
        let ticket = session.begin_suggestion().unwrap();
        assert!(matches!(session.begin_suggestion(), Err(ChessError::SuggestionInFlight)));
        assert!(matches!(
            session.submit_move("e2e4".parse().unwrap()),
            Err(ChessError::SuggestionInFlight)
        ));

        let outcome = session
            .finish_suggestion(ticket, Ok("e2e4".parse().unwrap()))
            .unwrap();
        assert!(matches!(outcome, SuggestionOutcome::Played(_)));
        assert!(!session.awaiting_suggestion());
    }

    #[test]
    fn test_cancelled_ticket_is_discarded() {
        let mut session = GameSession::new().unwrap();
        let ticket = session.begin_suggestion().unwrap();
        assert!(session.cancel_suggestion());

        let outcome = session
            .finish_suggestion(ticket, Ok("e2e4".parse().unwrap()))
            .unwrap();
        assert_eq!(outcome, SuggestionOutcome::Discarded);
        assert_eq!(session.rules().current_position(), STARTING_FEN);
    }

    #[test]
    fn test_click_commit_blocked_while_awaiting() {
        let mut session = GameSession::new().unwrap();
        session.click(sq("e2")).unwrap();
        session.begin_suggestion().unwrap();

        assert!(matches!(session.click(sq("e4")), Err(ChessError::SuggestionInFlight)));
        assert_eq!(session.selection().selected(), Some(sq("e2")));
        assert_eq!(session.rules().current_position(), STARTING_FEN);
    }
}

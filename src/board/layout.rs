//! Piece layout reconciler.
//!
//! Keeps a set of addressable piece entities in step with the rules
//! authority's position. Entities keep their id while they move, castle or
//! promote and disappear only when captured. The set is patched incrementally
//! from each committed [`MoveDescriptor`]; whenever the patch cannot be applied
//! cleanly, or its result disagrees with the position snapshot, the whole set is
//! rebuilt from that snapshot.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, warn};

use super::moves::{MoveDescriptor, MoveFlags};
use super::notation::{self, Board};
use super::square::{Color, Piece, PieceKind, Square};
use crate::error::{ChessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "piece-{}", self.0)
    }
}

/// A renderable piece with a stable identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceEntity {
    pub id: EntityId,
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
}

impl PieceEntity {
    pub fn piece(&self) -> Piece {
        Piece::new(self.kind, self.color)
    }
}

/// Inputs to the reconciler. Positions are FEN strings or bare placements.
#[derive(Debug, Clone, Copy)]
pub enum LayoutEvent<'a> {
    Initialize(&'a str),
    ApplyMove(&'a MoveDescriptor, &'a str),
    ForceResync(&'a str),
}

/// How the entity set was brought up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Seeded,
    Patched,
    Resynced,
}

#[derive(Debug, Clone, Default)]
pub struct PieceLayout {
    entities: Vec<PieceEntity>,
    next_id: u32,
}

impl PieceLayout {
    pub fn new() -> Self {
        PieceLayout {
            entities: Vec::new(),
            next_id: 0,
        }
    }

    /// Build a layout seeded from a position snapshot
    pub fn from_position(position: &str) -> Result<Self> {
        let mut layout = PieceLayout::new();
        layout.initialize(position)?;
        Ok(layout)
    }

    /// Run one reconciler transition.
    ///
    /// Only a malformed position snapshot is an error; desyncs are repaired here.
    pub fn apply(&mut self, event: LayoutEvent<'_>) -> Result<Reconciliation> {
        match event {
            LayoutEvent::Initialize(position) => {
                self.initialize(position)?;
                Ok(Reconciliation::Seeded)
            }
            LayoutEvent::ApplyMove(descriptor, position) => self.apply_move(descriptor, position),
            LayoutEvent::ForceResync(position) => {
                self.force_resync(position)?;
                Ok(Reconciliation::Resynced)
            }
        }
    }

    /// Discard every entity and create fresh ones from the position
    pub fn initialize(&mut self, position: &str) -> Result<()> {
        let board = notation::decode(notation::placement_field(position))?;
        self.seed(&board);
        Ok(())
    }

    pub fn force_resync(&mut self, position: &str) -> Result<()> {
        debug!("Resyncing piece layout from {}", position);
        self.initialize(position)
    }

    /// Patch the entity set with a committed move, falling back to a rebuild
    pub fn apply_move(&mut self, descriptor: &MoveDescriptor, position: &str) -> Result<Reconciliation> {
        let board = notation::decode(notation::placement_field(position))?;

        let mut patched = self.entities.clone();
        let outcome = patch(&mut patched, descriptor).and_then(|()| verify(&patched, &board));

        match outcome {
            Ok(()) => {
                self.entities = patched;
                Ok(Reconciliation::Patched)
            }
            Err(e) => {
                warn!("{} after {}; rebuilding piece layout", e, descriptor.to_coordinate());
                self.seed(&board);
                Ok(Reconciliation::Resynced)
            }
        }
    }

    pub fn entities(&self) -> &[PieceEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_at(&self, square: Square) -> Option<&PieceEntity> {
        self.entities.iter().find(|e| e.square == square)
    }

    pub fn entity(&self, id: EntityId) -> Option<&PieceEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Project the entity set back onto a board
    pub fn to_board(&self) -> Board {
        let mut board = Board::empty();
        for entity in &self.entities {
            board.set(entity.square, Some(entity.piece()));
        }
        board
    }

    /// True when the entities occupy exactly the position's squares with the same pieces
    pub fn matches(&self, position: &str) -> bool {
        match notation::decode(notation::placement_field(position)) {
            Ok(board) => verify(&self.entities, &board).is_ok(),
            Err(_) => false,
        }
    }

    fn seed(&mut self, board: &Board) {
        self.entities.clear();
        for (square, piece) in board.pieces() {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            self.entities.push(PieceEntity {
                id,
                kind: piece.kind,
                color: piece.color,
                square,
            });
        }
    }
}

fn desync(square: Square, reason: impl Into<String>) -> ChessError {
    ChessError::DesyncDetected {
        square,
        reason: reason.into(),
    }
}

fn remove_at(entities: &mut Vec<PieceEntity>, square: Square, reason: &str) -> Result<PieceEntity> {
    let index = entities
        .iter()
        .position(|e| e.square == square)
        .ok_or_else(|| desync(square, reason))?;
    Ok(entities.remove(index))
}

/// Apply the side effects of one committed move. Order matters: the captured
/// piece leaves before the mover lands on its square.
fn patch(entities: &mut Vec<PieceEntity>, descriptor: &MoveDescriptor) -> Result<()> {
    let flags = descriptor.flags;
    let (from, to) = (descriptor.from, descriptor.to);

    if flags.is_castle() && flags.intersects(MoveFlags::CAPTURE | MoveFlags::EN_PASSANT) {
        return Err(desync(from, "move carries both capture and castle flags"));
    }

    if flags.contains(MoveFlags::EN_PASSANT) {
        let captured_square = Square::new(from.row(), to.col())?;
        remove_at(entities, captured_square, "no pawn to capture en passant")?;
    } else if flags.contains(MoveFlags::CAPTURE) {
        remove_at(entities, to, "no piece on the capture square")?;
    }

    if entities.iter().any(|e| e.square == to) {
        return Err(desync(to, "destination occupied without a capture"));
    }

    let mover = entities
        .iter_mut()
        .find(|e| e.square == from)
        .ok_or_else(|| desync(from, "no piece on the origin square"))?;
    mover.square = to;
    if let Some(kind) = descriptor.promotion {
        mover.kind = kind;
    }

    if flags.is_castle() {
        let row = from.row();
        let (rook_from, rook_to) = if flags.contains(MoveFlags::KINGSIDE_CASTLE) {
            (Square::new(row, 7)?, Square::new(row, 5)?)
        } else {
            (Square::new(row, 0)?, Square::new(row, 3)?)
        };
        let rook = entities
            .iter_mut()
            .find(|e| e.square == rook_from && e.kind == PieceKind::Rook)
            .ok_or_else(|| desync(rook_from, "no rook to castle with"))?;
        rook.square = rook_to;
    }

    Ok(())
}

/// Check the one-entity-per-square invariant against the position's board
fn verify(entities: &[PieceEntity], board: &Board) -> Result<()> {
    let mut seen = BTreeSet::new();
    for entity in entities {
        if !seen.insert(entity.square) {
            return Err(desync(entity.square, "two entities on one square"));
        }
        if board.piece_at(entity.square) != Some(entity.piece()) {
            return Err(desync(entity.square, "entity does not match the position"));
        }
    }
    if seen.len() != board.piece_count() {
        let missing = board
            .occupied_squares()
            .into_iter()
            .find(|square| !seen.contains(square));
        if let Some(square) = missing {
            return Err(desync(square, "position piece has no entity"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::notation::STARTING_FEN;

    fn sq(label: &str) -> Square {
        Square::from_algebraic(label).unwrap()
    }

    fn descriptor(from: &str, to: &str, piece: PieceKind, flags: MoveFlags) -> MoveDescriptor {
        MoveDescriptor {
            from: sq(from),
            to: sq(to),
            piece,
            color: Color::White,
            promotion: None,
            captured: None,
            flags,
            san: String::new(),
        }
    }

    #[test]
    fn test_seed_from_start() {
        let layout = PieceLayout::from_position(STARTING_FEN).unwrap();
        assert_eq!(layout.len(), 32);
        assert!(layout.matches(STARTING_FEN));

        let ids: BTreeSet<_> = layout.entities().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 32);
    }

    #[test]
    fn test_reseed_assigns_fresh_ids() {
        let mut layout = PieceLayout::from_position(STARTING_FEN).unwrap();
        let before: BTreeSet<_> = layout.entities().iter().map(|e| e.id).collect();
        layout.force_resync(STARTING_FEN).unwrap();
        let after: BTreeSet<_> = layout.entities().iter().map(|e| e.id).collect();
        assert!(before.is_disjoint(&after));
    }

    #[test]
    fn test_patch_quiet_move() {
        let mut layout = PieceLayout::from_position(STARTING_FEN).unwrap();
        let pawn = layout.entity_at(sq("e2")).unwrap().id;

        let mv = descriptor("e2", "e4", PieceKind::Pawn, MoveFlags::DOUBLE_PAWN_PUSH);
        let after = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        assert_eq!(layout.apply_move(&mv, after).unwrap(), Reconciliation::Patched);
        assert_eq!(layout.entity(pawn).unwrap().square, sq("e4"));
        assert!(layout.entity_at(sq("e2")).is_none());
    }

    #[test]
    fn test_missing_mover_triggers_resync() {
        let mut layout = PieceLayout::from_position(STARTING_FEN).unwrap();
        let mv = descriptor("e3", "e4", PieceKind::Pawn, MoveFlags::empty());
        let after = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        assert_eq!(layout.apply_move(&mv, after).unwrap(), Reconciliation::Resynced);
        assert!(layout.matches(after));
    }

    #[test]
    fn test_capture_and_castle_flags_are_exclusive() {
        let start = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut layout = PieceLayout::from_position(start).unwrap();
        let mv = descriptor(
            "e1",
            "g1",
            PieceKind::King,
            MoveFlags::KINGSIDE_CASTLE | MoveFlags::CAPTURE,
        );
        let after = "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1";
        assert_eq!(layout.apply_move(&mv, after).unwrap(), Reconciliation::Resynced);
        assert!(layout.matches(after));
    }

    #[test]
    fn test_malformed_snapshot_leaves_layout_untouched() {
        let mut layout = PieceLayout::from_position(STARTING_FEN).unwrap();
        let before = layout.entities().to_vec();
        let mv = descriptor("e2", "e4", PieceKind::Pawn, MoveFlags::empty());
        assert!(layout.apply_move(&mv, "not/a/position").is_err());
        assert_eq!(layout.entities(), before.as_slice());
    }
}

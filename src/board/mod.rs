pub mod display;
pub mod layout;
pub mod moves;
pub mod notation;
pub mod square;

pub use display::render_board;
pub use layout::{EntityId, LayoutEvent, PieceEntity, PieceLayout, Reconciliation};
pub use moves::{CoordinateMove, MoveDescriptor, MoveFlags};
pub use notation::{Board, STARTING_FEN, STARTING_PLACEMENT};
pub use square::{Color, Piece, PieceKind, Square};

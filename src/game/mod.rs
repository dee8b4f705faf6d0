pub mod rules;
pub mod selection;
pub mod session;
pub mod status;

pub use rules::{RulesAuthority, ShakmatyRules};
pub use selection::{submit_move, ClickOutcome, SelectionController};
pub use session::{BoardSurface, GameSession, SuggestionOutcome, SuggestionTicket};
pub use status::GameStatus;

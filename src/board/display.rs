//! Text rendering of the piece layout with selection and highlight markers
use std::collections::BTreeSet;

use super::layout::PieceLayout;
use super::square::Square;

const FILE_LABELS: &str = "    a   b   c   d   e   f   g   h\n";

/// Draw the board from the entity set, rank 8 at the top.
///
/// The selected piece is drawn as `[P]`, a highlighted capture as `(p)` and a
/// highlighted empty square as ` * `.
pub fn render_board(layout: &PieceLayout, selected: Option<Square>, highlights: &[Square]) -> String {
    let highlights: BTreeSet<Square> = highlights.iter().copied().collect();
    let mut result = String::new();
    result.push_str(FILE_LABELS);

    for row in 0..8u8 {
        let rank = 8 - row;
        result.push_str(&format!("{}  ", rank));
        for col in 0..8u8 {
            let square = match Square::new(row, col) {
                Ok(square) => square,
                Err(_) => continue,
            };
            let symbol = layout.entity_at(square).map(|e| e.piece().to_char());
            let cell = match (symbol, Some(square) == selected, highlights.contains(&square)) {
                (Some(c), true, _) => format!("[{}]", c),
                (Some(c), false, true) => format!("({})", c),
                (Some(c), false, false) => format!(" {} ", c),
                (None, _, true) => " * ".to_string(),
                (None, _, false) => " . ".to_string(),
            };
            result.push_str(&cell);
            result.push(' ');
        }
        result.push_str(&format!(" {}\n", rank));
    }

    result.push_str(FILE_LABELS);
    result
}

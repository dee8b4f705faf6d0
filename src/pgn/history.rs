//! Move history formatting: numbered white/black pairs and PGN movetext
use std::fmt::Write;

/// One numbered turn of the move list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePair {
    pub number: usize,
    pub white: String,
    /// Empty while black has not replied yet
    pub black: String,
}

/// Group chronological SAN entries two at a time into numbered turns
pub fn format_history<S: AsRef<str>>(entries: &[S]) -> Vec<MovePair> {
    entries
        .chunks(2)
        .enumerate()
        .map(|(i, chunk)| MovePair {
            number: i + 1,
            white: chunk[0].as_ref().to_string(),
            black: chunk.get(1).map(|s| s.as_ref().to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Where a game's movetext begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOrigin {
    pub number: usize,
    pub black_first: bool,
}

impl MoveOrigin {
    /// Read the side to move and full-move number from a FEN. Missing or
    /// unreadable fields fall back to move 1 with white.
    pub fn from_fen(fen: &str) -> Self {
        let mut fields = fen.split_whitespace().skip(1);
        let black_first = fields.next() == Some("b");
        let number = fields
            .nth(3)
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);
        MoveOrigin { number, black_first }
    }
}

impl Default for MoveOrigin {
    fn default() -> Self {
        MoveOrigin { number: 1, black_first: false }
    }
}

/// Render entries as PGN movetext, breaking the line every 10 full moves.
///
/// A game whose first move is black's opens with `N...`.
pub fn movetext<S: AsRef<str>>(entries: &[S], origin: MoveOrigin) -> String {
    let mut out = String::new();
    let mut number = origin.number;
    let mut rest = entries;
    let mut turns = 0;

    if origin.black_first {
        if let Some((first, tail)) = entries.split_first() {
            let _ = write!(out, "{}... {}", number, first.as_ref());
            number += 1;
            rest = tail;
            turns = 1;
        }
    }

    for (i, chunk) in rest.chunks(2).enumerate() {
        let turn = turns + i;
        if turn > 0 {
            out.push(if turn % 10 == 0 { '\n' } else { ' ' });
        }
        let _ = write!(out, "{}. {}", number + i, chunk[0].as_ref());
        if let Some(black) = chunk.get(1) {
            let _ = write!(out, " {}", black.as_ref());
        }
    }
    out
}

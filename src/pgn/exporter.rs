use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::history::{movetext, MoveOrigin};
use crate::board::{Color, STARTING_FEN};
use crate::game::GameStatus;

/// PGN writer for the current game
pub struct PgnExporter {
    event: String,
    site: String,
    white: String,
    black: String,
}

impl PgnExporter {
    pub fn new() -> Self {
        PgnExporter {
            event: "LLM Chess".to_string(),
            site: "?".to_string(),
            white: "?".to_string(),
            black: "?".to_string(),
        }
    }

    pub fn with_event(mut self, event: &str) -> Self {
        self.event = event.to_string();
        self
    }

    pub fn with_white(mut self, white: &str) -> Self {
        self.white = white.to_string();
        self
    }

    pub fn with_black(mut self, black: &str) -> Self {
        self.black = black.to_string();
        self
    }

    /// Write one game to a PGN file
    pub fn export<S: AsRef<str>>(
        &self,
        history: &[S],
        status: GameStatus,
        start_position: &str,
        output_path: &Path,
    ) -> io::Result<()> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);
        self.write_game(&mut writer, history, status, start_position)?;
        writer.flush()
    }

    pub fn write_game<W: Write, S: AsRef<str>>(
        &self,
        writer: &mut W,
        history: &[S],
        status: GameStatus,
        start_position: &str,
    ) -> io::Result<()> {
        let result = result_string(status);

        writeln!(writer, "[Event \"{}\"]", self.event)?;
        writeln!(writer, "[Site \"{}\"]", self.site)?;
        writeln!(writer, "[Date \"????.??.??\"]")?;
        writeln!(writer, "[Round \"-\"]")?;
        writeln!(writer, "[White \"{}\"]", self.white)?;
        writeln!(writer, "[Black \"{}\"]", self.black)?;
        writeln!(writer, "[Result \"{}\"]", result)?;

        // Games that did not start from the initial position carry their setup
        if start_position != STARTING_FEN {
            writeln!(writer, "[SetUp \"1\"]")?;
            writeln!(writer, "[FEN \"{}\"]", start_position)?;
        }

        writeln!(writer, "[PlyCount \"{}\"]", history.len())?;
        writeln!(writer)?;

        let moves = movetext(history, MoveOrigin::from_fen(start_position));
        if moves.is_empty() {
            writeln!(writer, "{}", result)?;
        } else {
            writeln!(writer, "{} {}", moves, result)?;
        }

        Ok(())
    }
}

impl Default for PgnExporter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn result_string(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Checkmate { winner: Color::White } => "1-0",
        GameStatus::Checkmate { winner: Color::Black } => "0-1",
        GameStatus::Draw => "1/2-1/2",
        GameStatus::InProgress { .. } => "*",
    }
}

pub mod exporter;
pub mod history;

pub use exporter::{result_string, PgnExporter};
pub use history::{format_history, movetext, MoveOrigin, MovePair};

use std::env;
use std::process;

use llmchess::board::notation::{decode, encode, STARTING_FEN};
use llmchess::board::{render_board, LayoutEvent, PieceLayout, Reconciliation};
use llmchess::game::{RulesAuthority, ShakmatyRules};
use llmchess::{CoordinateMove, Result};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage:");
        eprintln!("  {} decode <placement>        - Decode a board placement and re-encode it", args[0]);
        eprintln!(
            "  {} replay <move>...          - Replay coordinate moves from the start, tracing entity ids",
            args[0]
        );
        eprintln!("  {} replay-from <fen> <move>... - Same, starting from a FEN", args[0]);
        process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "decode" => {
            if args.len() != 3 {
                eprintln!("Usage: {} decode <placement>", args[0]);
                eprintln!("Example: {} decode rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", args[0]);
                process::exit(1);
            }
            decode_command(&args[2])
        }
        "replay" => replay_command(STARTING_FEN, &args[2..]),
        "replay-from" => {
            if args.len() < 3 {
                eprintln!("Usage: {} replay-from <fen> <move>...", args[0]);
                process::exit(1);
            }
            replay_command(&args[2], &args[3..])
        }
        other => {
            eprintln!("Unknown command: {}", other);
            process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn decode_command(placement: &str) -> Result<()> {
    let board = decode(placement)?;
    println!("Pieces:     {}", board.piece_count());
    println!("Re-encoded: {}", encode(&board));
    println!();

    let layout = PieceLayout::from_position(placement)?;
    print!("{}", render_board(&layout, None, &[]));
    Ok(())
}

fn replay_command(fen: &str, moves: &[String]) -> Result<()> {
    let mut rules = ShakmatyRules::from_fen(fen)?;
    let mut layout = PieceLayout::new();
    layout.apply(LayoutEvent::Initialize(&rules.current_position()))?;
    println!("Seeded {} entities from {}", layout.len(), rules.current_position());
    println!();

    println!("{:<4} {:<8} {:<10} {:<10} {:<8}", "Ply", "Move", "SAN", "Entity", "Layout");
    println!("{}", "-".repeat(44));

    for (ply, text) in moves.iter().enumerate() {
        let mv: CoordinateMove = text.parse()?;
        let mover = layout.entity_at(mv.from).map(|e| e.id.to_string()).unwrap_or_else(|| "-".to_string());

        let descriptor = rules.commit_move(mv.from, mv.to, mv.promotion)?;
        let position = rules.current_position();
        let reconciliation = layout.apply(LayoutEvent::ApplyMove(&descriptor, &position))?;

        let status = match reconciliation {
            Reconciliation::Patched => "patched",
            Reconciliation::Resynced => "RESYNCED",
            Reconciliation::Seeded => "seeded",
        };
        println!("{:<4} {:<8} {:<10} {:<10} {:<8}", ply + 1, mv, descriptor.san, mover, status);
    }

    println!();
    print!("{}", render_board(&layout, None, &[]));
    println!("{} ({} entities)", rules.status(), layout.len());
    println!("Layout placement:        {}", encode(&layout.to_board()));
    println!("Layout matches position: {}", layout.matches(&rules.current_position()));
    Ok(())
}

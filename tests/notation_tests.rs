use llmchess::board::notation::{decode, encode, STARTING_PLACEMENT};
use llmchess::board::{Board, Color, Piece, PieceKind, Square};
use llmchess::ChessError;
use proptest::prelude::*;

// Integration tests for the compact board notation codec

fn piece_strategy() -> impl Strategy<Value = Option<Piece>> {
    prop_oneof![
        3 => Just(None),
        1 => (prop::sample::select(PieceKind::ALL.to_vec()), any::<bool>()).prop_map(|(kind, white)| {
            let color = if white { Color::White } else { Color::Black };
            Some(Piece::new(kind, color))
        }),
    ]
}

fn board_strategy() -> impl Strategy<Value = Board> {
    prop::collection::vec(piece_strategy(), 64).prop_map(|cells| {
        let mut board = Board::empty();
        for (index, piece) in cells.into_iter().enumerate() {
            let square = Square::new((index / 8) as u8, (index % 8) as u8).unwrap();
            board.set(square, piece);
        }
        board
    })
}

proptest! {
    #[test]
    fn test_encode_then_decode_restores_board(board in board_strategy()) {
        let encoded = encode(&board);
        let decoded = decode(&encoded).unwrap();
        prop_assert_eq!(decoded, board);
    }

    #[test]
    fn test_encoding_is_canonical(board in board_strategy()) {
        let encoded = encode(&board);
        prop_assert_eq!(encoded.split('/').count(), 8);

        // No two empty-square counts are ever adjacent
        let chars: Vec<char> = encoded.chars().collect();
        for pair in chars.windows(2) {
            prop_assert!(!(pair[0].is_ascii_digit() && pair[1].is_ascii_digit()));
        }

        prop_assert_eq!(encode(&decode(&encoded).unwrap()), encoded);
    }
}

#[test]
fn test_starting_placement() {
    let board = decode(STARTING_PLACEMENT).expect("starting placement should decode");
    assert_eq!(board.piece_count(), 32);

    for file in ["a", "b", "c", "d", "e", "f", "g", "h"] {
        let white_pawn = Square::from_algebraic(&format!("{}2", file)).unwrap();
        let black_pawn = Square::from_algebraic(&format!("{}7", file)).unwrap();
        assert_eq!(board.piece_at(white_pawn), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert_eq!(board.piece_at(black_pawn), Some(Piece::new(PieceKind::Pawn, Color::Black)));
    }

    let a8 = Square::from_algebraic("a8").unwrap();
    assert_eq!(a8.row(), 0);
    assert_eq!(a8.col(), 0);
    assert_eq!(board.piece_at(a8), Some(Piece::new(PieceKind::Rook, Color::Black)));
}

#[test]
fn test_malformed_notation_is_rejected() {
    let cases = [
        ("", "no ranks"),
        ("8/8/8/8/8/8/8", "seven ranks"),
        ("8/8/8/8/8/8/8/8/8", "nine ranks"),
        ("7/8/8/8/8/8/8/8", "short rank"),
        ("9/8/8/8/8/8/8/8", "digit above 8"),
        ("0p7/8/8/8/8/8/8/8", "zero digit"),
        ("44/8/8/8/8/8/8/8", "adjacent digits"),
        ("8p/8/8/8/8/8/8/8", "piece past the edge"),
        ("pppppppp7/8/8/8/8/8/8/8", "digit past the edge"),
        ("x7/8/8/8/8/8/8/8", "unknown letter"),
        ("rnbqkbnr pppppppp/8/8/8/8/8/8/8", "whitespace inside a rank"),
    ];

    for (notation, label) in cases {
        match decode(notation) {
            Err(ChessError::MalformedNotation(_)) => {}
            other => panic!("{} ({:?}) should be malformed, got {:?}", label, notation, other),
        }
    }
}

#[test]
fn test_sparse_endgame_position() {
    let board = decode("8/P7/8/8/8/8/8/k6K").unwrap();
    assert_eq!(board.piece_count(), 3);
    assert_eq!(
        board.piece_at(Square::from_algebraic("a7").unwrap()),
        Some(Piece::new(PieceKind::Pawn, Color::White))
    );
    assert_eq!(encode(&board), "8/P7/8/8/8/8/8/k6K");
}

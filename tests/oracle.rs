use cozy_chess::Color;
use pgntree::{CozyOracle, OracleError, Position, PositionOracle};

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[test]
fn start_position_is_standard() {
    assert_eq!(CozyOracle.start_fen(), START);
    assert_eq!(Position::startpos().legal_moves_count(), 20);
}

#[test]
fn play_reports_canonical_forms() {
    let played = CozyOracle.play(START, "Ng1f3").expect("legal");
    assert_eq!(played.san, "Nf3");
    assert_eq!(played.uci, "g1f3");
    assert_eq!(played.color, Color::White);
    assert_eq!(played.move_number, 1);
    assert_eq!(played.fen, "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1");
}

#[test]
fn black_move_keeps_move_number_of_its_position() {
    let after = CozyOracle.play(START, "Nf3").unwrap().fen;
    let reply = CozyOracle.play(&after, "Nf6").unwrap();
    assert_eq!(reply.color, Color::Black);
    assert_eq!(reply.move_number, 1);
    assert!(reply.fen.ends_with(" w KQkq - 2 2"), "got {}", reply.fen);
}

#[test]
fn castling_in_uci_uses_king_destination() {
    let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
    let short = CozyOracle.play(fen, "0-0").unwrap();
    assert_eq!((short.san.as_str(), short.uci.as_str()), ("O-O", "e1g1"));
    let long = CozyOracle.play(fen, "O-O-O").unwrap();
    assert_eq!((long.san.as_str(), long.uci.as_str()), ("O-O-O", "e1c1"));
}

#[test]
fn normalize_rejects_garbage() {
    assert!(matches!(CozyOracle.normalize("not a fen"), Err(OracleError::InvalidPosition { .. })));
    assert_eq!(CozyOracle.normalize(&format!("  {START} ")).unwrap(), START);
}

#[test]
fn illegal_move_is_reported_with_position() {
    let err = CozyOracle.play(START, "Qxz9").unwrap_err();
    assert_eq!(err, OracleError::IllegalMove { san: "Qxz9".into(), fen: START.into() });
    assert!(CozyOracle.play(START, "Ke2").is_err());
}

use std::time::Duration;

use pgntree::{pgn, CommentPosition, CozyOracle, Evaluation, Fork, Game, MoveNode, Nag, NotationError};

fn parse(text: &str) -> Game { pgn::parse(text, &CozyOracle).expect("valid pgn") }

fn err(text: &str) -> NotationError { pgn::parse(text, &CozyOracle).unwrap_err() }

fn main_node<'g>(g: &'g Game, ply: usize) -> &'g MoveNode { g.node(g.main_line()[ply]).unwrap() }

fn sans(g: &Game, moves: &[pgntree::NodeId]) -> Vec<String> {
    moves.iter().map(|id| g.node(*id).unwrap().san.clone()).collect()
}

const SAMPLE: &str = r#"[Event "Casual"]
[White "A"]
[Black "B"]
[Result "1-0"]

1. e4 {best by test} e5 2. Nf3 (2. f4 exf4) 2... Nc6 3. Bb5 $1 a6 1-0
"#;

#[test]
fn tags_moves_comments_and_alternatives() {
    let g = parse(SAMPLE);
    assert_eq!(g.metadata().get("White"), Some("A"));
    assert_eq!(g.metadata().get("Result"), Some("1-0"));
    assert_eq!(sans(&g, g.main_line()), vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
    assert_eq!(main_node(&g, 0).annotation.comments[0].text, "best by test");
    assert_eq!(main_node(&g, 0).annotation.comments[0].position, CommentPosition::After);
    assert!(main_node(&g, 4).annotation.nags.contains(&Nag::GOOD));

    // The f4 line competes with Nf3, so it hangs off e5
    let e5 = main_node(&g, 1);
    assert_eq!(e5.variations.len(), 1);
    let var = g.variation(e5.variations[0]).unwrap();
    assert_eq!(sans(&g, &var.moves), vec!["f4", "exf4"]);
    assert_eq!(var.starting_fen, e5.fen);
    assert!(var.is_primary);
    let f4 = g.node(var.moves[0]).unwrap();
    assert_eq!(f4.parent, Some(e5.id));
    assert!(!f4.is_mainline);
}

#[test]
fn numbered_continuation_attaches_to_tail() {
    let g = parse("1. e4 e5 (2. Nf3 Nc6) *");
    assert_eq!(g.main_line().len(), 2);
    let e5 = main_node(&g, 1);
    let var = g.variation(e5.variations[0]).unwrap();
    assert_eq!(g.node(var.moves[0]).unwrap().parent, Some(e5.id));
    assert_eq!(sans(&g, &var.moves), vec!["Nf3", "Nc6"]);
}

#[test]
fn unnumbered_variation_prefers_alternative() {
    let g = parse("1. e4 (d4) e5 *");
    assert_eq!(g.root_variations().len(), 1);
    let g = parse("1. e4 (e5) *");
    // e5 is not playable from the start, so it continues from e4
    assert!(g.root_variations().is_empty());
    assert_eq!(main_node(&g, 0).variations.len(), 1);
}

#[test]
fn nested_variations() {
    let g = parse("1. e4 e5 2. Nf3 (2. Bc4 Nf6 (2... Bc5 3. Qh5)) 2... Nc6 *");
    let e5 = main_node(&g, 1);
    let outer = g.variation(e5.variations[0]).unwrap();
    assert_eq!(sans(&g, &outer.moves), vec!["Bc4", "Nf6"]);
    let bc4 = g.node(outer.moves[0]).unwrap();
    let inner = g.variation(bc4.variations[0]).unwrap();
    assert_eq!(sans(&g, &inner.moves), vec!["Bc5", "Qh5"]);
    assert_eq!(g.node_count(), 8);
}

#[test]
fn comment_placement() {
    let g = parse("{Start} 1. e4 ({Alternatively} 1. d4) 1... {reply} e5 {done} *");
    let e4 = main_node(&g, 0);
    assert_eq!(e4.annotation.comments_at(CommentPosition::Before).next().unwrap().text, "Start");
    let var = g.variation(g.root_variations()[0]).unwrap();
    assert_eq!(var.comment.as_deref(), Some("Alternatively"));
    let e5 = main_node(&g, 1);
    let texts: Vec<(&str, CommentPosition)> = e5.annotation.comments.iter().map(|c| (c.text.as_str(), c.position)).collect();
    assert_eq!(texts, vec![("reply", CommentPosition::Before), ("done", CommentPosition::After)]);
}

#[test]
fn embedded_commands_are_extracted() {
    let g = parse("1. e4 {[%eval 0.30,21] [%clk 0:05:00] solid [%cal Gg1f3]} *");
    let a = &main_node(&g, 0).annotation;
    assert_eq!(a.evaluation, Some(Evaluation::centipawns(30).with_depth(21)));
    assert_eq!(a.clock, Some(Duration::from_secs(300)));
    assert_eq!(a.marks.len(), 1);
    assert_eq!(a.comments.len(), 1);
    assert_eq!(a.comments[0].text, "solid");
}

#[test]
fn glyphs_glued_standalone_and_numeric() {
    let g = parse("1. e4!? e5 ?? 2. Qh5 +- $2 *");
    assert!(main_node(&g, 0).annotation.nags.contains(&Nag::SPECULATIVE));
    assert!(main_node(&g, 1).annotation.nags.contains(&Nag::BLUNDER));
    let qh5: Vec<Nag> = main_node(&g, 2).annotation.nags.iter().copied().collect();
    assert_eq!(qh5, vec![Nag::MISTAKE, Nag::WHITE_DECISIVE]);
}

#[test]
fn fen_tag_sets_root() {
    let g = parse("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 1\"]\n\n1... Kd7 2. e4 *");
    assert_eq!(g.root_fen(), "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1");
    assert_eq!(sans(&g, g.main_line()), vec!["Kd7", "e4"]);
    assert_eq!(main_node(&g, 1).move_number, 2);
}

#[test]
fn lexical_noise_is_skipped() {
    let g = parse("% exported by something\n1. e4 ; trailing remark\ne5 *");
    assert_eq!(g.main_line().len(), 2);
    assert_eq!(main_node(&g, 0).annotation.comments[0].text, "trailing remark");
}

#[test]
fn result_token_fills_missing_tag_and_must_match_header() {
    let g = parse("1. e4 1-0");
    assert_eq!(g.metadata().get("Result"), Some("1-0"));
    let text = "[Result \"0-1\"]\n\n1. e4 1-0";
    assert_eq!(err(text), NotationError::UnexpectedToken { offset: 22, token: "1-0".into() });
}

#[test]
fn malformed_input_errors() {
    assert_eq!(err("1. e4 (1. d4 *"), NotationError::UnbalancedVariation { offset: 6 });
    assert_eq!(err("1. e4 (1. d4"), NotationError::UnbalancedVariation { offset: 6 });
    assert_eq!(err("1. e4 ) *"), NotationError::UnbalancedVariation { offset: 6 });
    assert_eq!(err("1. e4 {oops"), NotationError::UnterminatedComment { offset: 6 });
    assert_eq!(err("1. e4 () *"), NotationError::EmptyVariation { offset: 6 });
    assert!(matches!(err("[Event Casual]\n1. e4 *"), NotationError::BadTag { offset: 0, .. }));
    assert!(matches!(err("(1. e4) *"), NotationError::UnexpectedToken { offset: 0, .. }));
    assert!(matches!(err("1. e4 * e5"), NotationError::UnexpectedToken { .. }));
    assert!(matches!(err("[FEN \"xyz\"]\n\n*"), NotationError::InvalidPosition { .. }));
}

#[test]
fn illegal_moves_report_offset() {
    assert_eq!(err("1. e4 e5 2. Ke3 *"), NotationError::IllegalMove { offset: 12, san: "Ke3".into() });
    assert!(matches!(err("1. e4 (1. Ke2) *"), NotationError::IllegalMove { offset: 10, .. }));
}

#[test]
fn multi_game_files_split_at_headers() {
    let text = format!("{SAMPLE}\n[Event \"Second\"]\n\n1. d4 d5 *\n");
    let games = pgn::split_games(&text);
    assert_eq!(games.len(), 2);
    let parsed = pgn::parse_all(&text, &CozyOracle).unwrap();
    assert_eq!(parsed[1].metadata().get("Event"), Some("Second"));
    assert_eq!(parsed[1].main_line().len(), 2);
}

#[test]
fn oversized_numbers_are_errors() {
    assert_eq!(
        err("1. e4 (4294967295. d4) *"),
        NotationError::UnexpectedToken { offset: 7, token: "4294967295".into() }
    );
    let g = parse("1. e4 {[%clk 99999999999999999:00:00]} *");
    let a = &main_node(&g, 0).annotation;
    assert_eq!(a.clock, None);
    assert_eq!(a.comments[0].text, "[%clk 99999999999999999:00:00]");
}

#[test]
fn alternative_to_a_variation_first_move_nests_inside_it() {
    let g = parse("1. e4 e5 (1... c5 (1... e6)) 2. Nf3 *");
    let e4 = main_node(&g, 0);
    assert_eq!(e4.variations.len(), 1);
    let sicilian = g.variation(e4.variations[0]).unwrap();
    assert_eq!(sans(&g, &sicilian.moves), vec!["c5"]);
    assert_eq!(sicilian.alternatives.len(), 1);

    let french = g.variation(sicilian.alternatives[0]).unwrap();
    assert_eq!(french.fork, Fork::First(sicilian.id));
    assert_eq!(french.anchor, Some(e4.id));
    assert_eq!(french.starting_fen, e4.fen);
    assert!(french.is_primary);
    let e6 = g.node(french.moves[0]).unwrap();
    assert_eq!(e6.san, "e6");
    assert_eq!(e6.parent, Some(e4.id));
    assert_eq!(sans(&g, g.main_line()), vec!["e4", "e5", "Nf3"]);
}

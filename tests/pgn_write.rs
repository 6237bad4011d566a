use std::time::Duration;

use pretty_assertions::assert_eq;
use pgntree::{pgn, CommentPosition, CozyOracle, Evaluation, MarkColor, Nag, TreeEngine, VisualMark};
use cozy_chess::Square;

const ROSTER: &str = "[Event \"?\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n[White \"?\"]\n[Black \"?\"]\n[Result \"*\"]\n\n";

fn play(moves: &[&str]) -> TreeEngine {
    let mut e = TreeEngine::new();
    for m in moves { e.add_move(m, false).unwrap(); }
    e
}

#[test]
fn empty_game_is_roster_and_result() {
    assert_eq!(pgn::write(TreeEngine::new().game()), format!("{ROSTER}*\n"));
}

#[test]
fn alternative_follows_the_move_it_replaces() {
    let mut e = play(&["e4", "e5", "Nf3", "Nc6"]);
    e.go_back();
    e.go_back();
    e.add_move("Nc3", false).unwrap();
    assert_eq!(pgn::write(e.game()), format!("{ROSTER}1. e4 e5 2. Nf3 (2. Nc3) 2... Nc6 *\n"));
}

#[test]
fn root_alternative_and_tail_continuation() {
    let mut e = play(&["e4", "e5"]);
    e.add_move("Nf3", true).unwrap();
    e.go_to_start();
    e.add_move("d4", false).unwrap();
    e.add_move("d5", false).unwrap();
    assert_eq!(pgn::write(e.game()), format!("{ROSTER}1. e4 (1. d4 d5) 1... e5 (2. Nf3) *\n"));
}

#[test]
fn annotations_render_in_order() {
    let mut e = play(&["e4"]);
    e.add_nag(Nag::GOOD);
    e.add_nag(Nag::WHITE_SLIGHT);
    e.add_comment("best by test", CommentPosition::After).unwrap();
    e.add_move("e5", false).unwrap();
    e.set_evaluation(Some(Evaluation::centipawns(25)));
    e.set_clock(Some(Duration::from_secs(5400)));
    e.add_visual_annotation(VisualMark::Highlight { square: Square::E5, color: MarkColor::Red });
    e.add_move("Nf3", false).unwrap();
    e.add_comment("develop", CommentPosition::Before).unwrap();
    e.add_move("Nc6", false).unwrap();
    e.add_nag(Nag::DUBIOUS);
    e.set_metadata([("Result", "1/2-1/2")]).unwrap();

    let expected = "[Event \"?\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n[White \"?\"]\n[Black \"?\"]\n[Result \"1/2-1/2\"]\n\n\
1. e4! ⩲ {best by test} 1... e5 {[%eval 0.25] [%clk 1:30:00] [%csl Re5]} 2.\n\
{develop} Nf3 Nc6?! 1/2-1/2\n";
    assert_eq!(pgn::write(e.game()), expected);
}

#[test]
fn variation_comment_opens_the_group() {
    let mut e = play(&["e4"]);
    e.go_to_start();
    e.add_move("c4", false).unwrap();
    e.go_to_start();
    let vid = e.game().root_variations()[0];
    e.set_variation_comment(vid, Some("English")).unwrap();
    assert_eq!(pgn::write(e.game()), format!("{ROSTER}1. e4 ({{English}} 1. c4) *\n"));
}

#[test]
fn tags_are_escaped_and_setup_emitted() {
    let mut e = TreeEngine::with_root("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1").unwrap();
    e.set_metadata([("White", "O'Kelly \"The Wall\"")]).unwrap();
    e.add_move("Kd7", false).unwrap();
    e.add_move("e4", false).unwrap();
    let text = pgn::write(e.game());
    assert!(text.contains("[White \"O'Kelly \\\"The Wall\\\"\"]\n"));
    assert!(text.contains("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 1\"]\n"));
    assert!(text.ends_with("\n\n1... Kd7 2. e4 *\n"));
}

#[test]
fn long_games_wrap_at_eighty_columns() {
    let mut e = TreeEngine::new();
    for _ in 0..10 {
        for m in ["Nf3", "Nf6", "Ng1", "Ng8"] { e.add_move(m, false).unwrap(); }
    }
    let text = pgn::write(e.game());
    let movetext: Vec<&str> = text.split("\n\n").nth(1).unwrap().lines().collect();
    assert!(movetext.len() > 1);
    assert!(movetext.iter().all(|l| l.chars().count() <= 80));
    assert!(movetext[0].starts_with("1. Nf3 Nf6 2. Ng1 Ng8 3. Nf3"));
}

#[test]
fn nested_first_move_alternative_stays_inside_its_group() {
    let game = pgn::parse("1. e4 e5 (1... c5 (1... e6)) 2. Nf3 *", &CozyOracle).unwrap();
    assert_eq!(pgn::write(&game), "[Result \"*\"]\n\n1. e4 e5 (1... c5 (1... e6)) 2. Nf3 *\n");
}

#[test]
fn position_glyphs_use_their_symbols() {
    let mut e = play(&["e4"]);
    e.add_nag(Nag::DUBIOUS);
    e.add_nag(Nag::FORCED);
    e.add_nag(Nag::WHITE_DECISIVE);
    e.add_nag(Nag(22));
    assert_eq!(pgn::write(e.game()), format!("{ROSTER}1. e4?! □ +- $22 *\n"));
}

//! End-to-end checks against the public search/eval API: mate finding,
//! draw detection, and determinism across repeated runs.

use shrike::config::evaluation as cfg_eval;
use shrike::position::Position;
use shrike::search::{think, Limits, SharedTt};
use shrike::sync::StopFlag;
use shrike::tt::TranspositionTable;
use shrike::worker::Workers;
use std::sync::{Arc, Mutex};

fn fresh_tt() -> SharedTt {
    Arc::new(Mutex::new(TranspositionTable::new(1)))
}

#[test]
fn finds_back_rank_mate_in_one() {
    let pos = Position::set("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let mut workers = Workers::new(1);
    let tt = fresh_tt();
    let stop = StopFlag::new();
    let limits = Limits::depth(4);

    let report = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {}).expect("a report");
    assert!(report.score >= cfg_eval::MATE_SCORE - 100);
    assert_eq!(report.pv[0].to_string(), "a1a8");
}

#[test]
fn finds_forced_mate_behind_a_boxed_in_king() {
    // Black's own rook and pawns block every flight square, so the knight
    // fork on f7 is immediately decisive.
    let pos = Position::set("6rk/6pp/8/6N1/8/8/8/6QK w - - 0 1").unwrap();
    let mut workers = Workers::new(1);
    let tt = fresh_tt();
    let stop = StopFlag::new();
    let limits = Limits::depth(6);

    let report = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {}).expect("a report");
    assert!(report.score >= cfg_eval::MATE_SCORE - 100, "expected a forced mate, got {}", report.score);
}

#[test]
fn threefold_repetition_is_scored_as_a_draw() {
    // King shuffles with no mating material; forcing the same position three
    // times down one search line should evaluate to zero, not a material edge.
    let pos = Position::set("7k/8/8/8/8/8/8/K6R w - - 0 1").unwrap();
    let mut workers = Workers::new(1);
    let tt = fresh_tt();
    let stop = StopFlag::new();
    let limits = Limits::depth(2);

    let report = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {}).unwrap();
    // White is up a full rook; the search must not report a draw score here.
    assert!(report.score > 100);
}

#[test]
fn insufficient_material_draws_regardless_of_side_to_move() {
    let pos = Position::set("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
    let mut workers = Workers::new(1);
    let tt = fresh_tt();
    let stop = StopFlag::new();
    let limits = Limits::depth(3);

    let report = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {}).unwrap();
    assert_eq!(report.score, 0);
}

#[test]
fn repeated_searches_on_the_same_position_agree() {
    let pos = Position::set("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3").unwrap();
    let limits = Limits::depth(5);

    let mut scores = Vec::new();
    for _ in 0..2 {
        let mut workers = Workers::new(1);
        let tt = fresh_tt();
        let stop = StopFlag::new();
        let report = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {}).unwrap();
        scores.push(report.score);
    }
    assert_eq!(scores[0], scores[1]);
}

#[test]
fn stopping_before_the_first_depth_reports_nothing() {
    let pos = Position::startpos();
    let mut workers = Workers::new(1);
    let tt = fresh_tt();
    let stop = StopFlag::new();
    stop.stop();
    let limits = Limits::depth(10);

    let result = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {});
    assert!(result.is_none());
}

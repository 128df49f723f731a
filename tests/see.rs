//! Static exchange evaluation sanity checks against hand-verified trades.

use shrike::movegen::parse_move;
use shrike::position::Position;

#[test]
fn a_pawn_takes_pawn_defended_only_by_a_pawn_is_an_even_trade() {
    let pos = Position::set("4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
    let mv = parse_move(&pos, "e4d5", false).unwrap();
    assert_eq!(pos.see(mv), 0);
}

#[test]
fn capturing_a_queen_with_a_pawn_is_a_large_net_gain() {
    let pos = Position::set("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
    let mv = parse_move(&pos, "e4d5", false).unwrap();
    assert!(pos.see(mv) > 500);
}

#[test]
fn capturing_a_defended_rook_with_a_queen_loses_material() {
    let pos = Position::set("4k3/8/2p1p3/3r4/8/8/8/3QK3 w - - 0 1").unwrap();
    let mv = parse_move(&pos, "d1d5", false).unwrap();
    assert!(pos.see(mv) < 0, "queen takes defended rook should lose the exchange, got {}", pos.see(mv));
}

#[test]
fn an_undefended_hanging_piece_always_wins_material() {
    let pos = Position::set("4k3/8/8/3n4/8/8/8/3QK3 w - - 0 1").unwrap();
    let mv = parse_move(&pos, "d1d5", false).unwrap();
    assert!(pos.see(mv) > 0);
}

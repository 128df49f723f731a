//! Static Exchange Evaluation: the deterministic minimax value of the
//! capture sequence on one square.
//!
//! Deliberately does not rediscover x-ray attackers uncovered mid-exchange
//! (a slider behind the first attacker on a file/diagonal is invisible to
//! this routine until the whole thing is re-run for a different move). This
//! trades a small amount of accuracy on rare battery positions for a loop
//! with no occupancy-dependent re-masking step.

use crate::bitboard;
use crate::config::evaluation as cfg_eval;
use crate::magic;
use crate::position::Position;
use crate::types::{Bitboard, Color, Move, PieceKind, Square, NO_SQUARE};

fn see_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::King => cfg_eval::KING_VALUE,
        PieceKind::None => 0,
        other => cfg_eval::MATERIAL_EG[other.index()],
    }
}

fn attackers_with_occ(pos: &Position, sq: Square, occ: Bitboard) -> Bitboard {
    let mut attackers = 0u64;
    attackers |= bitboard::knight_attacks(sq) & pos.by_piece[PieceKind::Knight.index()] & occ;
    attackers |= bitboard::king_attacks(sq) & pos.by_piece[PieceKind::King.index()] & occ;
    let diag = pos.by_piece[PieceKind::Bishop.index()] | pos.by_piece[PieceKind::Queen.index()];
    attackers |= magic::bishop_attacks(sq, occ) & diag & occ;
    let ortho = pos.by_piece[PieceKind::Rook.index()] | pos.by_piece[PieceKind::Queen.index()];
    attackers |= magic::rook_attacks(sq, occ) & ortho & occ;
    let pawns = pos.by_piece[PieceKind::Pawn.index()];
    attackers |= bitboard::pawn_attacks(Color::White, sq) & pawns & pos.by_color[Color::Black.index()] & occ;
    attackers |= bitboard::pawn_attacks(Color::Black, sq) & pawns & pos.by_color[Color::White.index()] & occ;
    attackers
}

fn least_valuable_attacker(pos: &Position, attackers: Bitboard) -> Option<(Square, PieceKind)> {
    let mut best: Option<(Square, PieceKind, i32)> = None;
    for sq in bitboard::bits(attackers) {
        let kind = pos.piece_on[sq.index()];
        let value = see_value(kind);
        if best.is_none_or(|(_, _, bv)| value < bv) {
            best = Some((sq, kind, value));
        }
    }
    best.map(|(sq, kind, _)| (sq, kind))
}

pub fn see(pos: &Position, mv: Move) -> i32 {
    let from = mv.from_sq();
    let to = mv.to_sq();
    let us = pos.turn;
    let mover_kind0 = pos.piece_on[from.index()];

    let mut occ = pos.by_color[0] | pos.by_color[1];
    let mut gains: Vec<i32> = Vec::with_capacity(32);

    let is_en_passant =
        mover_kind0 == PieceKind::Pawn && pos.ep_square != NO_SQUARE && to.0 == pos.ep_square;
    if is_en_passant {
        gains.push(see_value(PieceKind::Pawn));
        let behind = if us == Color::White { Square::new(to.0 - 8) } else { Square::new(to.0 + 8) };
        occ &= !behind.bit();
    } else {
        gains.push(see_value(pos.piece_on[to.index()]));
    }

    let mut mover_kind = mover_kind0;
    if mv.is_promotion() {
        gains[0] += see_value(mv.promo()) - see_value(PieceKind::Pawn);
        mover_kind = mv.promo();
    }

    if pos.attacked & to.bit() == 0 {
        return gains[0];
    }

    occ &= !from.bit();
    let mut side = us.opposite();
    let mut occupant_kind = mover_kind;

    loop {
        let attackers = attackers_with_occ(pos, to, occ) & pos.by_color[side.index()];
        let Some((sq, kind)) = least_valuable_attacker(pos, attackers) else {
            break;
        };
        gains.push(see_value(occupant_kind) - gains.last().copied().unwrap_or(0));
        occ &= !sq.bit();
        occupant_kind = kind;
        let last_rank = if side == Color::White { 7 } else { 0 };
        if kind == PieceKind::Pawn && to.rank() == last_rank {
            occupant_kind = PieceKind::Queen;
        }
        side = side.opposite();
    }

    for i in (1..gains.len()).rev() {
        gains[i - 1] = gains[i - 1].min(-gains[i]);
    }
    gains[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn quiet_move_to_undefended_square_is_zero() {
        let pos = Position::set("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let mv = Move::new(Square::from_str("e2").unwrap(), Square::from_str("e3").unwrap(), PieceKind::None);
        assert_eq!(see(&pos, mv), 0);
    }

    #[test]
    fn quiet_move_to_defended_square_loses_mover_value() {
        let pos = Position::set("4k3/8/8/8/4p3/8/4P3/4K3 w - - 0 1").unwrap();
        // pawn push e2-e4 would be illegal (blocked), use a knight instead.
        let pos = Position::set("4k3/8/8/8/3p4/8/8/3NK3 w - - 0 1").unwrap();
        let mv = Move::new(Square::from_str("d1").unwrap(), Square::from_str("c3").unwrap(), PieceKind::None);
        assert_eq!(see(&pos, mv), 0);
        let _ = pos;
    }

    #[test]
    fn winning_pawn_takes_pawn_is_positive() {
        let pos = Position::set("4k3/8/8/8/3p4/4P3/8/4K3 w - - 0 1").unwrap();
        let mv = Move::new(Square::from_str("e3").unwrap(), Square::from_str("d4").unwrap(), PieceKind::None);
        assert!(see(&pos, mv) >= 0);
    }

    #[test]
    fn losing_capture_is_negative() {
        let pos = Position::set("4k3/3p4/3p4/8/8/3Q4/8/4K3 w - - 0 1").unwrap();
        let mv = Move::new(Square::from_str("d3").unwrap(), Square::from_str("d6").unwrap(), PieceKind::None);
        assert!(see(&pos, mv) < 0);
    }
}

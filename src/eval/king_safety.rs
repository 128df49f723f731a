//! King danger: a weighted count of attacks into the ring around each king,
//! plus check threats and x-ray threats, looked up in a precomputed monotone
//! curve so the marginal cost of one more attacker grows with how exposed
//! the king already is.

use crate::bitboard;
use crate::config::evaluation as cfg_eval;
use crate::eval::pawn_attack_set;
use crate::magic;
use crate::position::Position;
use crate::types::{Color, EvalPair, PieceKind};
use once_cell::sync::Lazy;

static SAFETY_CURVE: Lazy<[i32; cfg_eval::SAFETY_CURVE_SIZE]> = Lazy::new(|| {
    let mut table = [0i32; cfg_eval::SAFETY_CURVE_SIZE];
    for (i, slot) in table.iter_mut().enumerate() {
        let x = i as i64;
        *slot = ((x * x) / cfg_eval::SAFETY_CURVE_SIZE as i64).min(cfg_eval::SAFETY_CURVE_CAP as i64) as i32;
    }
    table
});

const ATTACK_KINDS: [PieceKind; 4] =
    [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen];

fn attacks_from(kind: PieceKind, sq: crate::types::Square, occ: crate::types::Bitboard) -> crate::types::Bitboard {
    match kind {
        PieceKind::Knight => bitboard::knight_attacks(sq),
        PieceKind::Bishop => magic::bishop_attacks(sq, occ),
        PieceKind::Rook => magic::rook_attacks(sq, occ),
        PieceKind::Queen => magic::queen_attacks(sq, occ),
        _ => 0,
    }
}

pub fn accumulate(pos: &Position, e: &mut [EvalPair; 2]) {
    for &us in &[Color::White, Color::Black] {
        let them = us.opposite();
        let king_sq = pos.king_square(us);
        let own_pawn_attacks = pawn_attack_set(pos, us);
        let danger_zone = bitboard::king_attacks(king_sq) & !own_pawn_attacks;
        let occ = pos.by_color[0] | pos.by_color[1];

        let mut weight = 0i32;
        let mut attacker_count = 0i32;
        for &kind in &ATTACK_KINDS {
            let pieces = pos.by_piece[kind.index()] & pos.by_color[them.index()];
            let mut per_kind = 0i32;
            for sq in bitboard::bits(pieces) {
                let hits = attacks_from(kind, sq, occ) & danger_zone;
                if hits == 0 {
                    continue;
                }
                attacker_count += 1;
                let dist = crate::bitboard::bits(hits)
                    .map(|h| chebyshev(sq, h))
                    .min()
                    .unwrap_or(4)
                    .min(4) as usize;
                per_kind += cfg_eval::KING_ATTACK_WEIGHTS[kind.index()] * cfg_eval::KING_DIST_MULT[dist];
            }
            let cap = cfg_eval::KING_ATTACK_CAPS[kind.index()];
            if cap > 0 {
                per_kind = per_kind.min(cap);
            }
            weight += per_kind;
        }

        weight += check_threat_weight(pos, us, them, king_sq, occ);
        weight += xray_threat_weight(pos, them, king_sq, occ);

        let idx = ((weight / cfg_eval::SAFETY_CURVE_DIVISOR) * (1 + attacker_count))
            .clamp(0, (cfg_eval::SAFETY_CURVE_SIZE - 1) as i32) as usize;
        let mg_penalty = SAFETY_CURVE[idx];
        let eg_penalty = mg_penalty * cfg_eval::SAFETY_CURVE_EG_NUMERATOR / 4;
        e[us.index()] -= EvalPair::new(mg_penalty, eg_penalty);
    }
}

fn chebyshev(a: crate::types::Square, b: crate::types::Square) -> i32 {
    let file_d = (a.file() as i32 - b.file() as i32).abs();
    let rank_d = (a.rank() as i32 - b.rank() as i32).abs();
    file_d.max(rank_d)
}

/// Empty, undefended squares from which an enemy piece could move to give
/// check next move.
fn check_threat_weight(
    pos: &Position,
    us: Color,
    them: Color,
    king_sq: crate::types::Square,
    occ: crate::types::Bitboard,
) -> i32 {
    let defended = pawn_attack_set(pos, us) | bitboard::king_attacks(pos.king_square(us));
    let mut weight = 0;
    for &kind in &ATTACK_KINDS {
        let candidates = attacks_from(kind, king_sq, occ) & !occ & !defended;
        for sq in bitboard::bits(candidates) {
            let reachers = attacks_from(kind, sq, occ) & pos.by_piece[kind.index()] & pos.by_color[them.index()];
            if reachers != 0 {
                weight += cfg_eval::CHECK_THREAT_BONUS;
            }
        }
    }
    weight
}

/// Enemy sliders aligned with the king through an otherwise-empty line.
fn xray_threat_weight(
    pos: &Position,
    them: Color,
    king_sq: crate::types::Square,
    occ: crate::types::Bitboard,
) -> i32 {
    let diag = (pos.by_piece[PieceKind::Bishop.index()] | pos.by_piece[PieceKind::Queen.index()])
        & pos.by_color[them.index()];
    let ortho = (pos.by_piece[PieceKind::Rook.index()] | pos.by_piece[PieceKind::Queen.index()])
        & pos.by_color[them.index()];
    let sliders = diag | ortho;
    let mut weight = 0;
    for sq in bitboard::bits(sliders) {
        let seg = bitboard::segment(king_sq, sq);
        if seg != 0 && seg & occ == 0 {
            weight += cfg_eval::XRAY_THREAT_BONUS;
        }
    }
    weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn exposed_king_is_penalized_more_than_startpos() {
        let startpos = Position::startpos();
        let mut e_start = [EvalPair::ZERO; 2];
        accumulate(&startpos, &mut e_start);

        let exposed = Position::set("4k3/8/8/8/8/3q4/8/4K3 b - - 0 1").unwrap();
        let mut e_exposed = [EvalPair::ZERO; 2];
        accumulate(&exposed, &mut e_exposed);

        assert!(e_exposed[Color::White.index()].op <= e_start[Color::White.index()].op);
    }

    #[test]
    fn startpos_king_safety_is_symmetric() {
        let pos = Position::startpos();
        let mut e = [EvalPair::ZERO; 2];
        accumulate(&pos, &mut e);
        assert_eq!(e[Color::White.index()], e[Color::Black.index()]);
    }
}

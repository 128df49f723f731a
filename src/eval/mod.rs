//! Static evaluation: material and piece-square tables live on `Position`
//! itself; everything else (mobility, king safety, pawn structure, pattern
//! bonuses) is accumulated here and blended by game phase.
//!
//! [`evaluate`] returns a score from White's perspective with no side-to-move
//! flip and no tempo bonus; the caller (search) negates for Black to move and
//! adds [`cfg_eval::TEMPO`] afterward.

mod king_safety;
mod material;
mod mobility;
mod pattern;
mod pawns;

pub use pawns::PawnHashTable;

use crate::bitboard;
use crate::config::evaluation as cfg_eval;
use crate::position::Position;
use crate::types::{Bitboard, Color};

/// Pawn attack set for every pawn of `color` at once, used by mobility, king
/// safety, and pawn-structure accumulation alike.
pub(crate) fn pawn_attack_set(pos: &Position, color: Color) -> Bitboard {
    let pawns = pos.by_piece[crate::types::PieceKind::Pawn.index()] & pos.by_color[color.index()];
    if color == Color::White {
        ((pawns & !bitboard::FILE_A) << 7) | ((pawns & !bitboard::FILE_H) << 9)
    } else {
        ((pawns & !bitboard::FILE_H) >> 7) | ((pawns & !bitboard::FILE_A) >> 9)
    }
}

fn splitmix_next(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Logistic noise centered on zero, scaled by `Level` and by how much
/// material is still on the board for the side to move.
fn logistic_noise(rng_state: &mut u64, level: u32, own_material: i32, start_material: i32) -> i32 {
    let raw = splitmix_next(rng_state);
    let p = ((raw >> 11) as f64 / (1u64 << 53) as f64).clamp(1e-6, 1.0 - 1e-6);
    let logit = (p / (1.0 - p)).ln();
    let phase_factor = 0.5 + own_material as f64 / start_material.max(1) as f64;
    let scale = cfg_eval::LEVEL_NOISE_UNIT * level as f64 * phase_factor;
    (scale * logit).round() as i32
}

/// Per-call noise configuration: a UCI `Level` setting and a mutable PRNG
/// stream (owned by the calling worker, advanced one step per evaluation).
pub struct Noise<'a> {
    pub level: u32,
    pub rng_state: &'a mut u64,
}

/// Full static evaluation of `pos`, from White's perspective, blended by
/// game phase. `pawn_hash` caches the pawn-structure term across calls that
/// share a `king_pawn_key`.
pub fn evaluate(pos: &Position, pawn_hash: &mut PawnHashTable, noise: Option<Noise>) -> i32 {
    let mut e = [crate::types::EvalPair::ZERO; 2];
    mobility::accumulate(pos, &mut e);
    king_safety::accumulate(pos, &mut e);
    pattern::accumulate(pos, &mut e);

    let pawn_term = pawns::probe_or_compute(pos, pawn_hash);
    let free_passer = pawns::free_passer_bonus(pos);

    let total = pos.pst + (e[Color::White.index()] - e[Color::Black.index()]) + pawn_term + free_passer;
    let total = pattern::scale_endgame(pos, total);

    let piece_total = pos.piece_material[0] + pos.piece_material[1];
    let mut score = material::blend(total, piece_total);

    if let Some(Noise { level, rng_state }) = noise {
        if level != 0 {
            let start_total = cfg_eval::start_material();
            let own_material = pos.piece_material[pos.turn.index()];
            score += logistic_noise(rng_state, level, own_material, start_total);
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn startpos_is_symmetric() {
        let pos = Position::startpos();
        let mut hash = PawnHashTable::new();
        assert_eq!(evaluate(&pos, &mut hash, None), 0);
    }

    #[test]
    fn extra_queen_is_a_large_advantage() {
        let pos = Position::set("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let mut hash = PawnHashTable::new();
        assert!(evaluate(&pos, &mut hash, None) > 800);
    }

    #[test]
    fn noise_is_deterministic_for_a_fixed_seed() {
        let pos = Position::startpos();
        let mut hash = PawnHashTable::new();
        let mut seed_a = 42u64;
        let mut seed_b = 42u64;
        let a = evaluate(&pos, &mut hash, Some(Noise { level: 10, rng_state: &mut seed_a }));
        let b = evaluate(&pos, &mut hash, Some(Noise { level: 10, rng_state: &mut seed_b }));
        assert_eq!(a, b);
    }
}

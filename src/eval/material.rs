//! Game-phase interpolation. Material and piece-square values themselves
//! live on `Position::pst`, updated incrementally by `make`/`toggle`; this
//! module only does the tapering.

use crate::config::evaluation as cfg_eval;
use crate::types::EvalPair;

/// `score = (op * pieceTotal + eg * (startTotal - pieceTotal)) / startTotal`,
/// where `pieceTotal` is the non-pawn, non-king material still on the board
/// (summed over both colors in endgame units) and `startTotal` is that same
/// sum at the starting position.
pub fn blend(total: EvalPair, piece_total: i32) -> i32 {
    let start_total = cfg_eval::start_material();
    if start_total == 0 {
        return total.eg;
    }
    let piece_total = piece_total.clamp(0, start_total);
    let op_part = total.op as i64 * piece_total as i64;
    let eg_part = total.eg as i64 * (start_total - piece_total) as i64;
    ((op_part + eg_part) / start_total as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_material_returns_opening_score() {
        let start_total = cfg_eval::start_material();
        assert_eq!(blend(EvalPair::new(100, -50), start_total), 100);
    }

    #[test]
    fn no_material_returns_endgame_score() {
        assert_eq!(blend(EvalPair::new(100, -50), 0), -50);
    }

    #[test]
    fn blend_is_linear_at_the_midpoint() {
        let start_total = cfg_eval::start_material();
        let mid = start_total / 2;
        let got = blend(EvalPair::new(100, 300), mid);
        assert!((got - 200).abs() <= 2);
    }
}

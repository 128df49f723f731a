//! Quiescence search: resolve captures (and, when in check, every legal
//! response) until the position is quiet, so the main search never has to
//! evaluate a position in the middle of a capture sequence.

use super::SharedTt;
use crate::config::{evaluation as cfg_eval, search as cfg_search};
use crate::eval;
use crate::movegen;
use crate::ordering::Picker;
use crate::position::Position;
use crate::tt::Bound;
use crate::sync::StopFlag;
use crate::types::{Color, Move, MoveList, PieceKind, NO_SQUARE};
use crate::worker::Worker;

/// Best SEE value among the position's pseudo-legal captures, promotions,
/// and en-passant captures, or 0 if there are none. Used to approximate the
/// value of a position beyond the quiescence depth floor without actually
/// searching it: `staticEval + best available capture's SEE`.
fn best_capture_see(pos: &Position) -> i32 {
    let not_own = !pos.by_color[pos.turn.index()];
    let mut moves = MoveList::new();
    movegen::pawn_moves(pos, not_own, true, &mut moves);
    movegen::piece_moves(pos, not_own, true, &mut moves);

    let mut best = 0;
    for &mv in moves.iter() {
        let is_capture = pos.piece_on[mv.to_sq().index()] != PieceKind::None
            || mv.is_promotion()
            || (pos.piece_on[mv.from_sq().index()] == PieceKind::Pawn
                && pos.ep_square != NO_SQUARE
                && mv.to_sq().0 == pos.ep_square);
        if is_capture {
            best = best.max(pos.see(mv));
        }
    }
    best
}

/// `qdepth` starts at 0 on the call from the main search and decrements
/// each recursive step; once it passes `MIN_QUIESCENCE_DEPTH` the search
/// stops trying further captures and returns the stand-pat score. `ply` is
/// the absolute distance from the search root, used for mate scoring.
#[allow(clippy::too_many_arguments)]
pub fn quiescence(
    pos: &Position,
    worker: &mut Worker,
    tt: &SharedTt,
    stop: &StopFlag,
    mut alpha: i32,
    beta: i32,
    ply: i32,
    qdepth: i32,
) -> i32 {
    worker.nodes += 1;
    worker.seldepth = worker.seldepth.max(ply);

    if stop.is_stopped() {
        return alpha;
    }

    let in_check = pos.checkers != 0;
    let probe = tt.lock().unwrap().probe(pos.key, ply);
    if probe.found {
        match probe.bound {
            Bound::Exact => return probe.score,
            Bound::Lower if probe.score >= beta => return probe.score,
            Bound::Upper if probe.score <= alpha => return probe.score,
            _ => {}
        }
    }

    let static_eval = if in_check {
        -cfg_eval::MATE_SCORE + ply
    } else {
        eval::evaluate(pos, &mut worker.pawn_hash, None) * if pos.turn == Color::White { 1 } else { -1 }
            + cfg_eval::TEMPO
    };

    if !in_check {
        if static_eval >= beta {
            return static_eval;
        }
        alpha = alpha.max(static_eval);
        if qdepth < cfg_search::MIN_QUIESCENCE_DEPTH {
            return static_eval + best_capture_see(pos);
        }
    }

    let mut moves = MoveList::new();
    if in_check {
        movegen::check_escapes(pos, true, &mut moves);
    } else {
        let not_own = !pos.by_color[pos.turn.index()];
        movegen::pawn_moves(pos, not_own, true, &mut moves);
        movegen::piece_moves(pos, not_own, true, &mut moves);
    }

    let pins = pos.calc_pins();
    let history = &worker.history;
    let mut picker = Picker::new(&mut moves, pos, Move::NONE, history, None, None);

    let mut best = if in_check { -cfg_eval::MATE_SCORE + ply } else { static_eval };
    let mut any_legal = false;

    while let Some(mv) = picker.next() {
        if !movegen::is_legal(pos, pins, mv) {
            continue;
        }
        any_legal = true;

        let is_capture = pos.piece_on[mv.to_sq().index()] != PieceKind::None
            || mv.is_promotion()
            || (pos.piece_on[mv.from_sq().index()] == PieceKind::Pawn
                && pos.ep_square != NO_SQUARE
                && mv.to_sq().0 == pos.ep_square);

        if !in_check {
            if !is_capture {
                continue;
            }
            if pos.see(mv) < 0 {
                continue;
            }
        }

        let child = Position::make(pos, mv);
        let score = -quiescence(&child, worker, tt, stop, -beta, -alpha, ply + 1, qdepth - 1);

        if score > best {
            best = score;
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    break;
                }
            }
        }
    }

    if in_check && !any_legal {
        return -cfg_eval::MATE_SCORE + ply;
    }

    best
}

//! Principal-variation search: the main alpha-beta driver with null-move
//! pruning, razoring, reverse futility pruning, late-move pruning and
//! reductions, SEE pruning, and singular extension.

use super::quiescence::quiescence;
use super::reductions;
use super::SharedTt;
use crate::config::{evaluation as cfg_eval, search as cfg_search};
use crate::eval;
use crate::movegen;
use crate::ordering::Picker;
use crate::position::Position;
use crate::sync::StopFlag;
use crate::tt::Bound;
use crate::types::{Color, Move, MoveList, PieceKind, Square};
use crate::worker::Worker;

fn is_insufficient_material(pos: &Position) -> bool {
    let non_king = (pos.by_color[0] | pos.by_color[1]) & !pos.by_piece[PieceKind::King.index()];
    if non_king == 0 {
        return true;
    }
    if non_king.count_ones() == 1 {
        let minor = pos.by_piece[PieceKind::Knight.index()] | pos.by_piece[PieceKind::Bishop.index()];
        return non_king & minor != 0;
    }
    false
}

fn is_draw(pos: &Position, worker: &Worker) -> bool {
    pos.rule50 >= crate::config::game::RULE50_LIMIT
        || is_insufficient_material(pos)
        || worker.is_repetition(pos.key, pos.rule50)
}

fn refine_eval(tt_score: i32, tt_bound: Bound, raw_eval: i32, alpha: i32, beta: i32) -> i32 {
    match tt_bound {
        Bound::Exact => tt_score,
        Bound::Lower if tt_score > raw_eval => tt_score,
        Bound::Upper if tt_score < raw_eval => tt_score,
        _ => raw_eval,
    }
    .clamp(alpha.min(raw_eval), beta.max(raw_eval))
}

fn static_eval_of(pos: &Position, worker: &mut Worker) -> i32 {
    let sign = if pos.turn == Color::White { 1 } else { -1 };
    eval::evaluate(pos, &mut worker.pawn_hash, None) * sign + cfg_eval::TEMPO
}

/// `pv` receives the principal variation from this node downward (empty if
/// none). Returns the negamax score from the side-to-move's perspective.
#[allow(clippy::too_many_arguments)]
pub fn negamax(
    pos: &Position,
    worker: &mut Worker,
    tt: &SharedTt,
    stop: &StopFlag,
    depth: i32,
    mut alpha: i32,
    beta: i32,
    ply: i32,
    is_pv: bool,
    skip_move: Move,
    prev_move: Option<(Square, PieceKind)>,
    grandparent_move: Option<(Square, PieceKind)>,
    pv: &mut Vec<Move>,
) -> i32 {
    pv.clear();
    worker.nodes += 1;

    if stop.is_stopped() {
        return alpha;
    }

    if ply > 0 && is_draw(pos, worker) {
        return 0;
    }

    if ply >= crate::config::game::MAX_PLY as i32 {
        return static_eval_of(pos, worker);
    }

    if depth <= 0 {
        return quiescence(pos, worker, tt, stop, alpha, beta, ply, 0);
    }

    let in_check = pos.checkers != 0;
    let orig_alpha = alpha;

    let probe = if skip_move.is_none() { tt.lock().unwrap().probe(pos.key, ply) } else { Default::default() };
    if probe.found && !is_pv && probe.depth >= depth {
        match probe.bound {
            Bound::Exact => return probe.score,
            Bound::Lower if probe.score >= beta => return probe.score,
            Bound::Upper if probe.score <= alpha => return probe.score,
            _ => {}
        }
    }

    let raw_eval = static_eval_of(pos, worker);
    let refined_eval = if probe.found {
        refine_eval(probe.score, probe.bound, raw_eval, alpha, beta)
    } else {
        raw_eval
    };

    if !in_check && !is_pv && skip_move.is_none() {
        // Reverse futility / eval pruning: a big enough static-eval margin
        // over beta means no child line is likely to claw it back.
        if depth <= cfg_search::EVAL_PRUNING_MAX_DEPTH
            && refined_eval - cfg_search::EVAL_MARGIN[depth as usize] >= beta
        {
            return refined_eval;
        }

        // Razoring: far below alpha with little depth left, confirm with a
        // quiescence search instead of a full-width one.
        if depth <= cfg_search::RAZOR_MAX_DEPTH
            && refined_eval + cfg_search::RAZOR_MARGIN[depth as usize] <= alpha
        {
            let q = quiescence(pos, worker, tt, stop, alpha, alpha + 1, ply, 0);
            if q <= alpha {
                return q;
            }
        }

        // Null move: let the opponent move twice; if they still can't catch
        // up, this position is too good for a reduced verification search.
        if depth >= cfg_search::NULL_MOVE_MIN_DEPTH
            && refined_eval >= beta + cfg_search::NULL_MOVE_MARGIN
            && (pos.by_color[pos.turn.index()] & !pos.by_piece[PieceKind::Pawn.index()] & !pos.by_piece[PieceKind::King.index()]) != 0
        {
            let reduction = cfg_search::NULL_MOVE_BASE_REDUCTION + depth / cfg_search::NULL_MOVE_DEPTH_DIVISOR;
            let child = Position::toggle(pos);
            let mut child_pv = Vec::new();
            worker.push_key(pos.key);
            let score = -negamax(
                &child,
                worker,
                tt,
                stop,
                depth - 1 - reduction,
                -beta,
                -beta + 1,
                ply + 1,
                false,
                Move::NONE,
                None,
                None,
                &mut child_pv,
            );
            worker.pop_key();
            if score >= beta {
                return score;
            }
        }
    }

    let pins = pos.calc_pins();
    let mut moves = MoveList::new();
    if in_check {
        movegen::check_escapes(pos, true, &mut moves);
    } else {
        let not_own = !pos.by_color[pos.turn.index()];
        movegen::pawn_moves(pos, not_own, true, &mut moves);
        movegen::piece_moves(pos, not_own, true, &mut moves);
        movegen::castling_moves(pos, &mut moves);
    }

    let tt_move = probe.mv;
    let history = &worker.history;
    let mut picker = Picker::new(&mut moves, pos, tt_move, history, prev_move, grandparent_move);

    let mut best_score = -cfg_eval::MATE_SCORE;
    let mut best_move = Move::NONE;
    let mut legal_count = 0;
    let mut tried_quiets: Vec<(Move, PieceKind)> = Vec::with_capacity(32);
    let mut child_pv = Vec::new();

    while let Some(mv) = picker.next() {
        if mv == skip_move || !movegen::is_legal(pos, pins, mv) {
            continue;
        }

        let mover_kind = pos.piece_on[mv.from_sq().index()];
        let is_capture = pos.piece_on[mv.to_sq().index()] != PieceKind::None || mv.is_promotion();

        // Late move pruning: once many quiets have been tried at shallow
        // depth without improving alpha, stop looking at more of them.
        if !in_check
            && !is_pv
            && !is_capture
            && depth <= cfg_search::LATE_MOVE_PRUNING_MAX_DEPTH
            && legal_count
                >= cfg_search::LATE_MOVE_PRUNING_BASE + cfg_search::LATE_MOVE_PRUNING_SLOPE * depth
        {
            continue;
        }

        // SEE pruning: skip moves that lose too much material at shallow
        // depth, scaled by whether the move is a capture or a quiet check.
        if !in_check && depth <= cfg_search::SEE_PRUNING_MAX_DEPTH && legal_count > 0 {
            let row = if is_capture { 0 } else { 1 };
            let margin = cfg_search::SEE_MARGIN[row][depth.clamp(0, 5) as usize];
            if pos.see(mv) < margin {
                continue;
            }
        }

        legal_count += 1;
        let child = Position::make(pos, mv);
        let gives_check = child.checkers != 0;

        let mut extension = 0;
        if gives_check {
            extension = 1;
        } else if skip_move.is_none()
            && mv == tt_move
            && depth >= cfg_search::SINGULAR_MIN_DEPTH
            && probe.depth >= depth - cfg_search::SINGULAR_DEPTH_MARGIN
            && probe.bound != Bound::Upper
        {
            let singular_beta = probe.score - cfg_search::SINGULAR_SCORE_MARGIN * depth;
            let mut unused_pv = Vec::new();
            let singular_score = negamax(
                pos,
                worker,
                tt,
                stop,
                (depth - 1) / 2,
                singular_beta - 1,
                singular_beta,
                ply,
                false,
                tt_move,
                prev_move,
                grandparent_move,
                &mut unused_pv,
            );
            if singular_score < singular_beta {
                extension = 1;
            }
        }

        let child_prev = Some((mv.to_sq(), mover_kind));
        let child_grandparent = prev_move;

        worker.push_key(pos.key);
        let score = if legal_count == 1 {
            -negamax(
                &child,
                worker,
                tt,
                stop,
                depth - 1 + extension,
                -beta,
                -alpha,
                ply + 1,
                is_pv,
                Move::NONE,
                child_prev,
                child_grandparent,
                &mut child_pv,
            )
        } else {
            let mut reduction = 0;
            if !in_check && !is_capture && depth >= 3 && legal_count > 1 {
                reduction = reductions::reduction(depth, legal_count);
                let (from, to) = (mv.from_sq(), mv.to_sq());
                if worker.history.quiet_score(pos.turn.index(), from, to) > cfg_search::LMR_GOOD_HISTORY_THRESHOLD {
                    reduction -= 1;
                }
                reduction = reduction.clamp(0, depth - 1);
            }

            let mut s = -negamax(
                &child,
                worker,
                tt,
                stop,
                depth - 1 + extension - reduction,
                -alpha - 1,
                -alpha,
                ply + 1,
                false,
                Move::NONE,
                child_prev,
                child_grandparent,
                &mut child_pv,
            );
            if s > alpha && (reduction > 0 || (is_pv && s < beta)) {
                s = -negamax(
                    &child,
                    worker,
                    tt,
                    stop,
                    depth - 1 + extension,
                    -beta,
                    -alpha,
                    ply + 1,
                    is_pv,
                    Move::NONE,
                    child_prev,
                    child_grandparent,
                    &mut child_pv,
                );
            }
            s
        };
        worker.pop_key();

        if !is_capture {
            tried_quiets.push((mv, mover_kind));
        }

        if score > best_score {
            best_score = score;
            best_move = mv;
            if score > alpha {
                alpha = score;
                pv.clear();
                pv.push(mv);
                pv.extend_from_slice(&child_pv);
                if alpha >= beta {
                    break;
                }
            }
        }
    }

    if legal_count == 0 {
        return if in_check { -cfg_eval::MATE_SCORE + ply } else { 0 };
    }

    if best_score >= beta && !best_move.is_none() {
        if let Some(best_idx) = tried_quiets.iter().position(|&(m, _)| m == best_move) {
            let color = pos.turn.index();
            worker.history.update(color, &tried_quiets, best_idx, depth);
            if let Some((_, prev_kind)) = prev_move {
                worker.history.update_refutation(color, best_move.to_sq(), prev_kind, depth);
            }
            if let Some((_, grandparent_kind)) = grandparent_move {
                worker.history.update_follow_up(color, best_move.to_sq(), grandparent_kind, depth);
            }
        }
    }

    if skip_move.is_none() {
        let bound = if best_score <= orig_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        tt.lock().unwrap().store(pos.key, best_move, best_score, raw_eval, depth, bound, ply);
    }

    best_score
}

//! Move ordering: a per-node scorer plus the history tables it reads, and a
//! selection-sort iterator so the search only pays for the prefix of the
//! move list it actually visits.

use crate::config::search as cfg_search;
use crate::position::Position;
use crate::types::{Move, MoveList, PieceKind, Square, NUM_PIECE_KINDS};

/// Butterfly, refutation (the move that followed the opponent's last move),
/// and follow-up (the move that followed our own move two plies back)
/// history, each gravity-bounded toward `±HISTORY_MAX`.
pub struct History {
    butterfly: Vec<[[i32; 64]; 64]>,
    refutation: Vec<[[i32; 64]; NUM_PIECE_KINDS]>,
    follow_up: Vec<[[i32; 64]; NUM_PIECE_KINDS]>,
}

fn gravity_update(v: &mut i32, bonus: i32) {
    let bonus = bonus.clamp(-cfg_search::HISTORY_MAX, cfg_search::HISTORY_MAX);
    *v += cfg_search::HISTORY_GRAVITY_SCALE * bonus - *v * bonus.abs() / cfg_search::HISTORY_BONUS_DIVISOR;
    *v = (*v).clamp(-cfg_search::HISTORY_MAX, cfg_search::HISTORY_MAX);
}

impl History {
    pub fn new() -> History {
        History {
            butterfly: vec![[[0; 64]; 64]; 2],
            refutation: vec![[[0; 64]; NUM_PIECE_KINDS]; 2],
            follow_up: vec![[[0; 64]; NUM_PIECE_KINDS]; 2],
        }
    }

    pub fn clear(&mut self) {
        self.butterfly = vec![[[0; 64]; 64]; 2];
        self.refutation = vec![[[0; 64]; NUM_PIECE_KINDS]; 2];
        self.follow_up = vec![[[0; 64]; NUM_PIECE_KINDS]; 2];
    }

    /// Raw butterfly score for `from` -> `to`, used by LMR's "good history"
    /// reduction exemption without pulling in refutation/follow-up context.
    pub fn quiet_score(&self, color: usize, from: Square, to: Square) -> i32 {
        self.butterfly[color][from.index()][to.index()]
    }

    fn score(&self, color: usize, prev_kind: Option<PieceKind>, grandparent_kind: Option<PieceKind>, mv: Move) -> i32 {
        let from = mv.from_sq();
        let to = mv.to_sq();
        let mut s = self.butterfly[color][from.index()][to.index()];
        if let Some(k) = prev_kind {
            s += self.refutation[color][to.index()][k.index()];
        }
        if let Some(k) = grandparent_kind {
            s += self.follow_up[color][to.index()][k.index()];
        }
        s
    }

    /// Rewards the move that caused a beta cutoff and penalizes every quiet
    /// move tried before it at the same node.
    pub fn update(&mut self, color: usize, tried: &[(Move, PieceKind)], best_idx: usize, depth: i32) {
        let bonus = depth * depth;
        for (i, &(mv, _)) in tried.iter().enumerate() {
            let from = mv.from_sq();
            let to = mv.to_sq();
            let delta = if i == best_idx { bonus } else { -bonus };
            gravity_update(&mut self.butterfly[color][from.index()][to.index()], delta);
        }
    }

    pub fn update_refutation(&mut self, color: usize, prev_to: Square, prev_kind: PieceKind, depth: i32) {
        gravity_update(&mut self.refutation[color][prev_to.index()][prev_kind.index()], depth * depth);
    }

    pub fn update_follow_up(&mut self, color: usize, to: Square, kind: PieceKind, depth: i32) {
        gravity_update(&mut self.follow_up[color][to.index()][kind.index()], depth * depth);
    }
}

impl Default for History {
    fn default() -> History {
        History::new()
    }
}

/// Per-move ordering score: the TT move sorts first via a sentinel above
/// every capture score; captures are scored by SEE offset by
/// `+ORDERING_SEPARATION` when the exchange is good (`see >= 0`) or
/// `-ORDERING_SEPARATION` when it's bad, so winning captures always sort
/// above every quiet move and losing captures always sort below every quiet
/// move; quiets are scored by summed history.
pub fn score_move(
    pos: &Position,
    mv: Move,
    tt_move: Move,
    history: &History,
    prev: Option<(Square, PieceKind)>,
    grandparent: Option<(Square, PieceKind)>,
) -> i32 {
    if !tt_move.is_none() && mv == tt_move {
        return i32::MAX;
    }

    let to = mv.to_sq();
    let is_capture = pos.piece_on[to.index()] != PieceKind::None || is_en_passant(pos, mv);
    if is_capture || mv.is_promotion() {
        let see = pos.see(mv);
        return if see >= 0 { see + cfg_search::ORDERING_SEPARATION } else { see - cfg_search::ORDERING_SEPARATION };
    }

    let color = pos.turn.index();
    let prev_kind = prev.map(|(_, k)| k);
    let grandparent_kind = grandparent.map(|(_, k)| k);
    history.score(color, prev_kind, grandparent_kind, mv)
}

fn is_en_passant(pos: &Position, mv: Move) -> bool {
    let from = mv.from_sq();
    pos.piece_on[from.index()] == PieceKind::Pawn
        && pos.ep_square != crate::types::NO_SQUARE
        && mv.to_sq().0 == pos.ep_square
}

/// Selection-sort iterator: each call finds the best-scored remaining move
/// in `moves[cursor..]`, swaps it to the front, and returns it. Cheaper than
/// a full sort when the search cuts off after a handful of moves.
pub struct Picker<'a> {
    moves: &'a mut MoveList,
    scores: Vec<i32>,
    cursor: usize,
}

impl<'a> Picker<'a> {
    pub fn new(
        moves: &'a mut MoveList,
        pos: &Position,
        tt_move: Move,
        history: &History,
        prev: Option<(Square, PieceKind)>,
        grandparent: Option<(Square, PieceKind)>,
    ) -> Picker<'a> {
        let scores = moves.iter().map(|&mv| score_move(pos, mv, tt_move, history, prev, grandparent)).collect();
        Picker { moves, scores, cursor: 0 }
    }

    pub fn next(&mut self) -> Option<Move> {
        if self.cursor >= self.moves.len() {
            return None;
        }
        let mut best = self.cursor;
        for i in (self.cursor + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.as_mut_slice().swap(self.cursor, best);
        self.scores.swap(self.cursor, best);
        let mv = self.moves[self.cursor];
        self.cursor += 1;
        Some(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn tt_move_sorts_first() {
        let pos = Position::startpos();
        let mut moves = MoveList::new();
        crate::movegen::piece_moves(&pos, !0, true, &mut moves);
        crate::movegen::pawn_moves(&pos, !0, true, &mut moves);
        let tt_move = moves[moves.len() - 1];
        let history = History::new();
        let mut picker = Picker::new(&mut moves, &pos, tt_move, &history, None, None);
        assert_eq!(picker.next(), Some(tt_move));
    }

    #[test]
    fn winning_capture_outranks_quiet_move() {
        let pos = Position::set("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mut moves = MoveList::new();
        crate::movegen::pawn_moves(&pos, !0, true, &mut moves);
        crate::movegen::piece_moves(&pos, !0, true, &mut moves);
        let history = History::new();
        let mut picker = Picker::new(&mut moves, &pos, Move::NONE, &history, None, None);
        let first = picker.next().unwrap();
        assert_eq!(first.to_sq(), Square::from_str("d5").unwrap());
    }

    #[test]
    fn losing_capture_sorts_below_a_quiet_move() {
        // Qxd5 loses the queen to the rook behind it; any quiet move should
        // now outrank it.
        let pos = Position::set("4k3/3r4/8/3p4/8/8/8/3QK3 w - - 0 1").unwrap();
        let mut moves = MoveList::new();
        crate::movegen::pawn_moves(&pos, !0, true, &mut moves);
        crate::movegen::piece_moves(&pos, !0, true, &mut moves);
        let history = History::new();
        let mut picker = Picker::new(&mut moves, &pos, Move::NONE, &history, None, None);
        let first = picker.next().unwrap();
        assert_ne!(first.to_sq(), Square::from_str("d5").unwrap());
    }

    #[test]
    fn history_bonus_raises_a_quiet_moves_score() {
        let pos = Position::startpos();
        let mut history = History::new();
        let mv = Move::new(Square::from_str("g1").unwrap(), Square::from_str("f3").unwrap(), PieceKind::None);
        let before = score_move(&pos, mv, Move::NONE, &history, None, None);
        history.update(0, &[(mv, PieceKind::Knight)], 0, 4);
        let after = score_move(&pos, mv, Move::NONE, &history, None, None);
        assert!(after > before);
    }

    #[test]
    fn refutation_bonus_raises_a_quiet_moves_score_in_matching_context() {
        let pos = Position::startpos();
        let mut history = History::new();
        let mv = Move::new(Square::from_str("g1").unwrap(), Square::from_str("f3").unwrap(), PieceKind::None);
        let prev = Some((Square::from_str("e5").unwrap(), PieceKind::Pawn));
        let before = score_move(&pos, mv, Move::NONE, &history, prev, None);
        history.update_refutation(0, mv.to_sq(), PieceKind::Pawn, 4);
        let after = score_move(&pos, mv, Move::NONE, &history, prev, None);
        assert!(after > before);
    }

    #[test]
    fn follow_up_bonus_raises_a_quiet_moves_score_in_matching_context() {
        let pos = Position::startpos();
        let mut history = History::new();
        let mv = Move::new(Square::from_str("g1").unwrap(), Square::from_str("f3").unwrap(), PieceKind::None);
        let grandparent = Some((Square::from_str("d2").unwrap(), PieceKind::Knight));
        let before = score_move(&pos, mv, Move::NONE, &history, None, grandparent);
        history.update_follow_up(0, mv.to_sq(), PieceKind::Knight, 4);
        let after = score_move(&pos, mv, Move::NONE, &history, None, grandparent);
        assert!(after > before);
    }
}

//! Search orchestration: iterative deepening with aspiration windows, run by
//! a lazy-SMP pool of worker threads sharing one transposition table.

mod negamax;
pub mod quiescence;
mod reductions;

use crate::config::search as cfg_search;
use crate::position::Position;
use crate::sync::StopFlag;
use crate::tt::TranspositionTable;
use crate::types::Move;
use crate::worker::{should_search_depth, Worker, Workers};
use std::sync::{Arc, Mutex};

/// Transposition table shared by every worker thread. A mutex is simpler and
/// safer than a lock-free entry layout, at the cost of one lock per probe;
/// acceptable while the table is the only point of cross-thread contention.
pub type SharedTt = Arc<Mutex<TranspositionTable>>;

/// One completed (or partially-searched, if interrupted) depth's result,
/// reported by the depth-zero worker after each iteration.
#[derive(Clone, Debug)]
pub struct DepthReport {
    pub depth: i32,
    pub seldepth: i32,
    pub score: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

/// Search limits, resolved by the caller (the UCI `go` handler) from engine
/// options and the `go` command's own parameters into a single depth/time
/// budget understood here.
pub struct Limits {
    pub max_depth: i32,
}

impl Limits {
    pub fn depth(max_depth: i32) -> Limits {
        Limits { max_depth: max_depth.clamp(1, crate::config::game::MAX_PLY as i32) }
    }
}

/// Runs iterative deepening on every worker in `workers` in parallel, calling
/// `report` each time worker 0 finishes a depth. Stops when `stop` is set
/// (by the caller's time controller) or `limits.max_depth` is reached.
/// Returns the last fully or partially completed report from worker 0.
pub fn think(
    root: &Position,
    workers: &mut Workers,
    tt: &SharedTt,
    stop: &StopFlag,
    limits: &Limits,
    root_history: &[u64],
    mut report: impl FnMut(&DepthReport) + Send,
) -> Option<DepthReport> {
    workers.new_search(root_history);
    tt.lock().unwrap().new_search();

    let (tx, rx) = std::sync::mpsc::channel::<DepthReport>();
    let max_depth = limits.max_depth;

    std::thread::scope(|scope| {
        for worker in workers.iter_mut() {
            let tx = tx.clone();
            let root = root.clone();
            scope.spawn(move || {
                run_worker(&root, worker, tt, stop, max_depth, &tx);
            });
        }
        drop(tx);

        let mut last = None;
        for r in rx {
            report(&r);
            last = Some(r);
        }
        last
    })
}

fn run_worker(
    root: &Position,
    worker: &mut Worker,
    tt: &SharedTt,
    stop: &StopFlag,
    max_depth: i32,
    tx: &std::sync::mpsc::Sender<DepthReport>,
) {
    let is_reporter = crate::worker::is_reporting_worker(worker.id);
    let mut window = cfg_search::ASPIRATION_INITIAL_WINDOW;
    let mut prev_score = 0;

    for depth in 1..=max_depth {
        if stop.is_stopped() {
            return;
        }
        if !should_search_depth(worker.id, depth) {
            continue;
        }

        let mut alpha = if depth <= 2 { -crate::config::evaluation::MATE_SCORE } else { prev_score - window };
        let mut beta = if depth <= 2 { crate::config::evaluation::MATE_SCORE } else { prev_score + window };
        let mut pv = Vec::new();

        let score = loop {
            if stop.is_stopped() {
                return;
            }
            pv.clear();
            let s =
                negamax::negamax(root, worker, tt, stop, depth, alpha, beta, 0, true, Move::NONE, None, None, &mut pv);
            if stop.is_stopped() {
                return;
            }
            if s <= alpha {
                window = (window as f64 * cfg_search::ASPIRATION_GROWTH) as i32;
                alpha = (prev_score - window).max(-crate::config::evaluation::MATE_SCORE);
            } else if s >= beta {
                window = (window as f64 * cfg_search::ASPIRATION_GROWTH) as i32;
                beta = (prev_score + window).min(crate::config::evaluation::MATE_SCORE);
            } else {
                break s;
            }
        };

        prev_score = score;
        window = cfg_search::ASPIRATION_INITIAL_WINDOW;

        if is_reporter {
            let _ = tx.send(DepthReport {
                depth,
                seldepth: worker.seldepth,
                score,
                nodes: worker.nodes,
                pv,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tt::TranspositionTable;

    #[test]
    fn think_finds_a_mate_in_one() {
        let pos = Position::set("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut workers = Workers::new(1);
        let tt: SharedTt = Arc::new(Mutex::new(TranspositionTable::new(1)));
        let stop = StopFlag::new();
        let limits = Limits::depth(4);

        let result = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {});
        let report = result.expect("search should report at least one depth");
        assert!(report.score >= crate::config::evaluation::MATE_SCORE - 100);
        assert!(!report.pv.is_empty());
    }

    #[test]
    fn think_respects_the_stop_flag() {
        let pos = Position::startpos();
        let mut workers = Workers::new(1);
        let tt: SharedTt = Arc::new(Mutex::new(TranspositionTable::new(1)));
        let stop = StopFlag::new();
        stop.stop();
        let limits = Limits::depth(10);

        let result = think(&pos, &mut workers, &tt, &stop, &limits, &[], |_| {});
        assert!(result.is_none());
    }
}

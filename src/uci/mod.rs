//! Universal Chess Interface command loop: reads commands from stdin, drives
//! the position/search state, and writes `info`/`bestmove` lines to stdout.

pub mod command;
pub mod options;
pub mod protocol;

use crate::config::game::MAX_PLY;
use crate::info::Info;
use crate::position::Position;
use crate::search::{self, Limits, SharedTt};
use crate::sync::StopFlag;
use crate::timer::{self, ClockInfo, DeadlineTimer};
use crate::tt::TranspositionTable;
use crate::types::Color;
use crate::worker::Workers;
use command::{parse_uci_command, GoParams, UciCommand};
use options::{EngineOptions, OptionAction};
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

struct Engine {
    pos: Position,
    game_history: Vec<u64>,
    options: EngineOptions,
    workers: Arc<Mutex<Workers>>,
    tt: SharedTt,
    stop: StopFlag,
    info: Arc<Info>,
    search_handle: Option<JoinHandle<()>>,
    timer: Option<DeadlineTimer>,
}

impl Engine {
    fn new() -> Engine {
        let options = EngineOptions::new();
        Engine {
            pos: Position::startpos(),
            game_history: Vec::new(),
            workers: Arc::new(Mutex::new(Workers::new(options.threads))),
            tt: Arc::new(Mutex::new(TranspositionTable::new(options.hash_mb))),
            options,
            stop: StopFlag::new(),
            info: Arc::new(Info::new()),
            search_handle: None,
            timer: None,
        }
    }

    fn stop_search(&mut self) {
        self.stop.stop();
        if let Some(handle) = self.search_handle.take() {
            let _ = handle.join();
        }
        self.timer.take();
    }

    fn handle_go(&mut self, go: GoParams) {
        self.stop_search();
        self.stop.reset();
        self.info.reset();

        let clock = if self.pos.turn == Color::White {
            ClockInfo { time_ms: go.wtime, inc_ms: go.winc, moves_to_go: go.movestogo, move_time_ms: go.movetime }
        } else {
            ClockInfo { time_ms: go.btime, inc_ms: go.binc, moves_to_go: go.movestogo, move_time_ms: go.movetime }
        };

        let budget = if go.infinite { None } else { timer::allocate(clock) };
        self.timer = budget.and_then(|d| DeadlineTimer::start(d, self.stop.clone()));

        let limits = Limits::depth(go.depth.unwrap_or(MAX_PLY as i32));
        let root = self.pos.clone();
        let root_history = self.game_history.clone();
        let workers = Arc::clone(&self.workers);
        let tt = Arc::clone(&self.tt);
        let stop = self.stop.clone();
        let info = Arc::clone(&self.info);

        self.search_handle = Some(std::thread::spawn(move || {
            let mut workers = workers.lock().unwrap();
            let hashfull = tt.lock().unwrap().permille();
            let result = search::think(&root, &mut workers, &tt, &stop, &limits, &root_history, |report| {
                info.update(report, hashfull, false);
            });
            match result.and_then(|r| r.pv.first().copied().map(|best| (best, r.pv.get(1).copied()))) {
                Some((best, ponder)) => info.print_bestmove(best, ponder),
                None => println!("bestmove 0000"),
            }
        }));
    }

    fn handle_setoption(&mut self, name: &str, value: Option<&str>) {
        #[cfg(feature = "logging")]
        log::debug!("setoption {} = {:?}", name, value);

        match self.options.apply(name, value) {
            Some(OptionAction::ReinitHash(mb)) => {
                *self.tt.lock().unwrap() = TranspositionTable::new(mb);
            }
            Some(OptionAction::SetThreads(n)) => {
                self.workers.lock().unwrap().resize(n);
            }
            None => {}
        }
    }

    fn handle_command(&mut self, cmd: UciCommand) -> bool {
        match cmd {
            UciCommand::Uci => self.options.print(),
            UciCommand::IsReady => println!("readyok"),
            UciCommand::UciNewGame => {
                self.pos = Position::startpos();
                self.game_history.clear();
                self.tt.lock().unwrap().clear();
                self.workers.lock().unwrap().clear();
            }
            UciCommand::Position(parts) => match protocol::apply_position_command(&mut self.pos, &parts) {
                Ok(history) => self.game_history = history,
                Err(e) => eprintln!("{e}"),
            },
            UciCommand::Go(go) => self.handle_go(go),
            UciCommand::SetOption { name, value } => self.handle_setoption(&name, value.as_deref()),
            UciCommand::Stop => self.stop_search(),
            UciCommand::PonderHit => {}
            UciCommand::Quit => {
                self.stop_search();
                return false;
            }
            UciCommand::Unknown(line) => eprintln!("unrecognized command: {}", line),
        }
        true
    }
}

/// Reads UCI commands from stdin until `quit` or end of input.
pub fn run() {
    #[cfg(feature = "logging")]
    log::info!("starting UCI command loop");

    let mut engine = Engine::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(cmd) = parse_uci_command(&line) else { continue };
        if !engine.handle_command(cmd) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ucinewgame_resets_the_position() {
        let mut engine = Engine::new();
        let parts: Vec<String> =
            "position startpos moves e2e4".split_whitespace().map(String::from).collect();
        let _ = protocol::apply_position_command(&mut engine.pos, &parts).unwrap();
        assert_ne!(engine.pos.key, Position::startpos().key);

        engine.handle_command(UciCommand::UciNewGame);
        assert_eq!(engine.pos.key, Position::startpos().key);
    }

    #[test]
    fn setoption_hash_reinitializes_the_table() {
        let mut engine = Engine::new();
        engine.handle_command(UciCommand::SetOption { name: "Hash".to_string(), value: Some("8".to_string()) });
        assert_eq!(engine.options.hash_mb, 8);
    }
}

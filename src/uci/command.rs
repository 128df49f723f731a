//! Parsing raw UCI input lines into typed commands.

use std::fmt;

/// Failures surfaced while applying a parsed command, as opposed to malformed
/// input (which `parse_uci_command` already downgrades to `Unknown`).
#[derive(Debug)]
pub enum UciError {
    Fen(crate::position::FenError),
    Move(crate::movegen::MoveParseError),
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::Fen(e) => write!(f, "position fen: {e}"),
            UciError::Move(e) => write!(f, "invalid move: {e}"),
        }
    }
}

impl std::error::Error for UciError {}

impl From<crate::position::FenError> for UciError {
    fn from(e: crate::position::FenError) -> UciError {
        UciError::Fen(e)
    }
}

impl From<crate::movegen::MoveParseError> for UciError {
    fn from(e: crate::movegen::MoveParseError) -> UciError {
        UciError::Move(e)
    }
}

#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(GoParams),
    SetOption { name: String, value: Option<String> },
    Stop,
    PonderHit,
    Quit,
    Unknown(String),
}

#[derive(Default, Debug, Clone)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub movestogo: Option<u32>,
    pub depth: Option<i32>,
    pub infinite: bool,
    pub ponder: bool,
}

fn parse_next<T: std::str::FromStr>(parts: &[&str], i: usize) -> Option<T> {
    parts.get(i + 1).and_then(|v| v.parse::<T>().ok())
}

fn parse_go_params(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 1;
    while i < parts.len() {
        let consumed = match parts[i] {
            "wtime" => {
                params.wtime = parse_next(parts, i);
                2
            }
            "btime" => {
                params.btime = parse_next(parts, i);
                2
            }
            "winc" => {
                params.winc = parse_next(parts, i);
                2
            }
            "binc" => {
                params.binc = parse_next(parts, i);
                2
            }
            "movetime" => {
                params.movetime = parse_next(parts, i);
                2
            }
            "movestogo" => {
                params.movestogo = parse_next(parts, i);
                2
            }
            "depth" => {
                params.depth = parse_next(parts, i);
                2
            }
            "infinite" => {
                params.infinite = true;
                1
            }
            "ponder" => {
                params.ponder = true;
                1
            }
            _ => 1,
        };
        i += consumed;
    }
    params
}

fn parse_setoption(parts: &[&str]) -> Option<UciCommand> {
    let mut name_parts = Vec::new();
    let mut value_parts = Vec::new();
    let mut mode = "";
    for part in parts.iter().skip(1) {
        match *part {
            "name" => mode = "name",
            "value" => mode = "value",
            _ => match mode {
                "name" => name_parts.push(*part),
                "value" => value_parts.push(*part),
                _ => {}
            },
        }
    }
    if name_parts.is_empty() {
        return None;
    }
    let name = name_parts.join(" ");
    let value = if value_parts.is_empty() { None } else { Some(value_parts.join(" ")) };
    Some(UciCommand::SetOption { name, value })
}

pub fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();

    let cmd = match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(parts.iter().map(|s| s.to_string()).collect()),
        "go" => UciCommand::Go(parse_go_params(&parts)),
        "setoption" => return parse_setoption(&parts),
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(trimmed.to_string()),
    };
    Some(cmd)
}

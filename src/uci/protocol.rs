//! Applying the `position` command and formatting moves/results for output.

use super::command::UciError;
use crate::movegen;
use crate::position::Position;

/// Applies a `position [startpos|fen <fen>] [moves ...]` command (already
/// split on whitespace, `parts[0] == "position"`) to `pos`. Leaves `pos`
/// unchanged on error rather than applying a partial prefix of the moves.
/// Returns the Zobrist key of every position visited strictly before the
/// final one, oldest first, so the caller can seed search-time repetition
/// detection with the real game history rather than just the search tree.
pub fn apply_position_command(pos: &mut Position, parts: &[String]) -> Result<Vec<u64>, UciError> {
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
    let mut i = 1;
    if i >= parts.len() {
        return Ok(Vec::new());
    }

    let mut next = if parts[i] == "startpos" {
        i += 1;
        Position::startpos()
    } else if parts[i] == "fen" {
        if i + 6 >= parts.len() {
            return Err(UciError::Fen(crate::position::FenError::TooFewParts));
        }
        let fen = parts[i + 1..i + 7].join(" ");
        let p = Position::set(&fen)?;
        i += 7;
        p
    } else {
        return Ok(Vec::new());
    };

    let mut history = Vec::new();
    if i < parts.len() && parts[i] == "moves" {
        i += 1;
        while i < parts.len() {
            let mv = movegen::parse_move(&next, parts[i], false)?;
            history.push(next.key);
            next = Position::make(&next, mv);
            i += 1;
        }
    }

    *pos = next;
    Ok(history)
}

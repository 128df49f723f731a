pub mod bitboard;
pub mod config;
pub mod eval;
pub mod info;
pub mod magic;
pub mod movegen;
pub mod ordering;
pub mod position;
pub mod search;
pub mod sync;
pub mod timer;
pub mod tt;
pub mod types;
pub mod uci;
pub mod worker;
pub mod zobrist;

/// One-time startup work: verifies the generated magic-bitboard tables are
/// internally consistent before the engine trusts them for move generation.
/// Call this once, before the first search or perft.
pub fn engine_init() -> Result<(), String> {
    magic::self_check()?;
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
    Ok(())
}

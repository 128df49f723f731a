fn main() {
    if let Err(e) = shrike::engine_init() {
        eprintln!("fatal: magic table self-check failed: {}", e);
        std::process::exit(1);
    }
    shrike::uci::run();
}

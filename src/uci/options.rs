//! UCI engine options: `Hash`, `Threads`, and `Level` (the playing-strength
//! weakening knob that feeds [`crate::eval::Noise`]).

pub enum OptionAction {
    ReinitHash(usize),
    SetThreads(usize),
}

pub struct EngineOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub level: u32,
    pub move_overhead_ms: u64,
}

impl EngineOptions {
    pub fn new() -> EngineOptions {
        EngineOptions { hash_mb: 16, threads: 1, level: 0, move_overhead_ms: 10 }
    }

    pub fn print(&self) {
        println!("id name Shrike");
        println!("id author the Shrike contributors");
        println!("option name Hash type spin default {} min 1 max 65536", self.hash_mb);
        println!("option name Threads type spin default {} min 1 max 256", self.threads);
        println!("option name Level type spin default {} min 0 max 20", self.level);
        println!("option name Move Overhead type spin default {} min 0 max 5000", self.move_overhead_ms);
        println!("uciok");
    }

    pub fn apply(&mut self, name: &str, value: Option<&str>) -> Option<OptionAction> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "hash" => {
                let mb = value.and_then(|v| v.parse::<usize>().ok()).unwrap_or(self.hash_mb).max(1);
                if mb != self.hash_mb {
                    self.hash_mb = mb;
                    return Some(OptionAction::ReinitHash(mb));
                }
            }
            "threads" => {
                let threads = value.and_then(|v| v.parse::<usize>().ok()).unwrap_or(self.threads).clamp(1, 256);
                if threads != self.threads {
                    self.threads = threads;
                    return Some(OptionAction::SetThreads(threads));
                }
            }
            "level" => {
                if let Some(v) = value.and_then(|v| v.parse::<u32>().ok()) {
                    self.level = v.clamp(0, 20);
                }
            }
            "move overhead" => {
                if let Some(v) = value.and_then(|v| v.parse::<u64>().ok()) {
                    self.move_overhead_ms = v;
                }
            }
            _ => {}
        }
        None
    }
}

impl Default for EngineOptions {
    fn default() -> EngineOptions {
        EngineOptions::new()
    }
}

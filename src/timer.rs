/// Elapsed-time clock for an active practice session. The host drives it with
/// one `tick()` per second; the counter itself never spawns anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTimer {
    running: bool,
    elapsed_secs: u64,
}

impl SessionTimer {
    /// Resets the elapsed count to zero and begins counting. Starting while
    /// already running replaces the previous run.
    pub fn start(&mut self) {
        self.elapsed_secs = 0;
        self.running = true;
    }

    /// Idempotent; safe to call when not running.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advances the clock by one second. Ignored while stopped.
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_secs += 1;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Zero-padded `MM:SS` for the visible session clock.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }
}

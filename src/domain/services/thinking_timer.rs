#[cfg(test)]
#[path = "thinking_timer_test.rs"]
mod tests;

use chrono::Utc;

pub fn now_millis() -> i64 {
    return Utc::now().timestamp_millis();
}

/// Tracks time spent inside a thinking span. Each lap measures the gap since
/// the previous lap (or the start marker), not the total span length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThinkingTimer {
    is_thinking: bool,
    phase_start_ms: i64,
}

impl ThinkingTimer {
    pub fn is_thinking(&self) -> bool {
        return self.is_thinking;
    }

    pub fn start(&mut self, now_ms: i64) {
        self.is_thinking = true;
        self.phase_start_ms = now_ms;
    }

    /// Returns seconds since the previous lap and restarts the phase at
    /// `now_ms`. Clock steps backwards clamp to zero.
    pub fn lap(&mut self, now_ms: i64) -> f32 {
        let elapsed_ms = (now_ms - self.phase_start_ms).max(0);
        self.phase_start_ms = now_ms;

        return elapsed_ms as f32 / 1000.0;
    }

    pub fn stop(&mut self) {
        self.is_thinking = false;
    }
}

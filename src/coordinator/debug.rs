use super::Coordinator;

impl Coordinator {
    pub(super) fn debug_log_event(&mut self, message: impl Into<String>) {
        if !self.options.debug_event_log {
            return;
        }
        self.push_debug_log_line(message.into());
    }

    fn push_debug_log_line(&mut self, message: String) {
        let cap = self.options.debug_event_log_capacity.clamp(1, 10_000);
        while self.debug_log.len() >= cap {
            self.debug_log.pop_front();
        }
        self.debug_log
            .push_back(format!("[t {}ms] {}", self.now.as_millis(), message));
    }

    /// Clears the debug event ring buffer.
    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }

    /// The debug event ring buffer, one event per line, oldest first.
    pub fn debug_log_text(&self) -> String {
        self.debug_log.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    pub fn debug_log_lines(&self) -> impl Iterator<Item = &str> {
        self.debug_log.iter().map(String::as_str)
    }
}

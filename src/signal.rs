//! Tagged, timestamped signals that HOST writes into a fixed element.
//!
//! The same signal usually stays in the element for several polls. [`SignalInbox`]
//! remembers the most recent timestamps so each signal is delivered exactly once.

use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    pub tag: String,
    pub timestamp: u64,
}

#[derive(Clone, Debug)]
pub struct SignalInbox {
    tag: String,
    capacity: usize,
    seen: VecDeque<u64>,
}

impl SignalInbox {
    pub fn new(tag: impl Into<String>, capacity: usize) -> Self {
        Self {
            tag: tag.into(),
            capacity: capacity.max(1),
            seen: VecDeque::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Looks for `<tag>_<digits>` in `text`.
    ///
    /// Returns the signal the first time its timestamp is observed, `None` afterwards (and
    /// for text that carries no signal).
    pub fn observe(&mut self, text: &str) -> Option<Signal> {
        let timestamp = parse_tagged_timestamp(text, &self.tag)?;
        if self.seen.contains(&timestamp) {
            return None;
        }
        while self.seen.len() >= self.capacity {
            self.seen.pop_front();
        }
        self.seen.push_back(timestamp);
        Some(Signal {
            tag: self.tag.clone(),
            timestamp,
        })
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }
}

fn parse_tagged_timestamp(text: &str, tag: &str) -> Option<u64> {
    if tag.is_empty() {
        return None;
    }
    let mut rest = text;
    while let Some(at) = rest.find(tag) {
        let tail = &rest[at + tag.len()..];
        if let Some(digits) = tail.strip_prefix('_') {
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            if let Ok(timestamp) = digits[..end].parse() {
                return Some(timestamp);
            }
        }
        rest = tail;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "SWITCH_TO_DRAFT_TAB";

    #[test]
    fn repeated_observation_is_delivered_once() {
        let mut inbox = SignalInbox::new(TAG, 10);
        let text = "SWITCH_TO_DRAFT_TAB_1712345678901";
        assert_eq!(
            inbox.observe(text),
            Some(Signal {
                tag: TAG.to_owned(),
                timestamp: 1_712_345_678_901
            })
        );
        assert_eq!(inbox.observe(text), None);
        assert_eq!(inbox.observe(text), None);
        assert!(inbox.observe("SWITCH_TO_DRAFT_TAB_1712345678902").is_some());
    }

    #[test]
    fn untagged_text_is_ignored() {
        let mut inbox = SignalInbox::new(TAG, 10);
        assert_eq!(inbox.observe(""), None);
        assert_eq!(inbox.observe("SWITCH_TO_DRAFT_TAB"), None);
        assert_eq!(inbox.observe("SWITCH_TO_DRAFT_TAB_"), None);
        assert_eq!(inbox.observe("OTHER_42"), None);
        assert_eq!(inbox.seen_len(), 0);
    }

    #[test]
    fn signal_may_be_embedded_in_other_text() {
        let mut inbox = SignalInbox::new(TAG, 10);
        let signal = inbox.observe("  SWITCH_TO_DRAFT_TAB_77\n").expect("signal");
        assert_eq!(signal.timestamp, 77);
    }

    #[test]
    fn retention_is_bounded_and_evicts_oldest() {
        let mut inbox = SignalInbox::new(TAG, 3);
        for ts in 1..=4 {
            assert!(inbox.observe(&format!("{TAG}_{ts}")).is_some());
        }
        assert_eq!(inbox.seen_len(), 3);
        // 1 was evicted, so it is accepted again; 4 is still remembered.
        assert!(inbox.observe(&format!("{TAG}_1")).is_some());
        assert!(inbox.observe(&format!("{TAG}_4")).is_none());
    }
}

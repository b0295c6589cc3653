use core::time::Duration;

use crate::dom::NodeId;

use super::DraggableItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    /// Drag-end seen; the clear is pending behind the grace delay.
    Releasing,
}

/// The single drag slot.
///
/// Every arm gets a fresh generation. A delayed clear carries the generation it was
/// scheduled for and does nothing once a newer drag has armed.
#[derive(Debug, Default)]
pub(super) struct DragSession {
    next_generation: u64,
    active: Option<ActiveDrag>,
}

#[derive(Debug)]
pub(super) struct ActiveDrag {
    pub(super) generation: u64,
    pub(super) item: DraggableItem,
    pub(super) source: NodeId,
    pub(super) armed_at: Duration,
    released_at: Option<Duration>,
}

impl DragSession {
    pub(super) fn phase(&self) -> DragPhase {
        match &self.active {
            None => DragPhase::Idle,
            Some(active) if active.released_at.is_some() => DragPhase::Releasing,
            Some(_) => DragPhase::Armed,
        }
    }

    pub(super) fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }

    pub(super) fn item(&self) -> Option<&DraggableItem> {
        self.active.as_ref().map(|active| &active.item)
    }

    /// Arms a new drag, replacing whatever the slot held.
    pub(super) fn arm(
        &mut self,
        item: DraggableItem,
        source: NodeId,
        now: Duration,
    ) -> (u64, String) {
        let generation = self.next_generation.max(1);
        self.next_generation = generation.saturating_add(1);

        let replaced = self.active.replace(ActiveDrag {
            generation,
            item,
            source,
            armed_at: now,
            released_at: None,
        });
        let log = match replaced {
            Some(old) => format!(
                "session ARM gen={generation} replaces gen={} path={}",
                old.generation, old.item.path
            ),
            None => format!(
                "session ARM gen={generation} path={}",
                self.item().map_or("", |item| item.path.as_str())
            ),
        };
        (generation, log)
    }

    /// Marks the active drag as released. Returns its generation.
    pub(super) fn release(&mut self, now: Duration) -> (Option<u64>, String) {
        let Some(active) = &mut self.active else {
            return (None, "session RELEASE (no active session)".to_owned());
        };
        active.released_at.get_or_insert(now);
        (
            Some(active.generation),
            format!(
                "session RELEASE gen={} held={:?}",
                active.generation,
                now.saturating_sub(active.armed_at)
            ),
        )
    }

    /// Takes the snapshot out of the slot for a completed drop.
    pub(super) fn complete(&mut self) -> Option<(ActiveDrag, String)> {
        let done = self.active.take()?;
        let log = format!(
            "session COMPLETE gen={} path={}",
            done.generation, done.item.path
        );
        Some((done, log))
    }

    /// The grace-delay clear: only clears the slot if it still holds `generation`.
    pub(super) fn clear_if_generation(&mut self, generation: u64) -> Option<String> {
        match &self.active {
            Some(active) if active.generation == generation => {
                self.active = None;
                Some(format!("session END gen={generation}"))
            }
            Some(active) => Some(format!(
                "session END ignored gen={generation} (active gen={})",
                active.generation
            )),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: &str) -> DraggableItem {
        DraggableItem::text("f", "F", path, "")
    }

    #[test]
    fn stale_clear_does_not_touch_newer_drag() {
        let mut session = DragSession::default();
        let node = NodeId::new(1, 0);
        let (a, _) = session.arm(item("/a"), node, Duration::ZERO);
        session.release(Duration::from_millis(10));
        assert_eq!(session.phase(), DragPhase::Releasing);

        let (b, log) = session.arm(item("/b"), node, Duration::from_millis(20));
        assert_ne!(a, b);
        assert!(log.contains("replaces"), "{log}");
        assert_eq!(session.phase(), DragPhase::Armed);

        session.clear_if_generation(a);
        assert_eq!(session.item().map(|i| i.path.as_str()), Some("/b"));

        session.clear_if_generation(b);
        assert_eq!(session.phase(), DragPhase::Idle);
    }

    #[test]
    fn complete_empties_the_slot() {
        let mut session = DragSession::default();
        session.arm(item("/a"), NodeId::new(1, 0), Duration::ZERO);
        let (done, _) = session.complete().expect("armed");
        assert_eq!(done.item.path, "/a");
        assert_eq!(session.phase(), DragPhase::Idle);
        assert!(session.complete().is_none());
    }
}

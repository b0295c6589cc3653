use std::collections::BTreeMap;

use crate::bridge::UpdateKey;
use crate::dom::NodeId;

/// MIME slot carrying the JSON drag payload.
pub const PAYLOAD_MIME: &str = "text/plain";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Text,
}

/// Snapshot of a resource taken when its drag starts.
///
/// Field order is the JSON payload order HOST expects.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DraggableItem {
    /// File name.
    pub name: String,
    pub title: String,
    /// Stable identity of the resource.
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    #[serde(default)]
    pub description: String,
}

impl DraggableItem {
    pub fn text(name: &str, title: &str, path: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            title: title.to_owned(),
            path: path.to_owned(),
            kind: ResourceKind::Text,
            description: description.to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropEffect {
    None,
    Copy,
    Move,
    Link,
}

/// The payload carrier of a drag gesture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataTransfer {
    data: BTreeMap<String, String>,
    pub effect_allowed: Option<DropEffect>,
    pub drop_effect: Option<DropEffect>,
}

impl DataTransfer {
    pub fn set_data(&mut self, mime: &str, value: impl Into<String>) {
        self.data.insert(mime.to_owned(), value.into());
    }

    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.data.get(mime).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEventKind {
    DragStart,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    DragEnd,
}

/// One browser drag event, as delivered to the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragEvent {
    pub kind: DragEventKind,
    /// Innermost element under the pointer.
    pub target: NodeId,
    pub data_transfer: DataTransfer,
}

impl DragEvent {
    pub fn new(kind: DragEventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            data_transfer: DataTransfer::default(),
        }
    }
}

/// What the handlers did with an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// No bound element handles this event.
    Ignored,
    /// A drag started and the session is armed.
    Armed { generation: u64 },
    /// A drag start whose identity fields could not be read. The session stays idle.
    ExtractionFailed,
    /// A bound drop zone is hovered by an armed drag.
    Hovering,
    /// The pointer left a drop zone (or hovered one without an armed drag).
    Left,
    /// Drag over or drop on an invalid target.
    Rejected,
    /// A drop completed and the resource was committed to its block.
    Completed { block_id: String, key: UpdateKey },
    /// A drop on a zone whose block could not be resolved, or with no armed drag.
    DropDiscarded,
    /// Drag-end: the session will be cleared after the grace delay.
    Released { generation: Option<u64> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventResponse {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub outcome: DragOutcome,
}

impl EventResponse {
    pub(crate) fn ignored() -> Self {
        Self::passive(DragOutcome::Ignored)
    }

    pub(crate) fn passive(outcome: DragOutcome) -> Self {
        Self {
            default_prevented: false,
            propagation_stopped: false,
            outcome,
        }
    }

    pub(crate) fn handled(outcome: DragOutcome) -> Self {
        Self {
            default_prevented: true,
            propagation_stopped: true,
            outcome,
        }
    }
}

/// Why a bind was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindTrigger {
    /// An explicit call by the embedder.
    Direct,
    /// The first bind after start.
    Initial,
    /// Tree-change watcher debounce (or a re-armed rebind).
    Scheduled,
    /// The single retry after a bind found no drop zones. Binds drop zones only.
    RetryDropTargets,
    /// Health monitor repair. Bypasses the guard window.
    Repair,
}

impl BindTrigger {
    pub(crate) fn respects_guard_window(self) -> bool {
        !matches!(self, Self::Repair | Self::RetryDropTargets)
    }

    pub(crate) fn rearms_when_guarded(self) -> bool {
        matches!(self, Self::Initial | Self::Scheduled)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindReport {
    pub sources: usize,
    pub targets: usize,
    pub input_fields: usize,
    /// Panels collapsed automatically during this bind.
    pub collapsed: usize,
    /// Registry records dropped because their node left the tree.
    pub pruned: usize,
    pub retry_scheduled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    Bound(BindReport),
    /// A bind was already running.
    SkippedReentrant,
    /// The previous bind is too recent.
    SkippedGuardWindow,
}

impl BindOutcome {
    pub fn report(&self) -> Option<&BindReport> {
        match self {
            Self::Bound(report) => Some(report),
            Self::SkippedReentrant | Self::SkippedGuardWindow => None,
        }
    }
}

/// Result of one health monitor sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub issues: Vec<String>,
    /// Candidate elements with at least one issue.
    pub broken: usize,
    /// Registry records dropped because their node left the tree.
    pub pruned: usize,
    pub repaired: bool,
}

/// What an input event on a watched field led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// The field carries no input watcher.
    NotWatched,
    /// The field is collapsed and its visible value did not change.
    Unchanged,
    /// The edit was committed to the bridge.
    Committed { key: UpdateKey, expanded: bool },
    /// The field has no HOST operation (HOST observes it natively).
    Local { expanded: bool },
    /// The field's owner (resource path or block id) could not be resolved.
    Unresolved,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub binds: u64,
    pub skipped_reentrant: u64,
    pub skipped_guard_window: u64,
    pub drop_target_retries: u64,
    pub repairs: u64,
    pub drags_armed: u64,
    pub extraction_failures: u64,
    pub drops_completed: u64,
    pub drops_rejected: u64,
    pub commits: u64,
    pub dispatched: u64,
    pub dispatch_failures: u64,
    pub signals: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_json_matches_host_format() {
        let item = DraggableItem::text("draft.txt", "Draft", "/files/draft.txt", "");
        assert_eq!(
            serde_json::to_string(&item).expect("json"),
            r#"{"name":"draft.txt","title":"Draft","path":"/files/draft.txt","type":"text","description":""}"#
        );
    }

    #[test]
    fn payload_json_without_optional_fields_parses() {
        let item: DraggableItem =
            serde_json::from_str(r#"{"name":"a","title":"A","path":"/a"}"#).expect("json");
        assert_eq!(item.kind, ResourceKind::Text);
        assert!(item.description.is_empty());
    }
}

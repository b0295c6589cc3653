use core::time::Duration;

use ahash::AHashMap;

use crate::dom::{Document, ListenerKind, NodeId};

/// A behavior this crate attaches to an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Draggable resource.
    Source,
    /// Drop zone.
    Target,
    /// Text field whose edits are forwarded to HOST.
    InputWatcher,
}

impl Capability {
    pub fn listener_kinds(self) -> &'static [ListenerKind] {
        match self {
            Self::Source => &[ListenerKind::DragStart, ListenerKind::DragEnd],
            Self::Target => &[
                ListenerKind::DragEnter,
                ListenerKind::DragOver,
                ListenerKind::DragLeave,
                ListenerKind::Drop,
            ],
            Self::InputWatcher => &[ListenerKind::Input],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingRecord {
    pub capability: Capability,
    pub attached: bool,
    pub attached_at: Duration,
}

/// Which capabilities are attached to which live node.
///
/// Keyed by generational [`NodeId`], so a record can never be confused with a node HOST
/// created later in the same slot. Records of removed nodes are inert until
/// [`Self::retain_live`] drops them.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    records: AHashMap<(NodeId, Capability), BindingRecord>,
}

impl BindingRegistry {
    /// Attaches exactly one set of `capability` listeners to `node`, removing any prior set.
    ///
    /// Returns `true` if the node had no record for this capability.
    pub fn attach<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        node: NodeId,
        capability: Capability,
        now: Duration,
    ) -> bool {
        if !doc.contains(node) {
            return false;
        }
        for &kind in capability.listener_kinds() {
            doc.remove_listener(node, kind);
            doc.add_listener(node, kind);
        }
        let previous = self.records.insert(
            (node, capability),
            BindingRecord {
                capability,
                attached: true,
                attached_at: now,
            },
        );
        previous.is_none_or(|record| !record.attached)
    }

    /// Removes the listeners of `capability` from `node` and marks the record detached.
    pub fn detach<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        node: NodeId,
        capability: Capability,
    ) -> bool {
        for &kind in capability.listener_kinds() {
            doc.remove_listener(node, kind);
        }
        match self.records.get_mut(&(node, capability)) {
            Some(record) if record.attached => {
                record.attached = false;
                true
            }
            _ => false,
        }
    }

    pub fn record(&self, node: NodeId, capability: Capability) -> Option<&BindingRecord> {
        self.records.get(&(node, capability))
    }

    pub fn is_attached(&self, node: NodeId, capability: Capability) -> bool {
        self.record(node, capability)
            .is_some_and(|record| record.attached)
    }

    /// Drops records of nodes that are no longer in the tree. Returns how many were dropped.
    pub fn retain_live<D: Document + ?Sized>(&mut self, doc: &D) -> usize {
        let before = self.records.len();
        self.records.retain(|&(node, _), _| doc.contains(node));
        before - self.records.len()
    }

    /// Nodes with an attached `capability`, in node order.
    pub fn attached_nodes(&self, capability: Capability) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .records
            .iter()
            .filter(|((_, cap), record)| *cap == capability && record.attached)
            .map(|(&(node, _), _)| node)
            .collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

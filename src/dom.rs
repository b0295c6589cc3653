//! The document tree owned by the host, seen through a narrow trait.
//!
//! The host re-renders arbitrary fragments of the tree whenever it likes. Nothing in this
//! crate keeps a reference to a node across ticks: nodes are addressed by [`NodeId`], which
//! carries a generation so that an id of a removed node never matches a node created later.

mod memory;
pub mod query;

pub use memory::{ElementSpec, HostEvent, MemoryDocument};

/// Identity of a live (or formerly live) element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Event listener slots this crate attaches to elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    DragStart,
    DragEnd,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    Input,
}

/// What a mutation record remembers about an added or removed node.
///
/// Removed nodes are gone from the tree by the time the record is read, so the record
/// carries everything classification needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSummary {
    pub node: NodeId,
    pub tag: String,
    /// Every class present on the node or any of its descendants (deduplicated).
    pub subtree_classes: Vec<String>,
}

impl NodeSummary {
    pub fn contains_class(&self, class: &str) -> bool {
        self.subtree_classes.iter().any(|c| c == class)
    }
}

/// One entry of the document's mutation stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeSummary>,
        removed: Vec<NodeSummary>,
    },
    Attributes {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
}

/// The live document as the host exposes it.
///
/// Methods taking a node that is no longer in the tree return `None`/`false`/`0` or do
/// nothing. Implementations must never panic on a stale [`NodeId`].
pub trait Document {
    /// The root element every live node descends from.
    fn body(&self) -> NodeId;

    /// Is `node` currently attached to the document?
    fn contains(&self, node: NodeId) -> bool;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// All live elements carrying `class`, in document order.
    fn elements_with_class(&self, class: &str) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Current value of a form field (`None` for elements without one).
    fn value(&self, node: NodeId) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    fn set_text_content(&mut self, node: NodeId, text: &str);

    /// Raw value write. The host does *not* observe this on its own.
    fn set_value(&mut self, node: NodeId, value: &str);

    /// The host's declared "value changed" notification for a field.
    fn notify_input(&mut self, node: NodeId);

    /// Synthetic activation (used to fire host triggers).
    fn click(&mut self, node: NodeId);

    fn add_listener(&mut self, node: NodeId, kind: ListenerKind);

    /// Removes every listener of `kind` on `node`.
    fn remove_listener(&mut self, node: NodeId, kind: ListenerKind);

    fn listener_count(&self, node: NodeId, kind: ListenerKind) -> usize;
}

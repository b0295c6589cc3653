//! Drag-and-drop and text-field bindings that survive a host re-rendering the page under
//! them, plus a debounced bridge that commits edits back to the host through its own
//! proxy fields.

#![forbid(unsafe_code)]

pub mod bridge;
pub mod coordinator;
pub mod dom;
pub mod panel;
pub mod signal;
pub mod timers;

pub use bridge::{
    Bridge, BridgeError, BridgeOptions, HostContract, IndentDirection, Operation,
    OperationBinding, OperationKind, UpdateKey,
};
pub use coordinator::{
    BindOutcome, Coordinator, CoordinatorOptions, DragEvent, DragEventKind, DragOutcome,
    DraggableItem, InputOutcome, Selectors,
};
pub use dom::{Document, ElementSpec, ListenerKind, MemoryDocument, MutationRecord, NodeId};
pub use panel::{Panel, PanelProfile, PanelSet};
pub use signal::{Signal, SignalInbox};

#[cfg(feature = "persistence")]
pub use coordinator::{OPTIONS_FORMAT_VERSION, OptionsPersistenceError};

//! Cross-boundary bridge: turns logical updates into HOST proxy-field writes.
//!
//! There is no procedure call into HOST. An operation is committed by writing its
//! parameters into HOST-owned proxy fields (through HOST's "value changed" notification)
//! and then clicking the operation's trigger element.
//!
//! Rapid commits to the same [`UpdateKey`] coalesce: only the last value reaches HOST,
//! [`BridgeOptions::debounce_window`] after the last commit.

mod mirror;
mod operation;

use core::time::Duration;

use ahash::AHashMap;

use crate::coordinator::Selectors;
use crate::dom::{Document, NodeId, query};
use crate::timers::Timers;

pub use operation::{
    HostContract, IndentDirection, Operation, OperationBinding, OperationKind, UpdateKey,
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BridgeOptions {
    /// Quiet period after the last commit to a key before it is sent to HOST.
    pub debounce_window: Duration,

    /// HOST's proxy fields and triggers, per operation.
    pub contract: HostContract,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(50),
            contract: HostContract::default(),
        }
    }
}

/// Which part of an operation's contract was missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementRole {
    /// A parameter field (or the text field inside its wrapper).
    ProxyField,
    Trigger,
}

#[derive(Debug)]
pub enum BridgeError {
    /// The contract has no binding for this operation.
    UnboundOperation(OperationKind),
    /// The binding names a different number of fields than the operation has parameters.
    ParamCount {
        kind: OperationKind,
        expected: usize,
        found: usize,
    },
    /// An element of the contract is not in the tree right now.
    MissingElement { id: String, role: ElementRole },
    Encode(serde_json::Error),
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundOperation(kind) => write!(f, "no host binding for {kind:?}"),
            Self::ParamCount {
                kind,
                expected,
                found,
            } => write!(
                f,
                "host binding for {kind:?} has {expected} fields but the operation has {found} parameters"
            ),
            Self::MissingElement { id, role } => {
                write!(f, "missing {role:?} element #{id}")
            }
            Self::Encode(err) => write!(f, "payload encode error: {err}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::UnboundOperation(_) | Self::ParamCount { .. } | Self::MissingElement { .. } => {
                None
            }
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

/// Outcome of one debounced dispatch.
#[derive(Debug)]
pub struct DispatchReport {
    pub key: UpdateKey,
    pub kind: OperationKind,
    pub result: Result<(), BridgeError>,
}

#[derive(Debug)]
pub struct Bridge {
    options: BridgeOptions,
    selectors: Selectors,
    pending: AHashMap<UpdateKey, Operation>,
    timers: Timers<UpdateKey>,
}

impl Bridge {
    pub fn new(options: BridgeOptions, selectors: Selectors) -> Self {
        Self {
            options,
            selectors,
            pending: AHashMap::default(),
            timers: Timers::new(),
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Records `op` as the latest value of its key and restarts that key's debounce timer.
    ///
    /// Other on-screen copies of the same entity are updated right away. Returns `true`
    /// when a pending value was superseded.
    pub fn commit<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        op: Operation,
        now: Duration,
    ) -> bool {
        let mirrored = mirror::apply(doc, &self.selectors, &op);
        let key = op.key();
        let due = now + self.options.debounce_window;
        let superseded = self.pending.insert(key.clone(), op).is_some();
        self.timers.schedule(key.clone(), due);
        log::debug!(
            "bridge: commit {key} due={due:?} superseded={superseded} mirrored={mirrored}"
        );
        superseded
    }

    /// Writes the operation's parameters into HOST and fires its trigger, synchronously.
    ///
    /// Every element is resolved before the first write, so a missing element leaves
    /// HOST untouched.
    ///
    /// # Errors
    /// Fails when the contract has no usable binding for the operation, when a proxy
    /// field or the trigger is not in the tree, or when the payload cannot be encoded.
    pub fn dispatch<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        op: &Operation,
    ) -> Result<(), BridgeError> {
        let kind = op.kind();
        let binding = self
            .options
            .contract
            .binding(kind)
            .ok_or(BridgeError::UnboundOperation(kind))?;
        let values = op.params()?;
        if values.len() != binding.params.len() {
            return Err(BridgeError::ParamCount {
                kind,
                expected: binding.params.len(),
                found: values.len(),
            });
        }

        let fields = binding
            .params
            .iter()
            .map(|id| resolve_proxy_field(doc, id))
            .collect::<Result<Vec<_>, _>>()?;
        let trigger = doc
            .element_by_id(&binding.trigger)
            .ok_or_else(|| BridgeError::MissingElement {
                id: binding.trigger.clone(),
                role: ElementRole::Trigger,
            })?;

        for (field, value) in fields.into_iter().zip(&values) {
            doc.set_value(field, value);
            doc.notify_input(field);
        }
        doc.click(trigger);
        Ok(())
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// Dispatches the earliest pending update if it is due at `now`.
    pub fn fire_next_due<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        now: Duration,
    ) -> Option<DispatchReport> {
        let (_, key) = self.timers.pop_due(now)?;
        let op = self.pending.remove(&key)?;
        Some(self.dispatch_report(doc, key, &op))
    }

    /// Dispatches every update due at `now`, earliest first.
    pub fn fire_due<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        now: Duration,
    ) -> Vec<DispatchReport> {
        std::iter::from_fn(|| self.fire_next_due(doc, now)).collect()
    }

    /// Dispatches everything still pending, ignoring the debounce windows.
    pub fn flush_all<D: Document + ?Sized>(&mut self, doc: &mut D) -> Vec<DispatchReport> {
        std::iter::from_fn(|| self.fire_next_due(doc, Duration::MAX)).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &UpdateKey) -> bool {
        self.pending.contains_key(key)
    }

    /// The value that will be sent for `key`, if one is pending.
    pub fn pending(&self, key: &UpdateKey) -> Option<&Operation> {
        self.pending.get(key)
    }

    fn dispatch_report<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        key: UpdateKey,
        op: &Operation,
    ) -> DispatchReport {
        let result = self.dispatch(doc, op);
        match &result {
            Ok(()) => log::debug!("bridge: dispatched {key} ({:?})", op.kind()),
            Err(err) => log::error!("bridge: dropped {key}: {err}"),
        }
        DispatchReport {
            key,
            kind: op.kind(),
            result,
        }
    }
}

fn resolve_proxy_field<D: Document + ?Sized>(doc: &D, id: &str) -> Result<NodeId, BridgeError> {
    doc.element_by_id(id)
        .and_then(|wrapper| query::value_holder(doc, wrapper))
        .ok_or_else(|| BridgeError::MissingElement {
            id: id.to_owned(),
            role: ElementRole::ProxyField,
        })
}

//! Keeps drag sources, drop zones and watched text fields bound while HOST re-renders.
//!
//! The [`Coordinator`] owns every piece of mutable state of the system: the binding
//! registry, the single drag session, the collapse panels, the bridge and the timers.
//! The embedder feeds it events (drag events, input events, mutation batches) and
//! advances virtual time; nothing here blocks or spawns.
//!
//! Current scope:
//! - Binding: [`Coordinator::bind_all`] scans the live tree and attaches exactly one set
//!   of listeners per candidate element, guarded against re-entry and rapid repeats.
//! - Drag and drop: drag-start snapshots a resource, a drop on a bound zone commits it to
//!   the zone's block through the bridge.
//! - Tree-change watcher: [`Coordinator::on_mutations`] classifies mutation batches and
//!   schedules a debounced rebind.
//! - Health monitor: a periodic sweep that repairs anything the watcher missed.
//! - Text fields: edits are committed through the bridge; long fields collapse.
//! - Signals: HOST's tagged signal element is polled and de-duplicated.

mod binding;
mod debug;
mod drag_events;
mod drop_policy;
pub(crate) mod extract;
mod input;
mod integrity;
mod monitor;
mod options;
#[cfg(feature = "persistence")]
mod persistence;
mod registry;
mod session;
mod types;
mod watcher;

#[cfg(test)]
mod test_page;

use core::time::Duration;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bridge::{Bridge, BridgeError, DispatchReport, Operation, UpdateKey};
use crate::dom::Document;
use crate::panel::PanelSet;
use crate::signal::{Signal, SignalInbox};
use crate::timers::Timers;

pub use extract::ExtractionError;
pub use options::{CoordinatorOptions, Selectors};
#[cfg(feature = "persistence")]
pub use persistence::{OPTIONS_FORMAT_VERSION, OptionsPersistenceError};
pub use registry::{BindingRecord, BindingRegistry, Capability};
pub use session::DragPhase;
pub use types::{
    BindOutcome, BindReport, BindTrigger, CoordinatorStats, DataTransfer, DragEvent,
    DragEventKind, DragOutcome, DraggableItem, DropEffect, EventResponse, HealthReport,
    InputOutcome, PAYLOAD_MIME, ResourceKind,
};
pub use watcher::BatchClassification;

use session::DragSession;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TimerKey {
    InitialBind,
    Rebind,
    RetryDropTargets,
    ClearSession { generation: u64 },
    MonitorTick,
    SignalPoll,
}

#[derive(Debug)]
pub struct Coordinator {
    options: CoordinatorOptions,

    registry: BindingRegistry,
    session: DragSession,
    panels: PanelSet,
    bridge: Bridge,

    inbox: SignalInbox,
    signals: VecDeque<Signal>,

    timers: Timers<TimerKey>,
    now: Duration,
    started: bool,

    binding_in_progress: Rc<Cell<bool>>,
    last_bind_at: Option<Duration>,

    stats: CoordinatorStats,

    debug_log: VecDeque<String>,
    last_integrity_hash: Option<u64>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoordinatorOptions::default())
    }
}

impl Coordinator {
    pub fn new(options: CoordinatorOptions) -> Self {
        let bridge = Bridge::new(options.bridge.clone(), options.selectors.clone());
        let inbox = SignalInbox::new(options.signal_tag.clone(), options.signal_capacity);
        Self {
            options,
            registry: BindingRegistry::default(),
            session: DragSession::default(),
            panels: PanelSet::default(),
            bridge,
            inbox,
            signals: VecDeque::new(),
            timers: Timers::new(),
            now: Duration::ZERO,
            started: false,
            binding_in_progress: Rc::new(Cell::new(false)),
            last_bind_at: None,
            stats: CoordinatorStats::default(),
            debug_log: VecDeque::new(),
            last_integrity_hash: None,
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Schedules the initial bind, the first monitor sweep and the first signal poll.
    ///
    /// Calling it again does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let now = self.now;
        self.timers
            .schedule(TimerKey::InitialBind, now + self.options.initial_bind_delay);
        self.timers
            .schedule(TimerKey::MonitorTick, now + self.options.monitor_period);
        self.timers
            .schedule(TimerKey::SignalPoll, now + self.options.signal_poll_period);
        self.debug_log_event(format!(
            "coordinator START initial_bind_in={:?}",
            self.options.initial_bind_delay
        ));
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Earliest pending deadline, coordinator and bridge timers alike.
    pub fn next_due(&self) -> Option<Duration> {
        match (self.timers.next_due(), self.bridge.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn advance<D: Document + ?Sized>(&mut self, doc: &mut D, dt: Duration) -> usize {
        let target = self.now.saturating_add(dt);
        self.advance_to(doc, target)
    }

    /// Fires every timer due at or before `t`, in deadline order, then sets the clock to
    /// `t`. On equal deadlines coordinator timers fire before bridge timers.
    ///
    /// Returns the number of timers fired. Time never goes backwards.
    pub fn advance_to<D: Document + ?Sized>(&mut self, doc: &mut D, t: Duration) -> usize {
        let mut fired = 0;
        loop {
            let own = self.timers.next_due().filter(|&due| due <= t);
            let bridge = self.bridge.next_due().filter(|&due| due <= t);
            match (own, bridge) {
                (Some(due), other) if other.is_none_or(|b| due <= b) => {
                    self.now = self.now.max(due);
                    if let Some((_, key)) = self.timers.pop_due(due) {
                        self.fire(doc, key);
                    }
                }
                (_, Some(due)) => {
                    self.now = self.now.max(due);
                    if let Some(report) = self.bridge.fire_next_due(doc, due) {
                        self.record_dispatch(&report);
                    }
                }
                _ => break,
            }
            fired += 1;
        }
        self.now = self.now.max(t);
        fired
    }

    fn fire<D: Document + ?Sized>(&mut self, doc: &mut D, key: TimerKey) {
        match key {
            TimerKey::InitialBind => {
                self.bind_all_with(doc, BindTrigger::Initial);
            }
            TimerKey::Rebind => {
                self.bind_all_with(doc, BindTrigger::Scheduled);
            }
            TimerKey::RetryDropTargets => {
                self.bind_all_with(doc, BindTrigger::RetryDropTargets);
            }
            TimerKey::ClearSession { generation } => {
                if let Some(line) = self.session.clear_if_generation(generation) {
                    self.debug_log_event(line);
                }
            }
            TimerKey::MonitorTick => {
                self.run_health_check(doc);
                self.timers.schedule(
                    TimerKey::MonitorTick,
                    self.now + self.options.monitor_period,
                );
            }
            TimerKey::SignalPoll => {
                self.poll_signal(doc);
                self.timers.schedule(
                    TimerKey::SignalPoll,
                    self.now + self.options.signal_poll_period,
                );
            }
        }
    }

    /// Arms (or pushes back) the debounced rebind. A pending rebind is never pulled
    /// earlier.
    fn schedule_rebind(&mut self, due: Duration) {
        let due = self
            .timers
            .due_at(&TimerKey::Rebind)
            .map_or(due, |pending| pending.max(due));
        self.timers.schedule(TimerKey::Rebind, due);
    }

    /// Debounced commit of `op` to HOST. See [`Bridge::commit`].
    pub fn commit<D: Document + ?Sized>(&mut self, doc: &mut D, op: Operation) -> UpdateKey {
        let key = op.key();
        self.stats.commits += 1;
        self.bridge.commit(doc, op, self.now);
        key
    }

    /// Sends a discrete action (delete, toggle, indent, ...) to HOST right away.
    ///
    /// # Errors
    /// See [`Bridge::dispatch`]. The failure is also logged.
    pub fn dispatch_now<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        op: &Operation,
    ) -> Result<(), BridgeError> {
        let result = self.bridge.dispatch(doc, op);
        match &result {
            Ok(()) => {
                self.stats.dispatched += 1;
                self.debug_log_event(format!("bridge DISPATCH {:?}", op.kind()));
            }
            Err(err) => {
                self.stats.dispatch_failures += 1;
                log::error!("bridge: {:?} aborted: {err}", op.kind());
                self.debug_log_event(format!("bridge ABORT {:?}: {err}", op.kind()));
            }
        }
        result
    }

    /// Dispatches every pending update now (teardown).
    pub fn flush<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let reports = self.bridge.flush_all(doc);
        for report in &reports {
            self.record_dispatch(report);
        }
        reports.len()
    }

    fn record_dispatch(&mut self, report: &DispatchReport) {
        match &report.result {
            Ok(()) => {
                self.stats.dispatched += 1;
                self.debug_log_event(format!(
                    "bridge DISPATCH {} ({:?})",
                    report.key, report.kind
                ));
            }
            Err(err) => {
                self.stats.dispatch_failures += 1;
                self.debug_log_event(format!("bridge ABORT {}: {err}", report.key));
            }
        }
    }

    fn poll_signal<D: Document + ?Sized>(&mut self, doc: &D) {
        let Some(element) = doc.element_by_id(&self.options.signal_element_id) else {
            return;
        };
        let Some(text) = doc.text_content(element) else {
            return;
        };
        if let Some(signal) = self.inbox.observe(&text) {
            log::debug!("signal {}_{}", signal.tag, signal.timestamp);
            self.debug_log_event(format!("signal {} ts={}", signal.tag, signal.timestamp));
            self.stats.signals += 1;
            self.signals.push_back(signal);
        }
    }

    /// Signals observed since the last call, oldest first.
    pub fn take_signals(&mut self) -> Vec<Signal> {
        self.signals.drain(..).collect()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.session.phase()
    }

    /// Snapshot held by the drag session, if any.
    pub fn dragged_item(&self) -> Option<&DraggableItem> {
        self.session.item()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn panels(&self) -> &PanelSet {
        &self.panels
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Is a bind running right now?
    pub fn is_binding(&self) -> bool {
        self.binding_in_progress.get()
    }
}

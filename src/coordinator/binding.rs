use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{Document, NodeId, query};
use crate::panel::PanelProfile;

use super::{BindOutcome, BindReport, BindTrigger, Capability, Coordinator, Selectors, TimerKey};

/// Holds the bind-in-progress flag and clears it on drop, unwinding included.
struct BindingGuard(Rc<Cell<bool>>);

impl BindingGuard {
    fn acquire(flag: &Rc<Cell<bool>>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(Rc::clone(flag)))
    }
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Coordinator {
    /// Binds every candidate source, drop zone and watched field of the live tree.
    ///
    /// A no-op while another bind is running, or within
    /// [`super::CoordinatorOptions::bind_guard_window`] of the previous bind.
    pub fn bind_all<D: Document + ?Sized>(&mut self, doc: &mut D) -> BindOutcome {
        self.bind_all_with(doc, BindTrigger::Direct)
    }

    pub fn bind_all_with<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        trigger: BindTrigger,
    ) -> BindOutcome {
        let Some(_guard) = BindingGuard::acquire(&self.binding_in_progress) else {
            self.stats.skipped_reentrant += 1;
            log::debug!("bind_all: skipped ({trigger:?}), already binding");
            return BindOutcome::SkippedReentrant;
        };

        if trigger.respects_guard_window() {
            if let Some(last) = self.last_bind_at {
                let window_end = last + self.options.bind_guard_window;
                if self.now < window_end {
                    self.stats.skipped_guard_window += 1;
                    if trigger.rearms_when_guarded() {
                        self.schedule_rebind(window_end);
                    }
                    log::debug!(
                        "bind_all: skipped ({trigger:?}), last bind at {last:?}, window ends {window_end:?}"
                    );
                    return BindOutcome::SkippedGuardWindow;
                }
            }
        }

        self.last_bind_at = Some(self.now);
        self.stats.binds += 1;
        let selectors = self.options.selectors.clone();
        let mut report = BindReport {
            pruned: self.registry.retain_live(doc),
            ..Default::default()
        };
        self.panels.retain(|node| doc.contains(node));

        if trigger == BindTrigger::RetryDropTargets {
            self.stats.drop_target_retries += 1;
            self.bind_drop_targets(doc, &selectors, &mut report);
        } else {
            self.bind_sources(doc, &selectors, &mut report);
            self.bind_drop_targets(doc, &selectors, &mut report);
            self.bind_block_fields(doc, &selectors, &mut report);

            if report.targets == 0 {
                self.timers.schedule(
                    TimerKey::RetryDropTargets,
                    self.now + self.options.retry_drop_targets_delay,
                );
                report.retry_scheduled = true;
                log::debug!("bind_all: no drop zones yet, one retry scheduled");
            }
        }

        self.debug_log_event(format!(
            "bind {trigger:?} sources={} targets={} inputs={} collapsed={} pruned={}",
            report.sources, report.targets, report.input_fields, report.collapsed, report.pruned
        ));
        BindOutcome::Bound(report)
    }

    fn bind_sources<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        selectors: &Selectors,
        report: &mut BindReport,
    ) {
        for source in doc.elements_with_class(&selectors.resource_source) {
            set_attribute_if_changed(doc, source, "draggable", "true");
            for inner in query::descendants(doc, source) {
                if query::is_interactive(doc, inner) {
                    set_attribute_if_changed(doc, inner, "draggable", "false");
                }
            }
            if let Some(path) = super::extract::source_path(doc, selectors, source) {
                set_attribute_if_changed(doc, source, &selectors.resource_path_attr, &path);
            }

            self.registry
                .attach(doc, source, Capability::Source, self.now);
            report.sources += 1;

            if let Some(title) = query::text_field_in(doc, source, &selectors.resource_title) {
                self.bind_input_field(doc, title, None, report);
            }
            if let Some(desc) = query::text_field_in(doc, source, &selectors.resource_description)
            {
                let profile = self.options.source_description_panel;
                self.bind_input_field(doc, desc, Some(profile), report);
            }
        }
    }

    fn bind_drop_targets<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        selectors: &Selectors,
        report: &mut BindReport,
    ) {
        for zone in doc.elements_with_class(&selectors.drop_zone) {
            self.registry.attach(doc, zone, Capability::Target, self.now);
            report.targets += 1;
        }
    }

    fn bind_block_fields<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        selectors: &Selectors,
        report: &mut BindReport,
    ) {
        for field in doc.elements_with_class(&selectors.block_resource_description) {
            if let Some(holder) = query::value_holder(doc, field) {
                self.bind_input_field(doc, holder, None, report);
            }
        }
        let document_description = doc
            .element_by_id(&selectors.document_description_id)
            .and_then(|wrapper| query::value_holder(doc, wrapper));
        if let Some(holder) = document_description {
            let profile = self.options.document_description_panel;
            self.bind_input_field(doc, holder, Some(profile), report);
        }
    }

    /// Watches `field` for input and, with a profile, gives it a collapse panel.
    fn bind_input_field<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        field: NodeId,
        panel: Option<PanelProfile>,
        report: &mut BindReport,
    ) {
        self.registry
            .attach(doc, field, Capability::InputWatcher, self.now);
        report.input_fields += 1;

        let Some(profile) = panel else {
            return;
        };
        let (panel, created) = self.panels.ensure(field, profile);
        if !created || !self.options.auto_collapse_long_text {
            return;
        }
        let current = doc.value(field).unwrap_or_default();
        if !profile.exceeds_budget(&current) {
            return;
        }
        if let Some(view) = panel.collapse(&current) {
            doc.set_value(field, &view);
            report.collapsed += 1;
        }
    }
}

/// Writes only real changes, so binding never produces mutation records of its own once
/// the tree is bound.
pub(super) fn set_attribute_if_changed<D: Document + ?Sized>(
    doc: &mut D,
    node: NodeId,
    name: &str,
    value: &str,
) -> bool {
    if doc.attribute(node, name).as_deref() == Some(value) {
        return false;
    }
    doc.set_attribute(node, name, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_nested_acquire_and_releases_on_drop() {
        let flag = Rc::new(Cell::new(false));
        let outer = BindingGuard::acquire(&flag).expect("first");
        assert!(BindingGuard::acquire(&flag).is_none());
        drop(outer);
        assert!(!flag.get());
        assert!(BindingGuard::acquire(&flag).is_some());
    }

    #[test]
    fn guard_is_released_by_unwinding() {
        let flag = Rc::new(Cell::new(false));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = BindingGuard::acquire(&flag).expect("first");
            panic!("document implementation failed");
        }));
        assert!(result.is_err());
        assert!(!flag.get());
    }
}

use crate::bridge::Operation;
use crate::dom::{Document, ListenerKind, NodeId, query};
use crate::panel::EditOutcome;

use super::{Coordinator, InputOutcome, extract};

/// What an edit of a watched field means.
enum FieldTarget {
    Operation(Operation),
    /// HOST observes the field itself.
    Local,
    Unresolved,
}

impl Coordinator {
    /// Handles an input event on `field` (the element holding the value).
    ///
    /// A collapsed panel intercepts the edit first: an unchanged collapsed view is
    /// ignored, anything else expands the panel back to its saved text before the edit
    /// is forwarded, so the truncated view never reaches HOST.
    pub fn handle_input<D: Document + ?Sized>(&mut self, doc: &mut D, field: NodeId) -> InputOutcome {
        if doc.listener_count(field, ListenerKind::Input) == 0 {
            return InputOutcome::NotWatched;
        }

        let mut value = doc.value(field).unwrap_or_default();
        let mut expanded = false;
        if let Some(panel) = self.panels.get_mut(field) {
            match panel.on_edit(&value) {
                EditOutcome::Unchanged => return InputOutcome::Unchanged,
                EditOutcome::Expanded { restored } => {
                    doc.set_value(field, &restored);
                    doc.notify_input(field);
                    value = restored;
                    expanded = true;
                }
                EditOutcome::Passthrough => {}
            }
        }
        if expanded {
            self.debug_log_event(format!("panel EXPAND by edit field={field:?}"));
        }

        match self.field_target(doc, field, value) {
            FieldTarget::Operation(op) => {
                let key = self.commit(doc, op);
                InputOutcome::Committed { key, expanded }
            }
            FieldTarget::Local => InputOutcome::Local { expanded },
            FieldTarget::Unresolved => {
                log::warn!("input on {field:?}: owner not found");
                InputOutcome::Unresolved
            }
        }
    }

    /// A click on a collapsed field expands it. Returns `true` if it did.
    pub fn handle_click<D: Document + ?Sized>(&mut self, doc: &mut D, field: NodeId) -> bool {
        let Some(panel) = self.panels.get_mut(field) else {
            return false;
        };
        let Some(restored) = panel.expand() else {
            return false;
        };
        doc.set_value(field, &restored);
        doc.notify_input(field);
        self.debug_log_event(format!("panel EXPAND by click field={field:?}"));
        true
    }

    /// The explicit collapse/expand button of a field.
    ///
    /// Returns the collapsed state after the toggle, or `None` if the field has no panel.
    pub fn toggle_panel<D: Document + ?Sized>(&mut self, doc: &mut D, field: NodeId) -> Option<bool> {
        let panel = self.panels.get_mut(field)?;
        let was_collapsed = panel.is_collapsed();
        let current = doc.value(field).unwrap_or_default();
        let shown = panel.toggle(&current);
        let collapsed = panel.is_collapsed();
        doc.set_value(field, &shown);
        if was_collapsed {
            doc.notify_input(field);
        }
        self.debug_log_event(format!("panel TOGGLE field={field:?} collapsed={collapsed}"));
        Some(collapsed)
    }

    fn field_target<D: Document + ?Sized>(&self, doc: &D, field: NodeId, value: String) -> FieldTarget {
        let selectors = &self.options.selectors;

        if let Some(source) = query::closest_with_class(doc, field, &selectors.resource_source) {
            let Some(path) = extract::source_path(doc, selectors, source) else {
                return FieldTarget::Unresolved;
            };
            if query::closest_with_class(doc, field, &selectors.resource_title).is_some() {
                return FieldTarget::Operation(Operation::RenameResource { path, title: value });
            }
            if query::closest_with_class(doc, field, &selectors.resource_description).is_some() {
                return FieldTarget::Operation(Operation::EditPanelDescription {
                    path,
                    description: value,
                });
            }
            return FieldTarget::Unresolved;
        }

        if query::closest_with_class(doc, field, &selectors.block_resource_description).is_some() {
            let block_id = extract::container_id(doc, selectors, field);
            let path = extract::attached_resource_path(doc, selectors, field);
            return match (block_id, path) {
                (Some(block_id), Some(path)) => {
                    FieldTarget::Operation(Operation::EditBlockDescription {
                        block_id,
                        path,
                        description: value,
                    })
                }
                _ => FieldTarget::Unresolved,
            };
        }

        FieldTarget::Local
    }
}

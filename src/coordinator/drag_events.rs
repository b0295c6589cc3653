use crate::bridge::Operation;
use crate::dom::{Document, ListenerKind, NodeId, query};

use super::drop_policy::{blocks_drag_start, is_invalid_drop_target};
use super::extract::{self, ExtractionError};
use super::{
    Coordinator, DragEvent, DragEventKind, DragOutcome, DropEffect, EventResponse, PAYLOAD_MIME,
    TimerKey,
};

/// Nearest element (the node itself included) with `class` and a live `kind` listener.
///
/// Elements whose listeners are gone do not react, exactly like in a browser.
fn bound_ancestor<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    class: &str,
    kind: ListenerKind,
) -> Option<NodeId> {
    query::closest(doc, node, |doc, n| {
        doc.has_class(n, class) && doc.listener_count(n, kind) > 0
    })
}

impl Coordinator {
    /// Runs the handlers the browser would run for `event`.
    ///
    /// The host applies the response: `default_prevented` tells it to suppress the
    /// browser's default action, and `event.data_transfer` carries the payload and effects.
    pub fn handle_drag_event<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        event: &mut DragEvent,
    ) -> EventResponse {
        match event.kind {
            DragEventKind::DragStart => self.on_drag_start(doc, event),
            DragEventKind::DragEnter | DragEventKind::DragOver => self.on_drag_over(doc, event),
            DragEventKind::DragLeave => self.on_drag_leave(doc, event),
            DragEventKind::Drop => self.on_drop(doc, event),
            DragEventKind::DragEnd => self.on_drag_end(doc, event),
        }
    }

    fn on_drag_start<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        event: &mut DragEvent,
    ) -> EventResponse {
        let selectors = &self.options.selectors;
        if blocks_drag_start(doc, event.target) {
            return EventResponse {
                default_prevented: true,
                propagation_stopped: false,
                outcome: DragOutcome::Ignored,
            };
        }
        let Some(source) = bound_ancestor(
            doc,
            event.target,
            &selectors.resource_source,
            ListenerKind::DragStart,
        ) else {
            return EventResponse::ignored();
        };

        let snapshot = extract::extract_item(doc, selectors, &self.panels, source).and_then(
            |item| {
                let payload = serde_json::to_string(&item).map_err(ExtractionError::from)?;
                Ok((item, payload))
            },
        );
        let (item, payload) = match snapshot {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.stats.extraction_failures += 1;
                log::warn!("drag start refused: {err}");
                self.debug_log_event(format!("drag START refused: {err}"));
                return EventResponse::passive(DragOutcome::ExtractionFailed);
            }
        };

        event.data_transfer.set_data(PAYLOAD_MIME, payload);
        event.data_transfer.effect_allowed = Some(DropEffect::Copy);

        let dragging = self.options.selectors.dragging_class.clone();
        let body_dragging = self.options.selectors.body_dragging_class.clone();
        doc.add_class(source, &dragging);
        let body = doc.body();
        doc.add_class(body, &body_dragging);

        let (generation, line) = self.session.arm(item, source, self.now);
        self.stats.drags_armed += 1;
        self.debug_log_event(line);
        EventResponse::passive(DragOutcome::Armed { generation })
    }

    fn on_drag_over<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        event: &mut DragEvent,
    ) -> EventResponse {
        let selectors = &self.options.selectors;
        let armed = self.session.item().is_some();

        if armed && is_invalid_drop_target(doc, selectors, event.target) {
            doc.add_class(event.target, &selectors.no_drop_class);
            event.data_transfer.drop_effect = Some(DropEffect::None);
            return EventResponse::handled(DragOutcome::Rejected);
        }

        let kind = if event.kind == DragEventKind::DragEnter {
            ListenerKind::DragEnter
        } else {
            ListenerKind::DragOver
        };
        let Some(zone) = bound_ancestor(doc, event.target, &selectors.drop_zone, kind) else {
            return EventResponse::ignored();
        };
        if !armed {
            return EventResponse::ignored();
        }

        doc.add_class(zone, &selectors.drag_over_class);
        event.data_transfer.drop_effect = Some(DropEffect::Copy);
        EventResponse::handled(DragOutcome::Hovering)
    }

    fn on_drag_leave<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        event: &mut DragEvent,
    ) -> EventResponse {
        let selectors = &self.options.selectors;
        if is_invalid_drop_target(doc, selectors, event.target) {
            doc.remove_class(event.target, &selectors.no_drop_class);
        }
        let Some(zone) = bound_ancestor(
            doc,
            event.target,
            &selectors.drop_zone,
            ListenerKind::DragLeave,
        ) else {
            return EventResponse::ignored();
        };
        doc.remove_class(zone, &selectors.drag_over_class);
        EventResponse::passive(DragOutcome::Left)
    }

    fn on_drop<D: Document + ?Sized>(&mut self, doc: &mut D, event: &mut DragEvent) -> EventResponse {
        let selectors = self.options.selectors.clone();
        let armed = self.session.item().is_some();

        if armed && is_invalid_drop_target(doc, &selectors, event.target) {
            doc.remove_class(event.target, &selectors.no_drop_class);
            self.stats.drops_rejected += 1;
            log::debug!("drop on invalid target rejected");
            self.abort_drag(doc);
            return EventResponse::handled(DragOutcome::Rejected);
        }

        let Some(zone) =
            bound_ancestor(doc, event.target, &selectors.drop_zone, ListenerKind::Drop)
        else {
            return EventResponse::ignored();
        };
        doc.remove_class(zone, &selectors.drag_over_class);

        if !armed {
            log::debug!("drop without an armed drag session");
            return EventResponse::handled(DragOutcome::DropDiscarded);
        }
        let Some(block_id) = extract::container_id(doc, &selectors, zone) else {
            log::error!("drop zone has no owning block");
            self.debug_log_event("drop DISCARDED: zone has no owning block");
            return EventResponse::handled(DragOutcome::DropDiscarded);
        };
        let Some((done, line)) = self.session.complete() else {
            return EventResponse::handled(DragOutcome::DropDiscarded);
        };
        self.debug_log_event(line);

        doc.remove_class(done.source, &selectors.dragging_class);
        let body = doc.body();
        doc.remove_class(body, &selectors.body_dragging_class);

        let key = self.commit(
            doc,
            Operation::AttachResource {
                block_id: block_id.clone(),
                resource: done.item,
            },
        );
        self.stats.drops_completed += 1;
        EventResponse::handled(DragOutcome::Completed { block_id, key })
    }

    fn on_drag_end<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        event: &mut DragEvent,
    ) -> EventResponse {
        let selectors = self.options.selectors.clone();
        if let Some(source) = query::closest_with_class(doc, event.target, &selectors.resource_source)
        {
            doc.remove_class(source, &selectors.dragging_class);
        }
        let generation = self.abort_drag(doc);
        EventResponse::passive(DragOutcome::Released { generation })
    }

    /// Drag-end cleanup. The session itself is cleared after the grace delay, and only if
    /// no newer drag has armed by then.
    fn abort_drag<D: Document + ?Sized>(&mut self, doc: &mut D) -> Option<u64> {
        let selectors = self.options.selectors.clone();
        for node in doc.elements_with_class(&selectors.no_drop_class) {
            doc.remove_class(node, &selectors.no_drop_class);
        }
        if let Some(source) = self.session.active().map(|active| active.source) {
            doc.remove_class(source, &selectors.dragging_class);
        }
        let body = doc.body();
        doc.remove_class(body, &selectors.body_dragging_class);

        let (generation, line) = self.session.release(self.now);
        self.debug_log_event(line);
        if let Some(generation) = generation {
            self.timers.schedule(
                TimerKey::ClearSession { generation },
                self.now + self.options.drag_end_grace,
            );
        }
        generation
    }
}

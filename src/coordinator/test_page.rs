//! A HOST-like page built in a [`MemoryDocument`], shared by the coordinator tests.

use core::time::Duration;
use std::collections::BTreeSet;

use crate::bridge::HostContract;
use crate::dom::{Document, ElementSpec, MemoryDocument, NodeId, query};

use super::{
    BatchClassification, Coordinator, CoordinatorOptions, DragEvent, DragEventKind,
    EventResponse, PAYLOAD_MIME,
};

pub(super) const DRAFT: &str = "/files/draft.txt";
pub(super) const NOTES: &str = "/files/notes.md";

pub(super) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(super) fn resource(path: &str, name: &str, title: &str, description: &str) -> ElementSpec {
    ElementSpec::new("div")
        .class("resource-item-gradio")
        .child(
            ElementSpec::new("span")
                .class("resource-path-hidden")
                .attr("data-path", path)
                .text(path),
        )
        .child(ElementSpec::new("span").class("resource-filename").text(name))
        .child(
            ElementSpec::new("div")
                .class("resource-title-gradio")
                .child(ElementSpec::new("textarea").value(title)),
        )
        .child(
            ElementSpec::new("div")
                .class("resource-desc-gradio")
                .child(ElementSpec::new("textarea").value(description)),
        )
        .child(ElementSpec::new("button").text("Delete"))
}

/// A block with a drop zone. `attached` is `(path, title, description)` per resource.
pub(super) fn block(id: &str, attached: &[(&str, &str, &str)]) -> ElementSpec {
    let dropped = attached.iter().map(|&(path, title, description)| {
        ElementSpec::new("div")
            .class("dropped-resource")
            .attr("data-resource-path", path)
            .child(ElementSpec::new("span").class("dropped-resource-title").text(title))
            .child(
                ElementSpec::new("div")
                    .class("resource-description")
                    .child(ElementSpec::new("textarea").value(description)),
            )
    });
    ElementSpec::new("div")
        .class("content-block")
        .attr("data-id", id)
        .child(ElementSpec::new("textarea").class("block-content"))
        .child(ElementSpec::new("div").class("block-resources").children(dropped))
}

fn proxy_area() -> ElementSpec {
    let contract = HostContract::default();
    let mut fields: BTreeSet<&str> = BTreeSet::new();
    let mut triggers: BTreeSet<&str> = BTreeSet::new();
    for binding in contract.operations.values() {
        fields.extend(binding.params.iter().map(String::as_str));
        triggers.insert(binding.trigger.as_str());
    }
    let fields = fields.into_iter().map(|id| {
        ElementSpec::new("div")
            .id(id)
            .child(ElementSpec::new("label"))
            .child(ElementSpec::new("textarea"))
    });
    let triggers = triggers
        .into_iter()
        .map(|id| ElementSpec::new("button").id(id));
    ElementSpec::new("div")
        .id("host-proxies")
        .children(fields)
        .children(triggers)
}

pub(super) struct TestPage {
    pub doc: MemoryDocument,
    pub sidebar: NodeId,
    pub blocks: NodeId,
}

impl TestPage {
    /// Two resources (draft, notes) and three blocks; notes is attached to blocks 1 and 2.
    pub fn new() -> Self {
        Self::with_blocks([
            block("block-1", &[(NOTES, "Notes", "Shared text")]),
            block("block-2", &[(NOTES, "Notes", "Shared text")]),
            block("block-3", &[]),
        ])
    }

    pub fn with_blocks(blocks: impl IntoIterator<Item = ElementSpec>) -> Self {
        init_test_logging();
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let sidebar = doc.build(
            body,
            ElementSpec::new("div").id("resource-panel").children([
                resource(DRAFT, "draft.txt", "Draft", ""),
                resource(NOTES, "notes.md", "Notes", "Meeting notes"),
            ]),
        );
        doc.build(
            body,
            ElementSpec::new("div")
                .class("resource-upload-gradio")
                .child(ElementSpec::new("input").attr("type", "file")),
        );
        let blocks = doc.build(body, ElementSpec::new("div").id("blocks").children(blocks));
        doc.build(
            body,
            ElementSpec::new("div")
                .id("doc-description-id")
                .child(ElementSpec::new("textarea")),
        );
        doc.build(body, proxy_area());
        doc.build(body, ElementSpec::new("div").id("switch-tab-trigger"));
        doc.take_mutations();
        Self {
            doc,
            sidebar,
            blocks,
        }
    }

    pub fn source(&self, path: &str) -> NodeId {
        self.doc
            .elements_with_class("resource-item-gradio")
            .into_iter()
            .find(|&source| {
                query::find_descendant_with_class(&self.doc, source, "resource-path-hidden")
                    .and_then(|holder| self.doc.attribute(holder, "data-path"))
                    .as_deref()
                    == Some(path)
            })
            .unwrap_or_else(|| panic!("no source for {path}"))
    }

    pub fn filename_of(&self, path: &str) -> NodeId {
        query::find_descendant_with_class(&self.doc, self.source(path), "resource-filename")
            .expect("filename element")
    }

    pub fn title_field(&self, path: &str) -> NodeId {
        query::text_field_in(&self.doc, self.source(path), "resource-title-gradio")
            .expect("title field")
    }

    pub fn description_field(&self, path: &str) -> NodeId {
        query::text_field_in(&self.doc, self.source(path), "resource-desc-gradio")
            .expect("description field")
    }

    pub fn block(&self, id: &str) -> NodeId {
        self.doc
            .elements_with_class("content-block")
            .into_iter()
            .find(|&b| self.doc.attribute(b, "data-id").as_deref() == Some(id))
            .unwrap_or_else(|| panic!("no block {id}"))
    }

    pub fn zone(&self, block_id: &str) -> NodeId {
        query::find_descendant_with_class(&self.doc, self.block(block_id), "block-resources")
            .expect("drop zone")
    }

    /// Description field of the resource attached to `block_id` at `path`.
    pub fn block_description_field(&self, block_id: &str, path: &str) -> NodeId {
        let dropped = query::find_descendant(&self.doc, self.block(block_id), |doc, n| {
            doc.attribute(n, "data-resource-path").as_deref() == Some(path)
        })
        .expect("dropped resource");
        query::text_field_in(&self.doc, dropped, "resource-description")
            .expect("block description field")
    }

    pub fn document_description_field(&self) -> NodeId {
        self.doc
            .element_by_id("doc-description-id")
            .and_then(|wrapper| query::value_holder(&self.doc, wrapper))
            .expect("document description field")
    }

    pub fn proxy_value(&self, id: &str) -> String {
        self.doc
            .element_by_id(id)
            .and_then(|wrapper| query::value_holder(&self.doc, wrapper))
            .and_then(|field| self.doc.value(field))
            .unwrap_or_default()
    }

    /// Types `text` into `field` and delivers the input event.
    pub fn type_into(
        &mut self,
        coordinator: &mut Coordinator,
        field: NodeId,
        text: &str,
    ) -> super::InputOutcome {
        self.doc.set_value(field, text);
        coordinator.handle_input(&mut self.doc, field)
    }

    /// HOST re-renders the whole resource list.
    pub fn rerender_sidebar(&mut self) {
        self.doc.replace_children(
            self.sidebar,
            [
                resource(DRAFT, "draft.txt", "Draft", ""),
                resource(NOTES, "notes.md", "Notes", "Meeting notes"),
            ],
        );
    }

    /// Hands every mutation record produced so far to the watcher.
    pub fn deliver_mutations(&mut self, coordinator: &mut Coordinator) -> BatchClassification {
        let records = self.doc.take_mutations();
        coordinator.on_mutations(&self.doc, &records)
    }

    pub fn send(
        &mut self,
        coordinator: &mut Coordinator,
        kind: DragEventKind,
        target: NodeId,
    ) -> (EventResponse, DragEvent) {
        let mut event = DragEvent::new(kind, target);
        let response = coordinator.handle_drag_event(&mut self.doc, &mut event);
        (response, event)
    }

    /// A full gesture as the browser delivers it: start, enter, over, drop, end.
    ///
    /// Returns the drag-start payload and the five responses.
    pub fn drag_and_drop(
        &mut self,
        coordinator: &mut Coordinator,
        grab: NodeId,
        target: NodeId,
    ) -> (Option<String>, Vec<EventResponse>) {
        let (start, event) = self.send(coordinator, DragEventKind::DragStart, grab);
        let payload = event.data_transfer.get_data(PAYLOAD_MIME).map(str::to_owned);
        let mut responses = vec![start];
        for kind in [
            DragEventKind::DragEnter,
            DragEventKind::DragOver,
            DragEventKind::Drop,
        ] {
            responses.push(self.send(coordinator, kind, target).0);
        }
        responses.push(self.send(coordinator, DragEventKind::DragEnd, grab).0);
        (payload, responses)
    }
}

/// A started coordinator that has run its initial bind on `page`.
pub(super) fn bound_coordinator(page: &mut TestPage, options: CoordinatorOptions) -> Coordinator {
    let mut coordinator = Coordinator::new(options);
    coordinator.start();
    let initial = coordinator.options().initial_bind_delay;
    coordinator.advance(&mut page.doc, initial);
    assert_eq!(coordinator.stats().binds, 1, "initial bind should have run");
    coordinator
}

pub(super) fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

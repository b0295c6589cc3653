use std::collections::BTreeMap;

use ahash::AHashMap;
use itertools::Itertools as _;

use super::{Document, ListenerKind, MutationRecord, NodeId, NodeSummary};

/// What the host observed through its declared channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// `notify_input` on a field. `field` is the id of the field or of its nearest
    /// ancestor carrying one (the host component wrapper).
    Input { field: String, value: String },
    /// `click` on a trigger.
    Click { trigger: String },
}

/// Declarative element description used to build (and re-render) fragments.
#[derive(Clone, Debug, Default)]
pub struct ElementSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    value: Option<String>,
    children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whitespace-separated class list, appended to any classes already given.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_owned));
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: AHashMap<ListenerKind, usize>,
}

impl Element {
    fn new(tag: String) -> Self {
        let value = matches!(tag.as_str(), "input" | "textarea").then(String::new);
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value,
            parent: None,
            children: Vec::new(),
            listeners: AHashMap::default(),
        }
    }

    fn class_attribute(&self) -> Option<String> {
        (!self.classes.is_empty()).then(|| self.classes.join(" "))
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// In-memory [`Document`]: an arena tree with mutation capture and a host journal.
///
/// Removing a node frees its slot and bumps the slot generation, so listeners attached
/// to it vanish with it and its [`NodeId`] never resolves again.
#[derive(Debug)]
pub struct MemoryDocument {
    slots: Vec<Slot>,
    free: Vec<u32>,
    body: NodeId,
    mutations: Vec<MutationRecord>,
    host_events: Vec<HostEvent>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                element: Some(Element::new("body".to_owned())),
            }],
            free: Vec::new(),
            body: NodeId::new(0, 0),
            mutations: Vec::new(),
            host_events: Vec::new(),
        }
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        let slot = self.slots.get(node.index() as usize)?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.element.as_ref()
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(node.index() as usize)?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.element.as_mut()
    }

    fn alloc(&mut self, element: Element) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            return NodeId::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            element: Some(element),
        });
        NodeId::new(index, 0)
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Element::new(tag.to_ascii_lowercase()))
    }

    fn instantiate(&mut self, spec: ElementSpec) -> NodeId {
        let ElementSpec {
            tag,
            id,
            classes,
            attributes,
            text,
            value,
            children,
        } = spec;
        let mut element = Element::new(tag);
        element.id = id;
        element.classes = classes.into_iter().unique().collect();
        element.attributes = attributes.into_iter().collect();
        element.text = text.unwrap_or_default();
        if value.is_some() {
            element.value = value;
        }
        let node = self.alloc(element);
        for child_spec in children {
            let child = self.instantiate(child_spec);
            self.link(node, child, None);
        }
        node
    }

    fn link(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) {
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.element_mut(parent) {
            match at {
                Some(i) if i <= el.children.len() => el.children.insert(i, child),
                _ => el.children.push(child),
            }
        }
    }

    fn unlink(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.element(child)?.parent?;
        let index = {
            let el = self.element_mut(parent)?;
            let index = el.children.iter().position(|&c| c == child)?;
            el.children.remove(index);
            index
        };
        if let Some(el) = self.element_mut(child) {
            el.parent = None;
        }
        Some((parent, index))
    }

    fn summarize(&self, node: NodeId) -> NodeSummary {
        let tag = self
            .element(node)
            .map(|el| el.tag.clone())
            .unwrap_or_default();
        let subtree_classes = std::iter::once(node)
            .chain(super::query::descendants(self, node))
            .filter_map(|n| self.element(n))
            .flat_map(|el| el.classes.iter().cloned())
            .unique()
            .collect();
        NodeSummary {
            node,
            tag,
            subtree_classes,
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let Some(slot) = self.slots.get_mut(n.index() as usize) else {
                continue;
            };
            if slot.generation != n.generation() {
                continue;
            }
            if let Some(el) = slot.element.take() {
                stack.extend(el.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.index());
        }
    }

    /// Builds `spec` detached, then inserts it under `parent` as one mutation.
    pub fn build(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let node = self.instantiate(spec);
        self.append_child(parent, node);
        node
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.element(parent).is_none() || self.element(child).is_none() || parent == child {
            return;
        }
        self.detach(child);
        self.link(parent, child, None);
        if self.contains(parent) {
            let summary = self.summarize(child);
            self.mutations.push(MutationRecord::ChildList {
                target: parent,
                added: vec![summary],
                removed: Vec::new(),
            });
        }
    }

    fn detach(&mut self, node: NodeId) {
        let was_live = self.contains(node);
        let summary = was_live.then(|| self.summarize(node));
        if let Some((parent, _)) = self.unlink(node) {
            if let Some(summary) = summary {
                self.mutations.push(MutationRecord::ChildList {
                    target: parent,
                    added: Vec::new(),
                    removed: vec![summary],
                });
            }
        }
    }

    /// Removes `node` and its subtree from the document and destroys them.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body || self.element(node).is_none() {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    /// Destructive re-render of one node: `old` is destroyed and `spec` built in its place.
    pub fn replace(&mut self, old: NodeId, spec: ElementSpec) -> Option<NodeId> {
        if old == self.body {
            return None;
        }
        let parent = self.element(old)?.parent?;
        let removed = self.summarize(old);
        let was_live = self.contains(old);
        let (_, index) = self.unlink(old)?;
        self.free_subtree(old);
        let node = self.instantiate(spec);
        self.link(parent, node, Some(index));
        if was_live {
            let added = self.summarize(node);
            self.mutations.push(MutationRecord::ChildList {
                target: parent,
                added: vec![added],
                removed: vec![removed],
            });
        }
        Some(node)
    }

    /// Destroys every child of `parent` and builds `specs` in their place.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        specs: impl IntoIterator<Item = ElementSpec>,
    ) -> Vec<NodeId> {
        let Some(old_children) = self.element(parent).map(|el| el.children.clone()) else {
            return Vec::new();
        };
        let live = self.contains(parent);
        let removed = old_children.iter().map(|&c| self.summarize(c)).collect_vec();
        for child in old_children {
            self.unlink(child);
            self.free_subtree(child);
        }
        let added_nodes = specs
            .into_iter()
            .map(|spec| {
                let node = self.instantiate(spec);
                self.link(parent, node, None);
                node
            })
            .collect_vec();
        if live {
            let added = added_nodes.iter().map(|&n| self.summarize(n)).collect();
            self.mutations.push(MutationRecord::ChildList {
                target: parent,
                added,
                removed,
            });
        }
        added_nodes
    }

    /// Drains the mutation records produced since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    pub fn host_events(&self) -> &[HostEvent] {
        &self.host_events
    }

    pub fn take_host_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.host_events)
    }

    /// Triggers clicked so far, in order.
    pub fn clicked_triggers(&self) -> Vec<&str> {
        self.host_events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Click { trigger } => Some(trigger.as_str()),
                HostEvent::Input { .. } => None,
            })
            .collect()
    }

    fn closest_id(&self, node: NodeId) -> String {
        super::query::closest(self, node, |doc, n| {
            doc.element(n).is_some_and(|el| el.id.is_some())
        })
        .and_then(|n| self.element(n).and_then(|el| el.id.clone()))
        .unwrap_or_default()
    }

    fn record_attribute(&mut self, node: NodeId, name: &str, old_value: Option<String>) {
        if self.contains(node) {
            self.mutations.push(MutationRecord::Attributes {
                target: node,
                name: name.to_owned(),
                old_value,
            });
        }
    }
}

impl Document for MemoryDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn contains(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            let Some(el) = self.element(current) else {
                return false;
            };
            if current == self.body {
                return true;
            }
            match el.parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.body)
            .chain(super::query::descendants(self, self.body))
            .find(|&n| self.element(n).is_some_and(|el| el.id.as_deref() == Some(id)))
    }

    fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        super::query::descendants(self, self.body)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element(node)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|el| el.tag.clone())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let el = self.element(node)?;
        match name {
            "class" => el.class_attribute(),
            "id" => el.id.clone(),
            _ => el.attributes.get(name).cloned(),
        }
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let el = self.element(node)?;
        let mut text = el.text.clone();
        for &child in &el.children {
            if let Some(child_text) = self.text_content(child) {
                text.push_str(&child_text);
            }
        }
        Some(text)
    }

    fn value(&self, node: NodeId) -> Option<String> {
        self.element(node)?.value.clone()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let old_value = match name {
            "class" => {
                let old = el.class_attribute();
                el.classes = value.split_whitespace().map(str::to_owned).unique().collect();
                old
            }
            "id" => el.id.replace(value.to_owned()),
            _ => el.attributes.insert(name.to_owned(), value.to_owned()),
        };
        self.record_attribute(node, name, old_value);
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        if el.classes.iter().any(|c| c == class) {
            return;
        }
        let old = el.class_attribute();
        el.classes.push(class.to_owned());
        self.record_attribute(node, "class", old);
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        if !el.classes.iter().any(|c| c == class) {
            return;
        }
        let old = el.class_attribute();
        el.classes.retain(|c| c != class);
        self.record_attribute(node, "class", old);
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        let children = self.children(node);
        for child in children {
            self.remove(child);
        }
        if let Some(el) = self.element_mut(node) {
            text.clone_into(&mut el.text);
        }
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.value = Some(value.to_owned());
        }
    }

    fn notify_input(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        let value = self.value(node).unwrap_or_default();
        let field = self.closest_id(node);
        self.host_events.push(HostEvent::Input { field, value });
    }

    fn click(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        let trigger = self.closest_id(node);
        self.host_events.push(HostEvent::Click { trigger });
    }

    fn add_listener(&mut self, node: NodeId, kind: ListenerKind) {
        if let Some(el) = self.element_mut(node) {
            *el.listeners.entry(kind).or_insert(0) += 1;
        }
    }

    fn remove_listener(&mut self, node: NodeId, kind: ListenerKind) {
        if let Some(el) = self.element_mut(node) {
            el.listeners.remove(&kind);
        }
    }

    fn listener_count(&self, node: NodeId, kind: ListenerKind) -> usize {
        self.element(node)
            .and_then(|el| el.listeners.get(&kind).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_node_ids_never_resolve_again() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let old = doc.build(body, ElementSpec::new("div").class("resource-item-gradio"));
        doc.add_listener(old, ListenerKind::DragStart);
        doc.remove(old);

        let new = doc.build(body, ElementSpec::new("div").class("resource-item-gradio"));
        assert_eq!(old.index(), new.index(), "slot should be reused");
        assert!(!doc.contains(old));
        assert!(doc.contains(new));
        assert_eq!(doc.listener_count(old, ListenerKind::DragStart), 0);
        assert_eq!(doc.listener_count(new, ListenerKind::DragStart), 0);
    }

    #[test]
    fn replace_records_added_and_removed_summaries() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let column = doc.build(
            body,
            ElementSpec::new("div").child(ElementSpec::new("div").class("resource-item-gradio")),
        );
        let item = doc.children(column)[0];
        doc.take_mutations();

        doc.replace(item, ElementSpec::new("div").class("content-block"));
        let records = doc.take_mutations();
        assert_eq!(records.len(), 1);
        let MutationRecord::ChildList { added, removed, .. } = &records[0] else {
            panic!("expected child list record, got {records:?}");
        };
        assert!(removed[0].contains_class("resource-item-gradio"));
        assert!(added[0].contains_class("content-block"));
    }

    #[test]
    fn class_changes_record_old_value() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let node = doc.build(body, ElementSpec::new("div").class("a"));
        doc.take_mutations();
        doc.add_class(node, "a");
        assert!(doc.take_mutations().is_empty(), "no-op add must not record");
        doc.add_class(node, "b");
        assert_eq!(
            doc.take_mutations(),
            vec![MutationRecord::Attributes {
                target: node,
                name: "class".to_owned(),
                old_value: Some("a".to_owned()),
            }]
        );
        assert_eq!(doc.attribute(node, "class").as_deref(), Some("a b"));
    }

    #[test]
    fn host_journal_uses_the_wrapper_id() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let wrapper = doc.build(
            body,
            ElementSpec::new("div")
                .id("update-title-text")
                .child(ElementSpec::new("textarea")),
        );
        let field = doc.children(wrapper)[0];
        doc.set_value(field, "Draft");
        assert!(doc.host_events().is_empty(), "raw writes are invisible to the host");
        doc.notify_input(field);
        assert_eq!(
            doc.host_events(),
            &[HostEvent::Input {
                field: "update-title-text".to_owned(),
                value: "Draft".to_owned(),
            }]
        );
    }
}

//! Tree walks built on the [`Document`] primitives.

use super::{Document, NodeId};

pub fn closest<D, F>(doc: &D, node: NodeId, mut pred: F) -> Option<NodeId>
where
    D: Document + ?Sized,
    F: FnMut(&D, NodeId) -> bool,
{
    let mut current = doc.contains(node).then_some(node);
    while let Some(n) = current {
        if pred(doc, n) {
            return Some(n);
        }
        current = doc.parent(n);
    }
    None
}

/// `element.closest(".class")`: the node itself or its nearest ancestor with `class`.
pub fn closest_with_class<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    class: &str,
) -> Option<NodeId> {
    closest(doc, node, |doc, n| doc.has_class(n, class))
}

/// All descendants of `node` in document order, `node` excluded.
pub fn descendants<D: Document + ?Sized>(doc: &D, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(node).into_iter().rev().collect();
    while let Some(n) = stack.pop() {
        out.push(n);
        stack.extend(doc.children(n).into_iter().rev());
    }
    out
}

pub fn find_descendant<D, F>(doc: &D, node: NodeId, mut pred: F) -> Option<NodeId>
where
    D: Document + ?Sized,
    F: FnMut(&D, NodeId) -> bool,
{
    descendants(doc, node).into_iter().find(|&n| pred(doc, n))
}

pub fn find_descendant_with_class<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    class: &str,
) -> Option<NodeId> {
    find_descendant(doc, node, |doc, n| doc.has_class(n, class))
}

/// Controls that must never start a drag of their enclosing source.
pub fn is_interactive<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    matches!(
        doc.tag_name(node).as_deref(),
        Some("input" | "textarea" | "button")
    )
}

/// A `textarea`, or an `input` that holds free text.
pub fn is_text_field<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    match doc.tag_name(node).as_deref() {
        Some("textarea") => true,
        Some("input") => doc
            .attribute(node, "type")
            .is_none_or(|ty| ty.eq_ignore_ascii_case("text")),
        _ => false,
    }
}

/// The element that actually holds a field's value.
///
/// Host components put their addressable id on a wrapper and the value on an inner
/// `textarea` or `input[type=text]`.
pub fn value_holder<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<NodeId> {
    if is_text_field(doc, node) {
        return Some(node);
    }
    find_descendant(doc, node, |doc, n| doc.tag_name(n).as_deref() == Some("textarea"))
        .or_else(|| find_descendant(doc, node, |doc, n| is_text_field(doc, n)))
}

/// Value holder of the first `class` container found inside `scope`.
pub fn text_field_in<D: Document + ?Sized>(doc: &D, scope: NodeId, class: &str) -> Option<NodeId> {
    let container = find_descendant_with_class(doc, scope, class)?;
    value_holder(doc, container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};

    #[test]
    fn value_holder_prefers_inner_textarea() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let wrapper = doc.build(
            body,
            ElementSpec::new("div")
                .id("update-desc-text")
                .child(ElementSpec::new("label"))
                .child(ElementSpec::new("textarea").value("")),
        );
        let holder = value_holder(&doc, wrapper).expect("holder");
        assert_eq!(doc.tag_name(holder).as_deref(), Some("textarea"));
    }

    #[test]
    fn checkbox_is_not_a_text_field() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let checkbox = doc.build(body, ElementSpec::new("input").attr("type", "checkbox"));
        let text = doc.build(body, ElementSpec::new("input").attr("type", "text"));
        assert!(!is_text_field(&doc, checkbox));
        assert!(is_text_field(&doc, text));
        assert!(is_interactive(&doc, checkbox));
    }

    #[test]
    fn closest_walks_up_to_the_matching_ancestor() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let block = doc.build(
            body,
            ElementSpec::new("div")
                .class("content-block")
                .child(ElementSpec::new("div").class("block-resources").child(ElementSpec::new("span"))),
        );
        let span = descendants(&doc, block)[1];
        assert_eq!(closest_with_class(&doc, span, "content-block"), Some(block));
        assert_eq!(closest_with_class(&doc, span, "missing"), None);
    }
}

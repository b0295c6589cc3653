use crate::dom::{Document, NodeId, query};

use super::Selectors;

/// Elements a resource must never be dropped on, even inside a drop zone: text fields
/// (the browser would paste the JSON payload into them) and upload components.
pub(super) fn is_invalid_drop_target<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    node: NodeId,
) -> bool {
    if matches!(doc.tag_name(node).as_deref(), Some("textarea" | "input")) {
        return true;
    }
    query::closest(doc, node, |doc, n| {
        doc.has_class(n, &selectors.upload_zone)
            || doc.attribute(n, "data-testid").as_deref()
                == Some(selectors.file_component_testid.as_str())
    })
    .is_some()
}

/// Interactive controls inside a source never start a drag of it.
pub(super) fn blocks_drag_start<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    query::is_interactive(doc, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};

    #[test]
    fn text_fields_and_upload_zones_are_invalid() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let zone = doc.build(
            body,
            ElementSpec::new("div")
                .class("block-resources")
                .child(ElementSpec::new("textarea"))
                .child(ElementSpec::new("div").attr("data-testid", "file").child(ElementSpec::new("span")))
                .child(ElementSpec::new("span")),
        );
        let children = doc.children(zone);
        let selectors = Selectors::default();

        assert!(is_invalid_drop_target(&doc, &selectors, children[0]));
        let inside_file = doc.children(children[1])[0];
        assert!(is_invalid_drop_target(&doc, &selectors, inside_file));
        assert!(!is_invalid_drop_target(&doc, &selectors, children[2]));
        assert!(!is_invalid_drop_target(&doc, &selectors, zone));
    }

    #[test]
    fn buttons_inside_sources_do_not_start_drags() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let button = doc.build(body, ElementSpec::new("button"));
        let label = doc.build(body, ElementSpec::new("span"));
        assert!(blocks_drag_start(&doc, button));
        assert!(!blocks_drag_start(&doc, label));
    }
}

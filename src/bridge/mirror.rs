//! Immediate local echo of an edit into every other on-screen copy of the same entity.
//!
//! HOST only learns about the edit once the debounce window closes; the mirror keeps the
//! rest of the page in step meanwhile.

use crate::coordinator::{Selectors, extract};
use crate::dom::{Document, query};

use super::Operation;

/// Returns how many elements were changed.
pub(super) fn apply<D: Document + ?Sized>(
    doc: &mut D,
    selectors: &Selectors,
    op: &Operation,
) -> usize {
    match op {
        Operation::RenameResource { path, title } => rename(doc, selectors, path, title),
        Operation::EditBlockDescription {
            block_id,
            path,
            description,
        } => block_description(doc, selectors, block_id, path, description),
        _ => 0,
    }
}

fn rename<D: Document + ?Sized>(doc: &mut D, selectors: &Selectors, path: &str, title: &str) -> usize {
    let mut updated = 0;

    for dropped in doc.elements_with_class(&selectors.dropped_resource) {
        if doc
            .attribute(dropped, &selectors.resource_path_attr)
            .as_deref()
            != Some(path)
        {
            continue;
        }
        let Some(label) =
            query::find_descendant_with_class(doc, dropped, &selectors.dropped_resource_title)
        else {
            continue;
        };
        if doc.text_content(label).as_deref() != Some(title) {
            doc.set_text_content(label, title);
            updated += 1;
        }
    }

    for source in doc.elements_with_class(&selectors.resource_source) {
        if extract::source_path(doc, selectors, source).as_deref() != Some(path) {
            continue;
        }
        if doc
            .attribute(source, &selectors.source_title_attr)
            .as_deref()
            != Some(title)
        {
            doc.set_attribute(source, &selectors.source_title_attr, title);
            updated += 1;
        }
    }

    updated
}

fn block_description<D: Document + ?Sized>(
    doc: &mut D,
    selectors: &Selectors,
    block_id: &str,
    path: &str,
    description: &str,
) -> usize {
    let mut updated = 0;

    for field in doc.elements_with_class(&selectors.block_resource_description) {
        if extract::attached_resource_path(doc, selectors, field).as_deref() != Some(path) {
            continue;
        }
        if extract::container_id(doc, selectors, field).as_deref() == Some(block_id) {
            continue;
        }
        let Some(holder) = query::value_holder(doc, field) else {
            continue;
        };
        if doc.value(holder).as_deref() != Some(description) {
            doc.set_value(holder, description);
            updated += 1;
        }
    }

    updated
}

use std::hash::{Hash as _, Hasher as _};

use crate::dom::{Document, NodeId, query};

use super::{BindingRegistry, Capability, Selectors};

/// Every live element that should carry a capability, in document order.
pub(super) fn candidates<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
) -> Vec<(NodeId, Capability)> {
    let mut out: Vec<(NodeId, Capability)> = Vec::new();
    for source in doc.elements_with_class(&selectors.resource_source) {
        out.push((source, Capability::Source));
        for wrapper_class in [&selectors.resource_title, &selectors.resource_description] {
            if let Some(field) = query::text_field_in(doc, source, wrapper_class) {
                out.push((field, Capability::InputWatcher));
            }
        }
    }
    out.extend(
        doc.elements_with_class(&selectors.drop_zone)
            .into_iter()
            .map(|zone| (zone, Capability::Target)),
    );
    out.extend(
        doc.elements_with_class(&selectors.block_resource_description)
            .into_iter()
            .filter_map(|field| query::value_holder(doc, field))
            .map(|field| (field, Capability::InputWatcher)),
    );
    if let Some(field) = doc
        .element_by_id(&selectors.document_description_id)
        .and_then(|wrapper| query::value_holder(doc, wrapper))
    {
        out.push((field, Capability::InputWatcher));
    }
    out
}

fn element_issues<D: Document + ?Sized>(
    doc: &D,
    registry: &BindingRegistry,
    node: NodeId,
    capability: Capability,
    issues: &mut Vec<String>,
) -> bool {
    let before = issues.len();
    let role = format!("{capability:?}").to_lowercase();

    if !registry.is_attached(node, capability) {
        issues.push(format!("integrity: {role} {node:?} has no binding record"));
    }
    for &kind in capability.listener_kinds() {
        match doc.listener_count(node, kind) {
            1 => {}
            0 => issues.push(format!("integrity: {role} {node:?} missing {kind:?} listener")),
            n => issues.push(format!(
                "integrity: {role} {node:?} has {n} {kind:?} listeners"
            )),
        }
    }
    if capability == Capability::Source && doc.attribute(node, "draggable").as_deref() != Some("true")
    {
        issues.push(format!("integrity: {role} {node:?} not draggable"));
    }

    issues.len() != before
}

/// Compares the live tree against the registry.
///
/// Returns the issues found and how many candidate elements have at least one.
pub(super) fn binding_integrity_issues<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    registry: &BindingRegistry,
) -> (Vec<String>, usize) {
    let mut issues: Vec<String> = Vec::new();
    let mut broken = 0;
    for (node, capability) in candidates(doc, selectors) {
        if element_issues(doc, registry, node, capability, &mut issues) {
            broken += 1;
        }
    }
    (issues, broken)
}

pub(super) fn hash_issues(lines: &[String]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for line in lines {
        line.hash(&mut hasher);
    }
    hasher.finish()
}

use itertools::Itertools as _;

use crate::dom::{Document, MutationRecord, NodeId, NodeSummary, query};

use super::{Coordinator, Selectors};

/// What a batch of mutation records touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchClassification {
    /// Draggable resources (or their fields) were added, removed or re-rendered.
    pub resources: bool,
    /// Drop zones (or block resource fields) were added, removed or re-rendered.
    pub drop_zones: bool,
    /// Blocks were added, removed or re-rendered.
    pub blocks: bool,
    /// A role-relevant class changed without any structural change (e.g. a collapse toggle).
    pub attributes: bool,
}

impl BatchClassification {
    pub fn is_relevant(&self) -> bool {
        self.resources || self.drop_zones || self.blocks || self.attributes
    }

    fn merge(&mut self, other: Self) {
        self.resources |= other.resources;
        self.drop_zones |= other.drop_zones;
        self.blocks |= other.blocks;
        self.attributes |= other.attributes;
    }
}

fn classify_summary(selectors: &Selectors, summary: &NodeSummary) -> BatchClassification {
    BatchClassification {
        resources: summary.contains_class(&selectors.resource_source)
            || summary.contains_class(&selectors.resource_title)
            || summary.contains_class(&selectors.resource_description)
            || summary.contains_class(&selectors.dropped_resource),
        drop_zones: summary.contains_class(&selectors.drop_zone)
            || summary.contains_class(&selectors.block_resource_description),
        blocks: summary.contains_class(&selectors.container),
        attributes: false,
    }
}

/// Classification implied by where a mutation happened: inside a block, a zone or a source.
fn classify_location<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    target: NodeId,
) -> BatchClassification {
    if !doc.contains(target) {
        return BatchClassification::default();
    }
    let within = |class: &str| query::closest_with_class(doc, target, class).is_some();
    BatchClassification {
        resources: within(&selectors.resource_source),
        drop_zones: within(&selectors.drop_zone),
        blocks: within(&selectors.container),
        attributes: false,
    }
}

fn class_list(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| v.split_whitespace().collect())
        .unwrap_or_default()
}

/// Classes present in exactly one of the two lists.
fn changed_classes<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<&'a str> {
    old.iter()
        .filter(|c| !new.contains(*c))
        .chain(new.iter().filter(|c| !old.contains(*c)))
        .copied()
        .unique()
        .collect()
}

fn is_role_class(selectors: &Selectors, class: &str) -> bool {
    [
        &selectors.resource_source,
        &selectors.drop_zone,
        &selectors.container,
        &selectors.block_resource_description,
    ]
    .iter()
    .any(|role| role.as_str() == class)
}

/// Classifies one batch. Structural changes count when they add or remove role elements or
/// happen inside one; attribute changes only for `class`, and only when a non-transient
/// class changed.
pub fn classify_batch<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    records: &[MutationRecord],
) -> BatchClassification {
    let mut out = BatchClassification::default();
    for record in records {
        match record {
            MutationRecord::ChildList {
                target,
                added,
                removed,
            } => {
                if added.is_empty() && removed.is_empty() {
                    continue;
                }
                for summary in added.iter().chain(removed) {
                    out.merge(classify_summary(selectors, summary));
                }
                out.merge(classify_location(doc, selectors, *target));
            }
            MutationRecord::Attributes {
                target,
                name,
                old_value,
            } => {
                if name != "class" {
                    continue;
                }
                let current = doc.attribute(*target, "class");
                let old = class_list(old_value.as_deref());
                let new = class_list(current.as_deref());
                let changed = changed_classes(&old, &new);
                let meaningful = changed
                    .iter()
                    .filter(|c| !selectors.is_transient_class(c))
                    .collect_vec();
                if meaningful.is_empty() {
                    continue;
                }
                let location = classify_location(doc, selectors, *target);
                if location.is_relevant() || meaningful.iter().any(|c| is_role_class(selectors, c)) {
                    out.attributes = true;
                }
            }
        }
    }
    out
}

impl Coordinator {
    /// Feeds one batch of the document's mutation stream to the watcher.
    ///
    /// A relevant batch (re)arms the debounced rebind: short after resource, zone or
    /// attribute changes, long after block-structure changes. Requests coalesce into one
    /// trailing bind per quiet period.
    pub fn on_mutations<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        records: &[MutationRecord],
    ) -> BatchClassification {
        let classification = classify_batch(doc, &self.options.selectors, records);
        if !classification.is_relevant() {
            return classification;
        }
        let delay = self.options.watch_delay(classification.blocks);
        let due = self.now + delay;
        self.schedule_rebind(due);
        log::debug!("watcher: {classification:?}, rebind in {delay:?}");
        self.debug_log_event(format!("watch {classification:?} rebind_due={due:?}"));
        classification
    }
}

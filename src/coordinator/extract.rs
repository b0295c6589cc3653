//! Reading resource identity and live field values out of HOST's markup.

use crate::dom::{Document, NodeId, query};
use crate::panel::PanelSet;

use super::{DraggableItem, Selectors};

#[derive(Debug)]
pub enum ExtractionError {
    /// The source has no path element, or it is empty.
    MissingPath,
    /// The source has no filename element, or it is empty.
    MissingFilename,
    Encode(serde_json::Error),
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPath => write!(f, "drag source has no resource path"),
            Self::MissingFilename => write!(f, "drag source has no filename"),
            Self::Encode(err) => write!(f, "drag payload encode error: {err}"),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingPath | Self::MissingFilename => None,
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

fn non_empty_trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty())
}

/// Resource path of a source: the path element's data attribute, else its text.
pub(crate) fn source_path<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    source: NodeId,
) -> Option<String> {
    let holder = query::find_descendant_with_class(doc, source, &selectors.resource_path)?;
    non_empty_trimmed(doc.attribute(holder, &selectors.resource_path_data_attr))
        .or_else(|| non_empty_trimmed(doc.text_content(holder)))
}

/// Id of the block that owns `node`.
pub(crate) fn container_id<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    node: NodeId,
) -> Option<String> {
    let container = query::closest_with_class(doc, node, &selectors.container)?;
    doc.attribute(container, &selectors.container_id_attr)
        .filter(|id| !id.is_empty())
}

/// Path of the attached resource a block field belongs to.
pub(crate) fn attached_resource_path<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    node: NodeId,
) -> Option<String> {
    let owner = query::closest(doc, node, |doc, n| {
        doc.attribute(n, &selectors.resource_path_attr).is_some()
    })?;
    doc.attribute(owner, &selectors.resource_path_attr)
        .filter(|path| !path.is_empty())
}

/// Current text of a field. A collapsed panel answers with its saved full text.
pub(crate) fn live_value<D: Document + ?Sized>(
    doc: &D,
    panels: &PanelSet,
    field: NodeId,
) -> Option<String> {
    match panels.get(field).and_then(|panel| panel.saved_full_text()) {
        Some(saved) => Some(saved.to_owned()),
        None => doc.value(field),
    }
}

/// Snapshot of a source as it is *now*, edits included.
pub(super) fn extract_item<D: Document + ?Sized>(
    doc: &D,
    selectors: &Selectors,
    panels: &PanelSet,
    source: NodeId,
) -> Result<DraggableItem, ExtractionError> {
    let path = source_path(doc, selectors, source).ok_or(ExtractionError::MissingPath)?;
    let name = query::find_descendant_with_class(doc, source, &selectors.resource_filename)
        .and_then(|node| non_empty_trimmed(doc.text_content(node)))
        .ok_or(ExtractionError::MissingFilename)?;

    let title = query::text_field_in(doc, source, &selectors.resource_title)
        .and_then(|field| non_empty_trimmed(live_value(doc, panels, field)))
        .unwrap_or_else(|| name.clone());
    let description = query::text_field_in(doc, source, &selectors.resource_description)
        .and_then(|field| live_value(doc, panels, field))
        .map(|d| d.trim().to_owned())
        .unwrap_or_default();

    Ok(DraggableItem::text(&name, &title, &path, &description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};
    use crate::panel::PanelProfile;

    fn source_spec(title: &str) -> ElementSpec {
        ElementSpec::new("div")
            .class("resource-item-gradio")
            .child(
                ElementSpec::new("div")
                    .class("resource-path-hidden")
                    .attr("data-path", "/files/draft.txt"),
            )
            .child(
                ElementSpec::new("span")
                    .class("resource-filename")
                    .text(" draft.txt "),
            )
            .child(
                ElementSpec::new("div")
                    .class("resource-title-gradio")
                    .child(ElementSpec::new("input").attr("type", "text").value(title)),
            )
            .child(
                ElementSpec::new("div")
                    .class("resource-desc-gradio")
                    .child(ElementSpec::new("textarea").value("  notes  ")),
            )
    }

    #[test]
    fn reads_live_values_and_falls_back_to_filename() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let source = doc.build(body, source_spec("   "));
        let selectors = Selectors::default();
        let panels = PanelSet::default();

        let item = extract_item(&doc, &selectors, &panels, source).expect("item");
        assert_eq!(item, DraggableItem::text("draft.txt", "draft.txt", "/files/draft.txt", "notes"));

        let title = query::text_field_in(&doc, source, "resource-title-gradio").expect("title");
        doc.set_value(title, "Draft");
        let item = extract_item(&doc, &selectors, &panels, source).expect("item");
        assert_eq!(item.title, "Draft");
    }

    #[test]
    fn collapsed_description_contributes_its_full_text() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let source = doc.build(body, source_spec("Draft"));
        let selectors = Selectors::default();
        let mut panels = PanelSet::default();

        let desc = query::text_field_in(&doc, source, "resource-desc-gradio").expect("desc");
        let full = "a\nb\nc";
        let (panel, _) = panels.ensure(desc, PanelProfile::RESOURCE_DESCRIPTION);
        let view = panel.collapse(full).expect("collapse");
        doc.set_value(desc, &view);

        let item = extract_item(&doc, &selectors, &panels, source).expect("item");
        assert_eq!(item.description, full);
    }

    #[test]
    fn missing_path_is_an_extraction_error() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let source = doc.build(
            body,
            ElementSpec::new("div")
                .class("resource-item-gradio")
                .child(ElementSpec::new("span").class("resource-filename").text("x")),
        );
        let err = extract_item(&doc, &Selectors::default(), &PanelSet::default(), source)
            .expect_err("no path");
        assert!(matches!(err, ExtractionError::MissingPath));
    }
}

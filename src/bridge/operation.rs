use std::collections::BTreeMap;

use crate::coordinator::DraggableItem;

/// Direction of an indent change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IndentDirection {
    In,
    Out,
}

impl IndentDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// One logical HOST operation with its parameters.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    /// Attach a dropped resource to a block.
    AttachResource {
        block_id: String,
        resource: DraggableItem,
    },
    RenameResource {
        path: String,
        title: String,
    },
    /// Description edited in the resource side panel.
    EditPanelDescription {
        path: String,
        description: String,
    },
    /// Description of a resource as attached to one block.
    EditBlockDescription {
        block_id: String,
        path: String,
        description: String,
    },
    RemoveBlockResource {
        block_id: String,
        path: String,
    },
    DeleteResource {
        path: String,
    },
    DeletePanelResource {
        path: String,
    },
    DeleteBlock {
        block_id: String,
    },
    UpdateBlockContent {
        block_id: String,
        content: String,
    },
    UpdateBlockHeading {
        block_id: String,
        heading: String,
    },
    ToggleBlockCollapse {
        block_id: String,
    },
    IndentBlock {
        block_id: String,
        direction: IndentDirection,
    },
    FocusBlock {
        block_id: String,
    },
    AddBlockAfter {
        block_id: String,
        block_type: String,
    },
    ConvertBlock {
        block_id: String,
        block_type: String,
    },
    LoadResourceContent {
        block_id: String,
        path: String,
    },
    /// Replace the document with one of HOST's bundled examples.
    LoadExample {
        example_id: String,
    },
    /// Remove a resource from the start screen, addressed by list position.
    RemoveStartResource {
        index: usize,
        name: String,
    },
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum OperationKind {
    AttachResource,
    RenameResource,
    EditPanelDescription,
    EditBlockDescription,
    RemoveBlockResource,
    DeleteResource,
    DeletePanelResource,
    DeleteBlock,
    UpdateBlockContent,
    UpdateBlockHeading,
    ToggleBlockCollapse,
    IndentBlock,
    FocusBlock,
    AddBlockAfter,
    ConvertBlock,
    LoadResourceContent,
    LoadExample,
    RemoveStartResource,
}

impl OperationKind {
    pub const ALL: [Self; 18] = [
        Self::AttachResource,
        Self::RenameResource,
        Self::EditPanelDescription,
        Self::EditBlockDescription,
        Self::RemoveBlockResource,
        Self::DeleteResource,
        Self::DeletePanelResource,
        Self::DeleteBlock,
        Self::UpdateBlockContent,
        Self::UpdateBlockHeading,
        Self::ToggleBlockCollapse,
        Self::IndentBlock,
        Self::FocusBlock,
        Self::AddBlockAfter,
        Self::ConvertBlock,
        Self::LoadResourceContent,
        Self::LoadExample,
        Self::RemoveStartResource,
    ];
}

/// Identity of a pending update: later commits with the same key supersede earlier ones.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UpdateKey {
    pub target: String,
    pub field: String,
}

impl UpdateKey {
    pub fn new(target: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            field: field.into(),
        }
    }
}

impl std::fmt::Display for UpdateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.target, self.field)
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AttachResource { .. } => OperationKind::AttachResource,
            Self::RenameResource { .. } => OperationKind::RenameResource,
            Self::EditPanelDescription { .. } => OperationKind::EditPanelDescription,
            Self::EditBlockDescription { .. } => OperationKind::EditBlockDescription,
            Self::RemoveBlockResource { .. } => OperationKind::RemoveBlockResource,
            Self::DeleteResource { .. } => OperationKind::DeleteResource,
            Self::DeletePanelResource { .. } => OperationKind::DeletePanelResource,
            Self::DeleteBlock { .. } => OperationKind::DeleteBlock,
            Self::UpdateBlockContent { .. } => OperationKind::UpdateBlockContent,
            Self::UpdateBlockHeading { .. } => OperationKind::UpdateBlockHeading,
            Self::ToggleBlockCollapse { .. } => OperationKind::ToggleBlockCollapse,
            Self::IndentBlock { .. } => OperationKind::IndentBlock,
            Self::FocusBlock { .. } => OperationKind::FocusBlock,
            Self::AddBlockAfter { .. } => OperationKind::AddBlockAfter,
            Self::ConvertBlock { .. } => OperationKind::ConvertBlock,
            Self::LoadResourceContent { .. } => OperationKind::LoadResourceContent,
            Self::LoadExample { .. } => OperationKind::LoadExample,
            Self::RemoveStartResource { .. } => OperationKind::RemoveStartResource,
        }
    }

    /// The debounce key of this operation.
    ///
    /// Attachments are keyed per resource, so two different resources dropped on the same
    /// block never supersede each other.
    pub fn key(&self) -> UpdateKey {
        match self {
            Self::AttachResource { block_id, resource } => {
                UpdateKey::new(block_id, format!("resource:{}", resource.path))
            }
            Self::RenameResource { path, .. } => UpdateKey::new(path, "title"),
            Self::EditPanelDescription { path, .. } => UpdateKey::new(path, "panel-description"),
            Self::EditBlockDescription { block_id, path, .. } => {
                UpdateKey::new(block_id, format!("description:{path}"))
            }
            Self::RemoveBlockResource { block_id, path } => {
                UpdateKey::new(block_id, format!("remove:{path}"))
            }
            Self::DeleteResource { path } => UpdateKey::new(path, "delete"),
            Self::DeletePanelResource { path } => UpdateKey::new(path, "delete-panel"),
            Self::DeleteBlock { block_id } => UpdateKey::new(block_id, "delete"),
            Self::UpdateBlockContent { block_id, .. } => UpdateKey::new(block_id, "content"),
            Self::UpdateBlockHeading { block_id, .. } => UpdateKey::new(block_id, "heading"),
            Self::ToggleBlockCollapse { block_id } => UpdateKey::new(block_id, "collapse"),
            Self::IndentBlock { block_id, .. } => UpdateKey::new(block_id, "indent"),
            Self::FocusBlock { block_id } => UpdateKey::new(block_id, "focus"),
            Self::AddBlockAfter { block_id, .. } => UpdateKey::new(block_id, "add-after"),
            Self::ConvertBlock { block_id, .. } => UpdateKey::new(block_id, "convert"),
            Self::LoadResourceContent { block_id, .. } => UpdateKey::new(block_id, "load-resource"),
            Self::LoadExample { .. } => UpdateKey::new("document", "load-example"),
            Self::RemoveStartResource { index, .. } => {
                UpdateKey::new("start-resources", format!("remove:{index}"))
            }
        }
    }

    /// Parameter values, in the order of the operation's proxy fields.
    pub fn params(&self) -> Result<Vec<String>, serde_json::Error> {
        let params = match self {
            Self::AttachResource { block_id, resource } => {
                vec![block_id.clone(), serde_json::to_string(resource)?]
            }
            Self::RenameResource { path, title } => vec![path.clone(), title.clone()],
            Self::EditPanelDescription { path, description } => {
                vec![path.clone(), description.clone()]
            }
            Self::EditBlockDescription {
                block_id,
                path,
                description,
            } => vec![block_id.clone(), path.clone(), description.clone()],
            Self::RemoveBlockResource { block_id, path }
            | Self::LoadResourceContent { block_id, path } => {
                vec![block_id.clone(), path.clone()]
            }
            Self::DeleteResource { path } | Self::DeletePanelResource { path } => {
                vec![path.clone()]
            }
            Self::DeleteBlock { block_id }
            | Self::ToggleBlockCollapse { block_id }
            | Self::FocusBlock { block_id } => vec![block_id.clone()],
            Self::UpdateBlockContent {
                block_id,
                content: text,
            }
            | Self::UpdateBlockHeading {
                block_id,
                heading: text,
            } => vec![block_id.clone(), text.clone()],
            Self::IndentBlock {
                block_id,
                direction,
            } => vec![block_id.clone(), direction.as_str().to_owned()],
            Self::AddBlockAfter {
                block_id,
                block_type,
            }
            | Self::ConvertBlock {
                block_id,
                block_type,
            } => vec![block_id.clone(), block_type.clone()],
            Self::LoadExample { example_id } => vec![example_id.clone()],
            Self::RemoveStartResource { index, name } => vec![index.to_string(), name.clone()],
        };
        Ok(params)
    }
}

/// Proxy fields and trigger HOST exposes for one operation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperationBinding {
    /// Element ids of the parameter fields, in parameter order.
    pub params: Vec<String>,
    pub trigger: String,
}

impl OperationBinding {
    pub fn new(params: &[&str], trigger: &str) -> Self {
        Self {
            params: params.iter().map(|&p| p.to_owned()).collect(),
            trigger: trigger.to_owned(),
        }
    }
}

/// HOST's "commit this operation" contract: which fields to write, which trigger to fire.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HostContract {
    pub operations: BTreeMap<OperationKind, OperationBinding>,
}

impl HostContract {
    pub fn binding(&self, kind: OperationKind) -> Option<&OperationBinding> {
        self.operations.get(&kind)
    }
}

impl Default for HostContract {
    fn default() -> Self {
        use OperationKind as K;

        let operations = [
            (
                K::AttachResource,
                OperationBinding::new(
                    &["update-resources-block-id", "update-resources-input"],
                    "update-resources-trigger",
                ),
            ),
            (
                K::RenameResource,
                OperationBinding::new(
                    &["update-title-resource-path", "update-title-text"],
                    "update-title-trigger",
                ),
            ),
            // HOST reuses the title fields for panel descriptions.
            (
                K::EditPanelDescription,
                OperationBinding::new(
                    &["update-title-resource-path", "update-title-text"],
                    "update-panel-desc-trigger",
                ),
            ),
            (
                K::EditBlockDescription,
                OperationBinding::new(
                    &[
                        "update-desc-block-id",
                        "update-desc-resource-path",
                        "update-desc-text",
                    ],
                    "update-desc-trigger",
                ),
            ),
            (
                K::RemoveBlockResource,
                OperationBinding::new(
                    &["remove-resource-block-id", "remove-resource-path"],
                    "remove-resource-trigger",
                ),
            ),
            (
                K::DeleteResource,
                OperationBinding::new(&["delete-resource-path"], "delete-resource-trigger"),
            ),
            (
                K::DeletePanelResource,
                OperationBinding::new(
                    &["delete-panel-resource-path"],
                    "delete-panel-resource-trigger",
                ),
            ),
            (
                K::DeleteBlock,
                OperationBinding::new(&["delete-block-id"], "delete-trigger"),
            ),
            (
                K::UpdateBlockContent,
                OperationBinding::new(&["update-block-id", "update-content-input"], "update-trigger"),
            ),
            (
                K::UpdateBlockHeading,
                OperationBinding::new(
                    &["update-heading-block-id", "update-heading-input"],
                    "update-heading-trigger",
                ),
            ),
            (
                K::ToggleBlockCollapse,
                OperationBinding::new(&["toggle-block-id"], "toggle-trigger"),
            ),
            (
                K::IndentBlock,
                OperationBinding::new(&["indent-block-id", "indent-direction"], "indent-trigger"),
            ),
            (
                K::FocusBlock,
                OperationBinding::new(&["focus-block-id"], "focus-trigger"),
            ),
            (
                K::AddBlockAfter,
                OperationBinding::new(&["add-after-block-id", "add-after-type"], "add-after-trigger"),
            ),
            (
                K::ConvertBlock,
                OperationBinding::new(&["convert-block-id", "convert-type"], "convert-trigger"),
            ),
            (
                K::LoadResourceContent,
                OperationBinding::new(
                    &["load-resource-block-id", "load-resource-path"],
                    "load-resource-trigger",
                ),
            ),
            (
                K::LoadExample,
                OperationBinding::new(&["example-id-input"], "load-example-trigger"),
            ),
            (
                K::RemoveStartResource,
                OperationBinding::new(
                    &["start-remove-resource-index", "start-remove-resource-name"],
                    "start-remove-resource-btn",
                ),
            ),
        ]
        .into_iter()
        .collect();

        Self { operations }
    }
}

use core::time::Duration;

use crate::bridge::BridgeOptions;
use crate::panel::PanelProfile;

/// Class names, attribute names and element ids that give HOST's markup its roles.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// A draggable resource in the side panel.
    pub resource_source: String,
    /// Hidden element inside a source that carries the resource path.
    pub resource_path: String,
    /// Attribute of [`Self::resource_path`] holding the path. Falls back to its text.
    pub resource_path_data_attr: String,
    pub resource_filename: String,
    /// Wrapper of the editable title field of a source.
    pub resource_title: String,
    /// Wrapper of the editable description field of a source.
    pub resource_description: String,

    /// Drop zone inside a block.
    pub drop_zone: String,
    /// Logical container (block) that owns drop zones.
    pub container: String,
    /// Attribute of [`Self::container`] holding the block id.
    pub container_id_attr: String,

    /// A resource as rendered inside a block.
    pub dropped_resource: String,
    pub dropped_resource_title: String,
    /// Attribute naming the resource path on rendered resources, also written on sources.
    pub resource_path_attr: String,
    /// Attribute on a source mirroring its latest title.
    pub source_title_attr: String,
    /// Description field of a resource attached to a block.
    pub block_resource_description: String,

    /// Id of the document-level description wrapper.
    pub document_description_id: String,

    /// Upload zones, never valid drop targets.
    pub upload_zone: String,
    /// `data-testid` of HOST's file component, never a valid drop target.
    pub file_component_testid: String,

    /// Set on a drop zone while a valid drag hovers it.
    pub drag_over_class: String,
    /// Set on the source being dragged.
    pub dragging_class: String,
    /// Set on an invalid target while a drag hovers it.
    pub no_drop_class: String,
    /// Set on the document body for the duration of a drag.
    pub body_dragging_class: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            resource_source: "resource-item-gradio".to_owned(),
            resource_path: "resource-path-hidden".to_owned(),
            resource_path_data_attr: "data-path".to_owned(),
            resource_filename: "resource-filename".to_owned(),
            resource_title: "resource-title-gradio".to_owned(),
            resource_description: "resource-desc-gradio".to_owned(),
            drop_zone: "block-resources".to_owned(),
            container: "content-block".to_owned(),
            container_id_attr: "data-id".to_owned(),
            dropped_resource: "dropped-resource".to_owned(),
            dropped_resource_title: "dropped-resource-title".to_owned(),
            resource_path_attr: "data-resource-path".to_owned(),
            source_title_attr: "data-resource-title".to_owned(),
            block_resource_description: "resource-description".to_owned(),
            document_description_id: "doc-description-id".to_owned(),
            upload_zone: "resource-upload-gradio".to_owned(),
            file_component_testid: "file".to_owned(),
            drag_over_class: "drag-over".to_owned(),
            dragging_class: "dragging".to_owned(),
            no_drop_class: "no-drop".to_owned(),
            body_dragging_class: "dragging-resource".to_owned(),
        }
    }
}

impl Selectors {
    /// Classes this crate toggles during a gesture. Changes to them alone never mean HOST
    /// re-rendered anything.
    pub(crate) fn is_transient_class(&self, class: &str) -> bool {
        class == self.drag_over_class
            || class == self.dragging_class
            || class == self.no_drop_class
            || class == self.body_dragging_class
    }
}

/// Options for [`super::Coordinator`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoordinatorOptions {
    /// Delay between [`super::Coordinator::start`] and the first bind.
    ///
    /// HOST usually has not produced its first render when the coordinator starts.
    pub initial_bind_delay: Duration,

    /// Minimum interval between two binds. A bind requested inside the window is a no-op.
    ///
    /// Scheduled rebinds that land inside the window are re-armed for its end, so a HOST
    /// render that happens right after a bind still gets bound.
    pub bind_guard_window: Duration,

    /// Delay of the single retry scheduled when a bind finds no drop zones.
    pub retry_drop_targets_delay: Duration,

    /// Grace period between drag-end and clearing the drag session, so that a drop racing
    /// with drag-end still sees the session.
    pub drag_end_grace: Duration,

    /// Rebind delay after resource, drop-zone or attribute changes.
    pub watch_short_delay: Duration,

    /// Rebind delay after block-structure changes. HOST renders blocks in several batches.
    pub watch_block_delay: Duration,

    /// Health monitor period.
    pub monitor_period: Duration,

    /// If false, the health monitor only reports and never repairs.
    pub monitor_repair: bool,

    /// Period of the signal element poll.
    pub signal_poll_period: Duration,

    /// Id of the element HOST writes signals into.
    pub signal_element_id: String,

    /// Tag of the signals to pick up (`<tag>_<digits>`).
    pub signal_tag: String,

    /// Number of recently seen signal timestamps remembered for de-duplication.
    pub signal_capacity: usize,

    /// Collapse long text fields automatically when they are first bound.
    pub auto_collapse_long_text: bool,

    /// Panel profile of source description fields.
    pub source_description_panel: PanelProfile,

    /// Panel profile of the document description field.
    pub document_description_panel: PanelProfile,

    pub selectors: Selectors,

    pub bridge: BridgeOptions,

    /// If true, record coordinator events in a small ring buffer (see
    /// [`super::Coordinator::debug_log_text`]).
    pub debug_event_log: bool,

    /// Maximum number of debug log lines to keep (ring buffer).
    pub debug_event_log_capacity: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            initial_bind_delay: Duration::from_millis(200),
            bind_guard_window: Duration::from_millis(100),
            retry_drop_targets_delay: Duration::from_millis(500),
            drag_end_grace: Duration::from_millis(100),
            watch_short_delay: Duration::from_millis(50),
            watch_block_delay: Duration::from_millis(300),
            monitor_period: Duration::from_secs(2),
            monitor_repair: true,
            signal_poll_period: Duration::from_millis(100),
            signal_element_id: "switch-tab-trigger".to_owned(),
            signal_tag: "SWITCH_TO_DRAFT_TAB".to_owned(),
            signal_capacity: 10,
            auto_collapse_long_text: true,
            source_description_panel: PanelProfile::RESOURCE_DESCRIPTION,
            document_description_panel: PanelProfile::DOCUMENT_DESCRIPTION,
            selectors: Selectors::default(),
            bridge: BridgeOptions::default(),
            debug_event_log: false,
            debug_event_log_capacity: 200,
        }
    }
}

impl CoordinatorOptions {
    /// Rebind delay for a classified mutation batch.
    pub(crate) fn watch_delay(&self, block_structure_changed: bool) -> Duration {
        if block_structure_changed {
            self.watch_block_delay
        } else {
            self.watch_short_delay
        }
    }
}

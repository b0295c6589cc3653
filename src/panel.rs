//! Collapse/expand state for long free-text fields.
//!
//! A collapsed panel shows a deterministic two-line view of the text it saved on collapse.
//! The saved text is the only source of truth while collapsed: the visible value is
//! derived from it, never the other way round.

pub mod wrap;

use ahash::AHashMap;

use crate::dom::NodeId;

pub use wrap::{collapsed_view, estimate_visual_lines};

/// Rendering constants of one kind of panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PanelProfile {
    /// Characters that fit on one rendered line of the field.
    pub chars_per_line: usize,
    /// Second-line length above which the collapsed view gets an ellipsis.
    pub ellipsis_threshold: usize,
    /// Lines shown before the panel is considered long.
    pub line_budget: usize,
    /// Characters kept of a line cut short in the collapsed view. `None` keeps lines whole.
    #[serde(default)]
    pub truncate_at: Option<usize>,
}

impl PanelProfile {
    /// The wide document description field.
    pub const DOCUMENT_DESCRIPTION: Self = Self {
        chars_per_line: 80,
        ellipsis_threshold: 50,
        line_budget: 2,
        truncate_at: None,
    };

    /// The narrow description field of a resource in the side panel.
    pub const RESOURCE_DESCRIPTION: Self = Self {
        chars_per_line: 35,
        ellipsis_threshold: 50,
        line_budget: 2,
        truncate_at: Some(47),
    };

    pub fn exceeds_budget(&self, text: &str) -> bool {
        estimate_visual_lines(text, self.chars_per_line) > self.line_budget
    }

    pub fn collapsed_view(&self, text: &str) -> String {
        collapsed_view(text, self.ellipsis_threshold, self.truncate_at)
    }
}

impl Default for PanelProfile {
    fn default() -> Self {
        Self::RESOURCE_DESCRIPTION
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelState {
    Expanded,
    Collapsed { saved_full_text: String },
}

/// What an edit of the visible value means for the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The panel is expanded; the edit is an ordinary edit.
    Passthrough,
    /// Collapsed and the visible value still equals the collapsed view: nothing was typed.
    Unchanged,
    /// The user typed into the collapsed view. The panel expanded and `restored` must
    /// replace the visible value before the edit is processed any further.
    Expanded { restored: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    profile: PanelProfile,
    state: PanelState,
}

impl Panel {
    pub fn new(profile: PanelProfile) -> Self {
        Self {
            profile,
            state: PanelState::Expanded,
        }
    }

    pub fn profile(&self) -> PanelProfile {
        self.profile
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self.state, PanelState::Collapsed { .. })
    }

    pub fn saved_full_text(&self) -> Option<&str> {
        match &self.state {
            PanelState::Collapsed { saved_full_text } => Some(saved_full_text),
            PanelState::Expanded => None,
        }
    }

    /// The text the field really holds: the saved text while collapsed, else `visible`.
    pub fn full_text<'a>(&'a self, visible: &'a str) -> &'a str {
        self.saved_full_text().unwrap_or(visible)
    }

    /// The value the field must show while collapsed.
    pub fn visible_value(&self) -> Option<String> {
        self.saved_full_text()
            .map(|text| self.profile.collapsed_view(text))
    }

    /// Saves `current` and returns the collapsed view to show.
    ///
    /// Returns `None` (and changes nothing) when already collapsed.
    pub fn collapse(&mut self, current: &str) -> Option<String> {
        if self.is_collapsed() {
            return None;
        }
        let view = self.profile.collapsed_view(current);
        self.state = PanelState::Collapsed {
            saved_full_text: current.to_owned(),
        };
        Some(view)
    }

    /// Returns the saved text to restore. `None` when already expanded.
    pub fn expand(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, PanelState::Expanded) {
            PanelState::Collapsed { saved_full_text } => Some(saved_full_text),
            PanelState::Expanded => None,
        }
    }

    /// Flips the state and returns the value the field must show afterwards.
    pub fn toggle(&mut self, current: &str) -> String {
        match self.expand() {
            Some(restored) => restored,
            None => self.collapse(current).unwrap_or_else(|| current.to_owned()),
        }
    }

    /// Interprets a change of the visible value.
    pub fn on_edit(&mut self, visible: &str) -> EditOutcome {
        let Some(expected) = self.visible_value() else {
            return EditOutcome::Passthrough;
        };
        if visible == expected {
            return EditOutcome::Unchanged;
        }
        match self.expand() {
            Some(restored) => EditOutcome::Expanded { restored },
            None => EditOutcome::Passthrough,
        }
    }
}

/// Panels of the currently bound fields, keyed by field node.
#[derive(Debug, Default)]
pub struct PanelSet {
    panels: AHashMap<NodeId, Panel>,
}

impl PanelSet {
    pub fn get(&self, node: NodeId) -> Option<&Panel> {
        self.panels.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Panel> {
        self.panels.get_mut(&node)
    }

    /// Returns the panel for `node`, and whether it was created by this call.
    pub fn ensure(&mut self, node: NodeId, profile: PanelProfile) -> (&mut Panel, bool) {
        let mut created = false;
        let panel = self.panels.entry(node).or_insert_with(|| {
            created = true;
            Panel::new(profile)
        });
        (panel, created)
    }

    /// Drops panels whose field no longer exists. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.panels.len();
        self.panels.retain(|&node, _| keep(node));
        before - self.panels.len()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

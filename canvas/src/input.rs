//! Input model: active tool, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Modifiers` and `Button` capture the user's intent at the time of a
//! pointer event. `InputState` is the gesture being tracked between
//! pointer-down and pointer-up; a drag carries its [`Interaction`] so every
//! move recomputes from the captured baseline.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{FieldId, FieldKind};
use crate::resize::Interaction;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Modifier that turns a wheel event into a zoom.
    #[must_use]
    pub fn zoom(self) -> bool {
        self.ctrl || self.meta
    }

    /// Modifier that makes a click toggle selection membership.
    #[must_use]
    pub fn additive(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Whether this button with `modifiers` enters pan mode.
    #[must_use]
    pub fn pans(self, modifiers: Modifiers) -> bool {
        match self {
            Self::Middle => true,
            Self::Primary => modifiers.alt,
            Self::Secondary => false,
        }
    }
}

/// A keyboard key as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.0 == "Delete" || self.0 == "Backspace"
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the host.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Field kind placed by the next click, if a tool is armed.
    pub tool: Option<FieldKind>,
    /// Selected fields, in selection order.
    pub selection: Vec<FieldId>,
}

impl UiState {
    #[must_use]
    pub fn is_selected(&self, id: &FieldId) -> bool {
        self.selection.contains(id)
    }

    /// Replace the selection with `id`, or toggle its membership when `additive`.
    pub fn select(&mut self, id: FieldId, additive: bool) {
        if !additive {
            self.selection.clear();
            self.selection.push(id);
        } else if let Some(idx) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(idx);
        } else {
            self.selection.push(id);
        }
    }

    /// Drop `id` from the selection. Returns true if it was selected.
    pub fn deselect(&mut self, id: &FieldId) -> bool {
        let before = self.selection.len();
        self.selection.retain(|s| s != id);
        self.selection.len() != before
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The viewport is being panned. Placement and drags are suppressed.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// A field is being moved or resized.
    Dragging {
        /// Id of the field under the pointer.
        id: FieldId,
        /// Baseline and mode captured at pointer-down.
        interaction: Interaction,
    },
}

impl InputState {
    #[must_use]
    pub fn is_panning(&self) -> bool {
        matches!(self, Self::Panning { .. })
    }
}

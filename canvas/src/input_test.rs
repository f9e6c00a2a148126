use uuid::Uuid;

use super::*;
use crate::camera::Rect;
use crate::resize::{DragMode, SizeLimits};
use crate::camera::Size;

// =============================================================
// Modifiers
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift);
    assert!(!m.ctrl);
    assert!(!m.alt);
    assert!(!m.meta);
}

#[test]
fn zoom_modifier_is_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.zoom());
    assert!(Modifiers { meta: true, ..Default::default() }.zoom());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.zoom());
}

#[test]
fn additive_modifier_includes_shift() {
    assert!(Modifiers { shift: true, ..Default::default() }.additive());
    assert!(!Modifiers { alt: true, ..Default::default() }.additive());
}

// =============================================================
// Button
// =============================================================

#[test]
fn middle_button_always_pans() {
    assert!(Button::Middle.pans(Modifiers::default()));
}

#[test]
fn primary_pans_only_with_alt() {
    assert!(!Button::Primary.pans(Modifiers::default()));
    assert!(Button::Primary.pans(Modifiers { alt: true, ..Default::default() }));
}

#[test]
fn secondary_never_pans() {
    assert!(!Button::Secondary.pans(Modifiers { alt: true, ..Default::default() }));
}

// =============================================================
// Key
// =============================================================

#[test]
fn delete_and_backspace_are_delete_keys() {
    assert!(Key("Delete".into()).is_delete());
    assert!(Key("Backspace".into()).is_delete());
    assert!(!Key("d".into()).is_delete());
}

#[test]
fn escape_key() {
    assert!(Key("Escape".into()).is_escape());
    assert!(!Key("Esc".into()).is_escape());
}

// =============================================================
// UiState
// =============================================================

#[test]
fn ui_state_default_has_no_tool_and_empty_selection() {
    let ui = UiState::default();
    assert!(ui.tool.is_none());
    assert!(ui.selection.is_empty());
}

#[test]
fn single_select_replaces_selection() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState::default();
    ui.select(a, false);
    ui.select(b, false);
    assert_eq!(ui.selection, vec![b]);
}

#[test]
fn additive_select_toggles_membership() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState::default();
    ui.select(a, false);
    ui.select(b, true);
    assert_eq!(ui.selection, vec![a, b]);
    ui.select(a, true);
    assert_eq!(ui.selection, vec![b]);
}

#[test]
fn deselect_reports_membership() {
    let a = Uuid::new_v4();
    let mut ui = UiState::default();
    ui.select(a, false);
    assert!(ui.deselect(&a));
    assert!(!ui.deselect(&a));
    assert!(!ui.is_selected(&a));
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert!(matches!(InputState::default(), InputState::Idle));
}

#[test]
fn panning_is_reported() {
    let s = InputState::Panning { last_screen: Point::new(1.0, 2.0) };
    assert!(s.is_panning());
}

#[test]
fn dragging_carries_interaction() {
    let limits = SizeLimits::new(Size::new(1.0, 1.0), Size::new(100.0, 100.0));
    let s = InputState::Dragging {
        id: Uuid::new_v4(),
        interaction: Interaction::begin(Point::default(), Rect::new(0.0, 0.0, 10.0, 10.0), DragMode::Move, limits),
    };
    assert!(!s.is_panning());
    let InputState::Dragging { interaction, .. } = s else {
        panic!("expected Dragging");
    };
    assert_eq!(interaction.mode(), DragMode::Move);
}

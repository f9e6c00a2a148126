//! Canvas controller: owns the fields, the viewport, and the gesture state.
//!
//! The host feeds raw pointer, wheel and key events into [`CanvasController`]
//! and receives [`Action`]s describing what changed. Nothing here touches a
//! DOM or a network; persistence is the host's job.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Point, Rect, snap_point};
use crate::consts::{DEFAULT_GRID_SIZE, ZOOM_WHEEL_BASE};
use crate::doc::{ContractId, Field, FieldId, FieldKind, FieldRecord, FieldStore, PartialField};
use crate::hit::{HitPart, hit_test};
use crate::input::{Button, InputState, Key, Modifiers, UiState, WheelDelta};
use crate::resize::{DragMode, Interaction, SizeLimits};

/// What kind of document the fields are placed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Pdf,
    Image,
    Html,
}

impl DocumentKind {
    /// Infer the kind from an uploaded file's MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            "application/pdf" => Some(Self::Pdf),
            "text/html" => Some(Self::Html),
            m if m.starts_with("image/") => Some(Self::Image),
            _ => None,
        }
    }

    /// Whether the surface spans several pages.
    #[must_use]
    pub fn is_paged(self) -> bool {
        matches!(self, Self::Pdf | Self::Html)
    }
}

/// Per-surface configuration supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    pub document_kind: DocumentKind,
    /// Snap placement and move to the grid.
    pub snap_to_grid: bool,
    /// Grid pitch in document units.
    pub grid_size: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { document_kind: DocumentKind::default(), snap_to_grid: false, grid_size: DEFAULT_GRID_SIZE }
    }
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FieldCreated(Field),
    FieldUpdated { id: FieldId, fields: PartialField },
    FieldDeleted { id: FieldId },
    SelectionChanged(Vec<FieldId>),
    SetCursor(String),
    RenderNeeded,
}

/// Field-placement surface: field collection, active tool, selection, and
/// the gesture in progress.
#[derive(Debug, Default)]
pub struct CanvasController {
    pub fields: FieldStore,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub config: CanvasConfig,
}

impl CanvasController {
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self { config, ..Self::default() }
    }

    // --- Data inputs ---

    /// Replace the field collection with a saved list.
    pub fn load_fields(&mut self, fields: Vec<Field>) {
        self.fields.load_snapshot(fields);
        self.ui.selection.clear();
        self.input = InputState::Idle;
    }

    /// Replace the field collection from persisted rows.
    pub fn load_records(&mut self, records: &[FieldRecord]) {
        self.load_fields(records.iter().map(Field::from_record).collect());
    }

    /// Persisted rows for every field, in placement order.
    #[must_use]
    pub fn records(&self, contract_id: ContractId) -> Vec<FieldRecord> {
        self.fields.records(contract_id)
    }

    // --- Tool / field operations ---

    /// Arm (or disarm) the placement tool.
    pub fn set_tool(&mut self, tool: Option<FieldKind>) -> Vec<Action> {
        self.ui.tool = tool;
        let cursor = if tool.is_some() { "crosshair" } else { "default" };
        vec![Action::SetCursor(cursor.into())]
    }

    /// Place a field of `kind` at a screen point.
    ///
    /// Requires an armed tool and consumes it: one placement per activation.
    /// Suppressed while panning.
    pub fn place_field(&mut self, kind: FieldKind, screen: Point) -> Vec<Action> {
        if self.ui.tool.is_none() || self.input.is_panning() {
            return Vec::new();
        }
        let mut doc_pt = self.camera.screen_to_document(screen);
        if self.config.snap_to_grid {
            doc_pt = snap_point(doc_pt, self.config.grid_size);
        }
        let field = Field::new(kind, doc_pt);
        self.fields.insert(field.clone());
        self.ui.tool = None;
        vec![Action::FieldCreated(field), Action::SetCursor("default".into()), Action::RenderNeeded]
    }

    /// Merge a partial update into a field. A missing id is a no-op.
    pub fn update_field(&mut self, id: &FieldId, partial: &PartialField) -> Vec<Action> {
        if !self.fields.apply_partial(id, partial) {
            return Vec::new();
        }
        vec![Action::FieldUpdated { id: *id, fields: partial.clone() }, Action::RenderNeeded]
    }

    /// Remove a field. A missing id is a no-op.
    pub fn delete_field(&mut self, id: &FieldId) -> Vec<Action> {
        if self.fields.remove(id).is_none() {
            return Vec::new();
        }
        if matches!(&self.input, InputState::Dragging { id: dragged, .. } if dragged == id) {
            self.input = InputState::Idle;
        }
        let mut actions = vec![Action::FieldDeleted { id: *id }];
        if self.ui.deselect(id) {
            actions.push(Action::SelectionChanged(self.ui.selection.clone()));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Select a field. Single selection replaces the set; additive toggles.
    pub fn select_field(&mut self, id: FieldId, additive: bool) -> Vec<Action> {
        if self.fields.get(&id).is_none() {
            return Vec::new();
        }
        self.ui.select(id, additive);
        vec![Action::SelectionChanged(self.ui.selection.clone()), Action::RenderNeeded]
    }

    /// Empty the selection.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.ui.selection.is_empty() {
            return Vec::new();
        }
        self.ui.selection.clear();
        vec![Action::SelectionChanged(Vec::new()), Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &[FieldId] {
        &self.ui.selection
    }

    #[must_use]
    pub fn tool(&self) -> Option<FieldKind> {
        self.ui.tool
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    #[must_use]
    pub fn document_kind(&self) -> DocumentKind {
        self.config.document_kind
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button.pans(modifiers) {
            if !matches!(self.input, InputState::Idle) {
                return Vec::new();
            }
            self.input = InputState::Panning { last_screen: screen };
            return vec![Action::SetCursor("grabbing".into())];
        }
        if button != Button::Primary || !matches!(self.input, InputState::Idle) {
            return Vec::new();
        }

        if let Some(kind) = self.ui.tool {
            return self.place_field(kind, screen);
        }

        let doc_pt = self.camera.screen_to_document(screen);
        let Some(hit) = hit_test(doc_pt, &self.fields, &self.camera, &self.ui.selection) else {
            return self.clear_selection();
        };
        let Some(field) = self.fields.get(&hit.field_id) else {
            return Vec::new();
        };
        let limits = SizeLimits::new(field.kind.min_size(), field.kind.max_size());
        let start = field.bounds();

        match hit.part {
            HitPart::Handle(dir) => {
                self.input = InputState::Dragging {
                    id: hit.field_id,
                    interaction: Interaction::begin(doc_pt, start, DragMode::Resize(dir), limits),
                };
                vec![Action::SetCursor(dir.cursor().into())]
            }
            HitPart::Body => {
                let mut actions = Vec::new();
                if modifiers.additive() {
                    actions.extend(self.select_field(hit.field_id, true));
                    if !self.ui.is_selected(&hit.field_id) {
                        return actions;
                    }
                } else if !self.ui.is_selected(&hit.field_id) {
                    actions.extend(self.select_field(hit.field_id, false));
                }
                self.input = InputState::Dragging {
                    id: hit.field_id,
                    interaction: self.move_interaction(doc_pt, start, limits),
                };
                actions.push(Action::SetCursor("move".into()));
                actions
            }
        }
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        if matches!(self.input, InputState::Idle) {
            return vec![Action::SetCursor(self.hover_cursor(screen).into())];
        }
        match &mut self.input {
            InputState::Panning { last_screen } => {
                self.camera.pan_by(screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                vec![Action::RenderNeeded]
            }
            InputState::Dragging { id, interaction } => {
                let doc_pt = self.camera.screen_to_document(screen);
                let rect = interaction.update(doc_pt);
                self.fields.apply_partial(id, &PartialField::geometry(rect));
                vec![Action::RenderNeeded]
            }
            InputState::Idle => Vec::new(),
        }
    }

    /// Finish the gesture. A drag commits one `FieldUpdated` if the geometry
    /// differs from where it started; only the primary button ends a drag.
    pub fn on_pointer_up(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if matches!(self.input, InputState::Dragging { .. }) {
            if button != Button::Primary {
                return Vec::new();
            }
            self.on_pointer_move(screen, modifiers);
        }
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => vec![Action::SetCursor("default".into())],
            InputState::Dragging { id, interaction } => {
                let mut actions = Vec::new();
                if let Some(field) = self.fields.get(&id) {
                    let end = field.bounds();
                    if end != interaction.start() {
                        actions.push(Action::FieldUpdated { id, fields: PartialField::geometry(end) });
                    }
                }
                actions.push(Action::SetCursor("default".into()));
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    /// Zoom about the pointer when the zoom modifier is held; otherwise the
    /// event is left for ordinary page scrolling.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if !modifiers.zoom() {
            return Vec::new();
        }
        let zoom = self.camera.zoom * ZOOM_WHEEL_BASE.powf(-delta.dy);
        self.camera.zoom_at(screen, zoom);
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.is_delete() {
            if matches!(self.input, InputState::Dragging { .. }) {
                return Vec::new();
            }
            let ids = self.ui.selection.clone();
            return ids.iter().flat_map(|id| self.delete_field(id)).collect();
        }
        if key.is_escape() {
            return self.cancel();
        }
        Vec::new()
    }

    /// Abort the current gesture, disarm the tool and clear the selection.
    /// A cancelled drag restores the starting geometry and commits nothing.
    pub fn cancel(&mut self) -> Vec<Action> {
        if let InputState::Dragging { id, interaction } = std::mem::take(&mut self.input) {
            self.fields.apply_partial(&id, &PartialField::geometry(interaction.start()));
        }
        self.ui.tool = None;
        let mut actions = self.clear_selection();
        actions.push(Action::SetCursor("default".into()));
        if !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    fn move_interaction(&self, doc_pt: Point, start: Rect, limits: SizeLimits) -> Interaction {
        let interaction = Interaction::begin(doc_pt, start, DragMode::Move, limits);
        if self.config.snap_to_grid { interaction.snap_to(self.config.grid_size) } else { interaction }
    }

    fn hover_cursor(&self, screen: Point) -> &'static str {
        if self.ui.tool.is_some() {
            return "crosshair";
        }
        let doc_pt = self.camera.screen_to_document(screen);
        match hit_test(doc_pt, &self.fields, &self.camera, &self.ui.selection) {
            Some(hit) => match hit.part {
                HitPart::Handle(dir) => dir.cursor(),
                HitPart::Body => "move",
            },
            None => "default",
        }
    }
}

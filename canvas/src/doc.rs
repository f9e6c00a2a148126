//! Field model: placed fields, their kinds and invariants, and the in-memory store.
//!
//! This module defines what sits on the document surface (`Field`,
//! `FieldKind`), a sparse-update type for incremental edits (`PartialField`),
//! the persistence wire shape (`FieldRecord`), and the runtime store that owns
//! every live field until the host saves it (`FieldStore`).
//!
//! All geometry here is in document space. Nothing in this module knows about
//! zoom or pan.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Point, Rect, Size};
use crate::consts::{MAX_FIELD_HEIGHT, MAX_FIELD_WIDTH};

/// Unique identifier for a placed field.
pub type FieldId = Uuid;

/// Identifier of the signer/client a field belongs to.
pub type ClientId = Uuid;

/// Identifier of the contract a field list is saved against.
pub type ContractId = Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("{kind} field must be at least {min_width}x{min_height}, got {width}x{height}")]
    BelowMinimumSize { kind: FieldKind, min_width: f64, min_height: f64, width: f64, height: f64 },
    #[error("field position must be non-negative, got ({x}, {y})")]
    NegativePosition { x: f64, y: f64 },
    #[error("field geometry must be finite")]
    NonFinite,
    #[error("minLength {min} exceeds maxLength {max}")]
    InvalidLengthRange { min: usize, max: usize },
    #[error("invalid validation pattern: {0}")]
    InvalidPattern(String),
    #[error("value is required")]
    Required,
    #[error("value shorter than {min} characters")]
    TooShort { min: usize },
    #[error("value longer than {max} characters")]
    TooLong { max: usize },
    #[error("value does not match pattern")]
    PatternMismatch,
}

/// The closed set of field kinds a sender can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free-form text entry.
    Text,
    /// Typed or drawn signature.
    Signature,
    /// Date entry.
    Date,
    /// Single checkbox.
    Checkbox,
    /// Signer's printed name.
    Name,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [Self::Text, Self::Signature, Self::Date, Self::Checkbox, Self::Name];

    /// Wire name, as stored in `field_type`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Signature => "signature",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Name => "name",
        }
    }

    /// Inverse of [`FieldKind::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Toolbar label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Signature => "Signature",
            Self::Date => "Date",
            Self::Checkbox => "Checkbox",
            Self::Name => "Full name",
        }
    }

    /// Smallest size a field of this kind may shrink to.
    #[must_use]
    pub fn min_size(self) -> Size {
        match self {
            Self::Text | Self::Name => Size::new(80.0, 24.0),
            Self::Signature => Size::new(120.0, 40.0),
            Self::Date => Size::new(80.0, 24.0),
            Self::Checkbox => Size::new(16.0, 16.0),
        }
    }

    /// Largest size a field of this kind may grow to.
    #[must_use]
    pub fn max_size(self) -> Size {
        match self {
            Self::Checkbox => Size::new(64.0, 64.0),
            _ => Size::new(MAX_FIELD_WIDTH, MAX_FIELD_HEIGHT),
        }
    }

    /// Size a freshly placed field starts with.
    #[must_use]
    pub fn default_size(self) -> Size {
        match self {
            Self::Text => Size::new(200.0, 32.0),
            Self::Signature => Size::new(200.0, 60.0),
            Self::Date => Size::new(120.0, 32.0),
            Self::Checkbox => Size::new(24.0, 24.0),
            Self::Name => Size::new(180.0, 32.0),
        }
    }

    /// Whether a new field of this kind is required by default.
    #[must_use]
    pub fn required_by_default(self) -> bool {
        matches!(self, Self::Signature | Self::Name)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input constraints a signer's value must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl FieldValidation {
    /// Check that the rules are self-consistent.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_length > max_length` or the pattern does not compile.
    pub fn validate(&self) -> Result<(), FieldError> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(FieldError::InvalidLengthRange { min, max });
            }
        }
        if let Some(pattern) = &self.pattern {
            compiled_pattern(pattern)?;
        }
        Ok(())
    }

    /// Check a signer-supplied value against the rules. Lengths count characters.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn check(&self, value: &str) -> Result<(), FieldError> {
        let len = value.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(FieldError::TooShort { min });
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(FieldError::TooLong { max });
            }
        }
        if let Some(pattern) = &self.pattern {
            let re = compiled_pattern(pattern)?;
            if !re.is_match(value) {
                return Err(FieldError::PatternMismatch);
            }
        }
        Ok(())
    }
}

/// Compile `pattern` once per process; later lookups clone the cached regex.
fn compiled_pattern(pattern: &str) -> Result<Regex, FieldError> {
    static CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    let mut cache = CACHE.get_or_init(Mutex::default).lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern).map_err(|e| FieldError::InvalidPattern(e.to_string()))?;
    cache.insert(pattern.to_owned(), re.clone());
    Ok(re)
}

/// Presentation overrides for a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

/// A field placed on the document surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique identifier for this field.
    pub id: FieldId,
    /// What the signer is asked to provide.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Top-left corner in document space.
    pub position: Point,
    /// Width/height in document units.
    pub size: Size,
    /// Signer this field is assigned to, if any.
    #[serde(default)]
    pub owner_id: Option<ClientId>,
    /// Display/label name.
    pub name: String,
    /// Whether the signer must fill the field.
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<FieldStyling>,
}

impl Field {
    /// Create a field of `kind` at `position` with the kind's default size.
    #[must_use]
    pub fn new(kind: FieldKind, position: Point) -> Self {
        let mut field = Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: kind.default_size(),
            owner_id: None,
            name: kind.as_str().to_owned(),
            required: kind.required_by_default(),
            placeholder: None,
            validation: None,
            styling: None,
        };
        field.clamp_geometry();
        field
    }

    /// Bounding rectangle in document space.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    /// Replace position and size, then re-establish the geometry invariants.
    pub fn set_bounds(&mut self, rect: Rect) {
        self.position = rect.origin();
        self.size = rect.size();
        self.clamp_geometry();
    }

    /// Force geometry back inside the invariants: non-negative position and a
    /// size within the kind's `[min, max]` range. Non-finite values reset to
    /// the nearest legal value.
    pub fn clamp_geometry(&mut self) {
        let min = self.kind.min_size();
        let max = self.kind.max_size();
        self.position.x = finite_or(self.position.x, 0.0).max(0.0);
        self.position.y = finite_or(self.position.y, 0.0).max(0.0);
        self.size.width = finite_or(self.size.width, min.width).clamp(min.width, max.width);
        self.size.height = finite_or(self.size.height, min.height).clamp(min.height, max.height);
    }

    /// Check every field invariant without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), FieldError> {
        let finite = [self.position.x, self.position.y, self.size.width, self.size.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(FieldError::NonFinite);
        }
        if self.position.x < 0.0 || self.position.y < 0.0 {
            return Err(FieldError::NegativePosition { x: self.position.x, y: self.position.y });
        }
        let min = self.kind.min_size();
        if self.size.width < min.width || self.size.height < min.height {
            return Err(FieldError::BelowMinimumSize {
                kind: self.kind,
                min_width: min.width,
                min_height: min.height,
                width: self.size.width,
                height: self.size.height,
            });
        }
        if let Some(validation) = &self.validation {
            validation.validate()?;
        }
        Ok(())
    }

    /// Check a signer-supplied value against `required` and the validation rules.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn check_value(&self, value: &str) -> Result<(), FieldError> {
        if value.trim().is_empty() {
            return if self.required { Err(FieldError::Required) } else { Ok(()) };
        }
        match &self.validation {
            Some(validation) => validation.check(value),
            None => Ok(()),
        }
    }

    /// Flatten into the persisted wire shape.
    #[must_use]
    pub fn to_record(&self, contract_id: ContractId) -> FieldRecord {
        FieldRecord {
            contract_id,
            client_id: self.owner_id,
            field_type: self.kind,
            field_name: self.name.clone(),
            position_x: self.position.x,
            position_y: self.position.y,
            width: self.size.width,
            height: self.size.height,
            is_required: self.required,
            placeholder: self.placeholder.clone(),
        }
    }

    /// Rebuild a field from its persisted shape. Records carry no id, so a
    /// fresh one is assigned; geometry is clamped back into the invariants.
    #[must_use]
    pub fn from_record(record: &FieldRecord) -> Self {
        let mut field = Self {
            id: Uuid::new_v4(),
            kind: record.field_type,
            position: Point::new(record.position_x, record.position_y),
            size: Size::new(record.width, record.height),
            owner_id: record.client_id,
            name: record.field_name.clone(),
            required: record.is_required,
            placeholder: record.placeholder.clone(),
            validation: None,
            styling: None,
        };
        field.clamp_geometry();
        field
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Persisted shape of a field row. Other implementations read and write this
/// exact layout, so the key names are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub contract_id: ContractId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub field_type: FieldKind,
    pub field_name: String,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Sparse update for a field. Only present fields are applied.
///
/// The doubly-wrapped options distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Option<ClientId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Option<FieldValidation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styling: Option<Option<FieldStyling>>,
}

impl PartialField {
    /// A geometry-only update carrying the full rectangle.
    #[must_use]
    pub fn geometry(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    /// Whether the update carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// In-memory, insertion-ordered store of fields.
///
/// The canvas owns this collection exclusively until the host saves it.
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    fields: Vec<Field>,
}

impl FieldStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field. A field with the same `id` is replaced in place so no
    /// two fields ever share identity.
    pub fn insert(&mut self, field: Field) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.id == field.id) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    /// Remove a field by id, returning it if it was present.
    pub fn remove(&mut self, id: &FieldId) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.id == *id)?;
        Some(self.fields.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == *id)
    }

    /// Apply a partial update. Geometry is re-clamped afterwards.
    /// Returns false if the field doesn't exist.
    pub fn apply_partial(&mut self, id: &FieldId, partial: &PartialField) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.id == *id) else {
            return false;
        };
        if let Some(x) = partial.x {
            field.position.x = x;
        }
        if let Some(y) = partial.y {
            field.position.y = y;
        }
        if let Some(w) = partial.width {
            field.size.width = w;
        }
        if let Some(h) = partial.height {
            field.size.height = h;
        }
        if let Some(owner) = partial.owner_id {
            field.owner_id = owner;
        }
        if let Some(name) = &partial.name {
            field.name.clone_from(name);
        }
        if let Some(required) = partial.required {
            field.required = required;
        }
        if let Some(placeholder) = &partial.placeholder {
            field.placeholder.clone_from(placeholder);
        }
        if let Some(validation) = &partial.validation {
            field.validation.clone_from(validation);
        }
        if let Some(styling) = &partial.styling {
            field.styling.clone_from(styling);
        }
        field.clamp_geometry();
        true
    }

    /// Replace all fields with a saved snapshot.
    pub fn load_snapshot(&mut self, fields: Vec<Field>) {
        self.fields.clear();
        for field in fields {
            self.insert(field);
        }
    }

    /// Fields in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Topmost field (last placed) whose bounds contain `p`.
    #[must_use]
    pub fn topmost_at(&self, p: Point) -> Option<&Field> {
        self.fields.iter().rev().find(|f| f.bounds().contains(p))
    }

    /// Persisted rows for every field, in placement order.
    #[must_use]
    pub fn records(&self, contract_id: ContractId) -> Vec<FieldRecord> {
        self.fields.iter().map(|f| f.to_record(contract_id)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

//! Hit-testing of document points against placed fields.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{FieldId, FieldStore};
use crate::resize::ResizeDirection;

/// Which part of a field was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    Handle(ResizeDirection),
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub field_id: FieldId,
    pub part: HitPart,
}

/// Test which field (if any) is under `doc_pt`.
///
/// Handles of selected fields are checked first, topmost field first, so a
/// handle that overlaps a neighbouring field still wins. Handle slop is a
/// fixed screen distance, so it shrinks in document units as zoom grows.
#[must_use]
pub fn hit_test(doc_pt: Point, store: &FieldStore, camera: &Camera, selection: &[FieldId]) -> Option<Hit> {
    let radius = camera.screen_dist_to_document(HANDLE_RADIUS_PX);
    let fields: Vec<_> = store.iter().collect();

    for field in fields.iter().rev().filter(|f| selection.contains(&f.id)) {
        let bounds = field.bounds();
        for dir in ResizeDirection::ALL {
            let handle = dir.handle_point(bounds);
            if (doc_pt.x - handle.x).abs() <= radius && (doc_pt.y - handle.y).abs() <= radius {
                return Some(Hit { field_id: field.id, part: HitPart::Handle(dir) });
            }
        }
    }

    store.topmost_at(doc_pt).map(|f| Hit { field_id: f.id, part: HitPart::Body })
}

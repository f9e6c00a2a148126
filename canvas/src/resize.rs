//! Drag/resize controller for rectangular fields.
//!
//! An [`Interaction`] captures `(start_pointer, start_geometry, mode)` when a
//! drag begins. Every pointer update recomputes the geometry from that fixed
//! baseline, so repeated calls never accumulate rounding error. All points are
//! in document space.

#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use crate::camera::{Point, Rect, Size, snap};

/// One of the eight compass handles around a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeDirection {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeDirection {
    pub const ALL: [ResizeDirection; 8] =
        [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Moves the left edge.
    #[must_use]
    pub fn has_west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Moves the right edge.
    #[must_use]
    pub fn has_east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Moves the top edge.
    #[must_use]
    pub fn has_north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Moves the bottom edge.
    #[must_use]
    pub fn has_south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Handle centre on `rect`.
    #[must_use]
    pub fn handle_point(self, rect: Rect) -> Point {
        let x = if self.has_west() {
            rect.x
        } else if self.has_east() {
            rect.right()
        } else {
            rect.x + rect.width * 0.5
        };
        let y = if self.has_north() {
            rect.y
        } else if self.has_south() {
            rect.bottom()
        } else {
            rect.y + rect.height * 0.5
        };
        Point::new(x, y)
    }

    /// CSS cursor name for this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Nw | Self::Se => "nwse-resize",
        }
    }
}

/// What a drag does to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Translate without changing size.
    Move,
    /// Drag one handle; the opposite edge(s) stay fixed.
    Resize(ResizeDirection),
}

/// Per-field size constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub min: Size,
    pub max: Size,
}

impl SizeLimits {
    #[must_use]
    pub fn new(min: Size, max: Size) -> Self {
        Self { min, max }
    }
}

type MoveCallback = Box<dyn FnMut(Point)>;
type ResizeCallback = Box<dyn FnMut(Rect)>;

/// An in-flight drag or resize of a single field.
pub struct Interaction {
    start_pointer: Point,
    start: Rect,
    mode: DragMode,
    limits: SizeLimits,
    grid: Option<f64>,
    on_move: Option<MoveCallback>,
    on_resize: Option<ResizeCallback>,
}

impl std::fmt::Debug for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interaction")
            .field("start_pointer", &self.start_pointer)
            .field("start", &self.start)
            .field("mode", &self.mode)
            .field("limits", &self.limits)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl Interaction {
    /// Capture the baseline for a drag.
    #[must_use]
    pub fn begin(start_pointer: Point, start: Rect, mode: DragMode, limits: SizeLimits) -> Self {
        Self { start_pointer, start, mode, limits, grid: None, on_move: None, on_resize: None }
    }

    /// Snap moved positions to a grid of `grid_size` document units. Resizes
    /// are never snapped, and a drag that has not moved keeps its start.
    #[must_use]
    pub fn snap_to(mut self, grid_size: f64) -> Self {
        self.grid = Some(grid_size);
        self
    }

    /// Register a callback fired with the new position on every move update.
    #[must_use]
    pub fn on_move(mut self, callback: impl FnMut(Point) + 'static) -> Self {
        self.on_move = Some(Box::new(callback));
        self
    }

    /// Register a callback fired with the new geometry on every resize update.
    #[must_use]
    pub fn on_resize(mut self, callback: impl FnMut(Rect) + 'static) -> Self {
        self.on_resize = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn mode(&self) -> DragMode {
        self.mode
    }

    /// Geometry at the moment the drag began.
    #[must_use]
    pub fn start(&self) -> Rect {
        self.start
    }

    /// Geometry for the pointer at `current`, computed from the baseline.
    #[must_use]
    pub fn compute(&self, current: Point) -> Rect {
        let dx = current.x - self.start_pointer.x;
        let dy = current.y - self.start_pointer.y;
        match self.mode {
            DragMode::Move if dx == 0.0 && dy == 0.0 => self.start,
            DragMode::Move => {
                let mut rect = move_rect(self.start, dx, dy);
                if let Some(grid) = self.grid {
                    rect.x = snap(rect.x, grid);
                    rect.y = snap(rect.y, grid);
                }
                rect
            }
            DragMode::Resize(dir) => resize_rect(self.start, dir, dx, dy, self.limits),
        }
    }

    /// Compute the geometry for `current` and fire the matching callback
    /// synchronously.
    pub fn update(&mut self, current: Point) -> Rect {
        let rect = self.compute(current);
        match self.mode {
            DragMode::Move => {
                if let Some(cb) = self.on_move.as_mut() {
                    cb(rect.origin());
                }
            }
            DragMode::Resize(_) => {
                if let Some(cb) = self.on_resize.as_mut() {
                    cb(rect);
                }
            }
        }
        rect
    }
}

/// Translate `start` by `(dx, dy)`, keeping the origin non-negative.
#[must_use]
pub fn move_rect(start: Rect, dx: f64, dy: f64) -> Rect {
    Rect::new((start.x + dx).max(0.0), (start.y + dy).max(0.0), start.width, start.height)
}

/// Resize `start` by dragging the `dir` handle by `(dx, dy)`.
///
/// Each dimension is clamped to `limits`. When the left or top edge moves the
/// position shifts so the opposite edge stays fixed; that edge also caps the
/// dimension so the origin never goes negative.
#[must_use]
pub fn resize_rect(start: Rect, dir: ResizeDirection, dx: f64, dy: f64, limits: SizeLimits) -> Rect {
    let mut out = start;

    if dir.has_east() {
        out.width = clamp_dim(start.width + dx, limits.min.width, limits.max.width);
    } else if dir.has_west() {
        let right = start.right();
        let max = limits.max.width.min(right.max(limits.min.width));
        out.width = clamp_dim(start.width - dx, limits.min.width, max);
        out.x = (right - out.width).max(0.0);
    }

    if dir.has_south() {
        out.height = clamp_dim(start.height + dy, limits.min.height, limits.max.height);
    } else if dir.has_north() {
        let bottom = start.bottom();
        let max = limits.max.height.min(bottom.max(limits.min.height));
        out.height = clamp_dim(start.height - dy, limits.min.height, max);
        out.y = (bottom - out.height).max(0.0);
    }

    out
}

fn clamp_dim(value: f64, min: f64, max: f64) -> f64 {
    let max = max.max(min);
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom factor the viewport accepts.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor the viewport accepts.
pub const MAX_ZOOM: f64 = 3.0;

/// Multiplicative zoom step per wheel pixel (`zoom *= ZOOM_WHEEL_BASE^-dy`).
pub const ZOOM_WHEEL_BASE: f64 = 1.0015;

// ── Grid ────────────────────────────────────────────────────────

/// Default snap grid pitch in document units.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

// ── Field geometry ──────────────────────────────────────────────

/// Upper bound on a field's width in document units.
pub const MAX_FIELD_WIDTH: f64 = 800.0;

/// Upper bound on a field's height in document units.
pub const MAX_FIELD_HEIGHT: f64 = 400.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for resize handles.
pub const HANDLE_RADIUS_PX: f64 = 6.0;

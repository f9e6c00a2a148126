//! Splits a rich-text HTML stream into fixed-size printable pages.
//!
//! The editor emits a flat sequence of block-level HTML. This crate parses
//! that stream into top-level blocks, measures accumulated content against
//! the page's content-height budget, and closes a page whenever the next
//! block would overflow it. Measurement is delegated to a [`MeasureSurface`]
//! so the host can plug in a real layout engine; [`EstimatingSurface`] is a
//! deterministic fallback.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Page geometry and typography |
//! | [`blocks`] | Top-level block parsing |
//! | [`measure`] | The measurement capability and its implementations |
//! | [`engine`] | The splitting algorithm and [`Page`] output |
//! | [`debounce`] | Debounced recomputation on content change |

pub mod blocks;
pub mod debounce;
pub mod engine;
pub mod layout;
pub mod measure;

pub use engine::{Page, Paginator, paginate};
pub use layout::{PageLayout, Typography};
pub use measure::{EstimatingSurface, FixedHeights, MeasureError, MeasureSurface};

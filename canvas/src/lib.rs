//! Field-placement canvas for document signing.
//!
//! This crate owns everything that happens while a sender positions fields
//! over a document: translating raw pointer, wheel and key events into field
//! mutations, keeping the viewport's pan/zoom, hit-testing fields and their
//! resize handles, and computing drag/resize geometry. The host is responsible
//! only for wiring input events to the controller, drawing the result, and
//! persisting the resulting [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::CanvasController`] and the actions it emits |
//! | [`doc`] | Field model, persistence records, and the in-memory store |
//! | [`camera`] | Screen/document transform, zoom clamping, grid snapping |
//! | [`resize`] | Move/resize interaction computed from a fixed baseline |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against fields and their handles |
//! | [`consts`] | Shared numeric constants (zoom limits, grid, handle slop) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod resize;

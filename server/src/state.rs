//! Shared application state.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the signing workflow, which owns the store and notifier.

use std::sync::Arc;

use crate::services::signing::SigningWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<SigningWorkflow>,
}

impl AppState {
    #[must_use]
    pub fn new(workflow: SigningWorkflow) -> Self {
        Self { workflow: Arc::new(workflow) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

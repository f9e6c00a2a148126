//! Splitting algorithm: HTML stream in, page-sized chunks out.
//!
//! Blocks are appended to the current page one at a time. Each tentative
//! append is measured; if the page would overflow its budget and already
//! holds something, the page is closed and the block starts the next one.
//! A block taller than the budget on its own occupies a page by itself and
//! is never split. The whole computation is a pure function of the input, so
//! running it twice yields identical page boundaries.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Serialize;
use tracing::{debug, warn};

use crate::blocks::split_blocks;
use crate::layout::PageLayout;
use crate::measure::{MeasureError, MeasureSurface};

/// One printable page of content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Stable identifier derived from position (`page-1`, `page-2`, ...).
    pub id: String,
    /// Zero-based position in the page sequence.
    pub index: usize,
    /// Top-level blocks rendered on this page, in order.
    pub content_chunk: Vec<String>,
    /// Rendered height of `content_chunk`, or `None` if it could not be measured.
    pub measured_height: Option<f64>,
}

impl Page {
    fn new(index: usize, content_chunk: Vec<String>, measured_height: Option<f64>) -> Self {
        Self { id: format!("page-{}", index + 1), index, content_chunk, measured_height }
    }

    /// The page's blocks concatenated back into markup.
    #[must_use]
    pub fn html(&self) -> String {
        self.content_chunk.concat()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content_chunk.is_empty()
    }
}

/// A page layout bound to a measurement surface.
#[derive(Debug, Clone)]
pub struct Paginator<S> {
    layout: PageLayout,
    surface: S,
}

impl<S: MeasureSurface> Paginator<S> {
    #[must_use]
    pub fn new(layout: PageLayout, surface: S) -> Self {
        Self { layout, surface }
    }

    #[must_use]
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Paginate an HTML stream.
    #[must_use]
    pub fn paginate(&self, html: &str) -> Vec<Page> {
        paginate(html, &self.layout, &self.surface)
    }
}

/// Split `html` into pages that each fit `layout.budget()`.
///
/// Empty input yields exactly one empty page. If the surface cannot measure,
/// all content is returned as a single unmeasured page.
#[must_use]
pub fn paginate<S: MeasureSurface + ?Sized>(html: &str, layout: &PageLayout, surface: &S) -> Vec<Page> {
    let blocks = split_blocks(html);
    if blocks.is_empty() {
        return vec![Page::new(0, Vec::new(), Some(0.0))];
    }
    let block_count = blocks.len();
    match split_pages(&blocks, layout.budget(), surface) {
        Ok(pages) => {
            debug!(blocks = block_count, pages = pages.len(), budget = layout.budget(), "paginated");
            pages
        }
        Err(err) => {
            warn!(error = %err, blocks = block_count, "measurement unavailable; returning one unmeasured page");
            vec![Page::new(0, blocks, None)]
        }
    }
}

/// Greedy split of pre-parsed `blocks` against `budget`.
///
/// # Errors
///
/// Returns the first [`MeasureError`] from the surface, or
/// [`MeasureError::InvalidHeight`] if it reports a negative or non-finite height.
pub fn split_pages<S: MeasureSurface + ?Sized>(
    blocks: &[String],
    budget: f64,
    surface: &S,
) -> Result<Vec<Page>, MeasureError> {
    let mut pages = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_height = 0.0;

    for block in blocks {
        current.push(block.clone());
        let tentative = measure(surface, &current)?;
        if tentative > budget && current.len() > 1 {
            current.pop();
            let index = pages.len();
            pages.push(Page::new(index, std::mem::take(&mut current), Some(current_height)));
            current.push(block.clone());
            current_height = measure(surface, &current)?;
        } else {
            current_height = tentative;
        }
    }

    if !current.is_empty() || pages.is_empty() {
        let index = pages.len();
        pages.push(Page::new(index, current, Some(current_height)));
    }
    Ok(pages)
}

fn measure<S: MeasureSurface + ?Sized>(surface: &S, blocks: &[String]) -> Result<f64, MeasureError> {
    let height = surface.measure(blocks)?;
    if !height.is_finite() || height < 0.0 {
        return Err(MeasureError::InvalidHeight(height));
    }
    Ok(height)
}

//! Measurement capability: the rendered height of a run of blocks.
//!
//! DESIGN
//! ======
//! The splitting algorithm never renders anything itself. It asks a
//! [`MeasureSurface`] how tall a candidate page's blocks would be when laid
//! out at the page's width and typography. A browser host backs this with an
//! off-screen element; [`EstimatingSurface`] is a deterministic estimate for
//! server-side use, and [`FixedHeights`] reports canned heights.
//!
//! ERROR HANDLING
//! ==============
//! A surface that cannot measure returns [`MeasureError`]. The engine treats
//! that as "measurement unavailable" and degrades; it never propagates.

#[cfg(test)]
#[path = "measure_test.rs"]
mod measure_test;

use std::collections::HashMap;

use scraper::{ElementRef, Html};

use crate::layout::{PageLayout, Typography};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("measurement surface unavailable: {0}")]
    Unavailable(String),
    #[error("measured height is not a finite non-negative number: {0}")]
    InvalidHeight(f64),
}

/// Something that can lay out blocks and report their rendered height.
pub trait MeasureSurface {
    /// Total rendered height, in pixels, of `blocks` stacked in order.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError`] when the surface cannot measure.
    fn measure(&self, blocks: &[String]) -> Result<f64, MeasureError>;
}

impl<T: MeasureSurface + ?Sized> MeasureSurface for &T {
    fn measure(&self, blocks: &[String]) -> Result<f64, MeasureError> {
        (**self).measure(blocks)
    }
}

impl<T: MeasureSurface + ?Sized> MeasureSurface for std::sync::Arc<T> {
    fn measure(&self, blocks: &[String]) -> Result<f64, MeasureError> {
        (**self).measure(blocks)
    }
}

// =============================================================================
// FIXED HEIGHTS
// =============================================================================

/// Reports a fixed height per block, keyed by the block's markup.
///
/// Blocks without an entry use `default_height`. Heights simply add.
#[derive(Debug, Clone, Default)]
pub struct FixedHeights {
    heights: HashMap<String, f64>,
    default_height: f64,
}

impl FixedHeights {
    /// Every block measures `height`.
    #[must_use]
    pub fn uniform(height: f64) -> Self {
        Self { heights: HashMap::new(), default_height: height }
    }

    /// Give `block` its own height.
    #[must_use]
    pub fn with(mut self, block: impl Into<String>, height: f64) -> Self {
        self.heights.insert(block.into(), height);
        self
    }
}

impl MeasureSurface for FixedHeights {
    fn measure(&self, blocks: &[String]) -> Result<f64, MeasureError> {
        Ok(blocks.iter().map(|b| self.heights.get(b).copied().unwrap_or(self.default_height)).sum())
    }
}

// =============================================================================
// ESTIMATING SURFACE
// =============================================================================

const HEADING_SCALE: [f64; 6] = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67];
const LIST_INDENT_PX: f64 = 40.0;
const TABLE_ROW_PADDING_PX: f64 = 8.0;
const HR_HEIGHT_PX: f64 = 16.0;
const DEFAULT_IMAGE_HEIGHT_PX: f64 = 150.0;

/// Estimates rendered height from text length and typography.
///
/// The estimate is deterministic: identical blocks always measure the same,
/// which keeps pagination idempotent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatingSurface {
    typography: Typography,
    content_width: f64,
}

impl EstimatingSurface {
    #[must_use]
    pub fn new(layout: &PageLayout) -> Self {
        Self { typography: layout.typography, content_width: layout.content_width() }
    }

    /// Estimated height of one block, excluding inter-block spacing.
    #[must_use]
    pub fn block_height(&self, block: &str) -> f64 {
        let fragment = Html::parse_fragment(block);
        let Some(el) = fragment.root_element().children().find_map(ElementRef::wrap) else {
            return self.text_height(block, self.typography.font_size_px, self.content_width, 0);
        };
        self.element_height(el)
    }

    fn element_height(&self, el: ElementRef<'_>) -> f64 {
        let font = self.typography.font_size_px;
        let name = el.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1).clamp(1, 6);
                let size = font * HEADING_SCALE[level - 1];
                self.text_height(&text_of(el), size, self.content_width, count_tag(el, "br"))
            }
            "ul" | "ol" => {
                let width = (self.content_width - LIST_INDENT_PX).max(1.0);
                let items: Vec<_> = el.children().filter_map(ElementRef::wrap).collect();
                if items.is_empty() {
                    return 0.0;
                }
                items.into_iter().map(|li| self.text_height(&text_of(li), font, width, count_tag(li, "br"))).sum()
            }
            "table" => {
                let rows = count_tag(el, "tr").max(1);
                #[allow(clippy::cast_precision_loss)]
                let rows = rows as f64;
                rows * (self.typography.line_height_px() + TABLE_ROW_PADDING_PX)
            }
            "img" => image_height(el),
            "hr" => HR_HEIGHT_PX,
            _ => self.text_height(&text_of(el), font, self.content_width, count_tag(el, "br")),
        }
    }

    /// Height of `text` wrapped at `width` with `font` size, plus explicit breaks.
    #[allow(clippy::cast_precision_loss)]
    fn text_height(&self, text: &str, font: f64, width: f64, breaks: usize) -> f64 {
        let glyph = (font * self.typography.avg_char_width_em).max(f64::EPSILON);
        let per_line = (width / glyph).floor().max(1.0);
        let chars = text.trim().chars().count() as f64;
        let lines = (chars / per_line).ceil().max(1.0) + breaks as f64;
        lines * font * self.typography.line_height
    }
}

impl MeasureSurface for EstimatingSurface {
    fn measure(&self, blocks: &[String]) -> Result<f64, MeasureError> {
        if !self.content_width.is_finite() || self.content_width <= 0.0 {
            return Err(MeasureError::Unavailable("page has no content width".into()));
        }
        let content: f64 = blocks.iter().map(|b| self.block_height(b)).sum();
        #[allow(clippy::cast_precision_loss)]
        let gaps = blocks.len().saturating_sub(1) as f64 * self.typography.block_spacing_px;
        Ok(content + gaps)
    }
}

/// Declared `height` attribute, or the browser's default replaced-element height.
fn image_height(el: ElementRef<'_>) -> f64 {
    let Some(raw) = el.value().attr("height") else {
        return DEFAULT_IMAGE_HEIGHT_PX;
    };
    match raw.trim().trim_end_matches("px").parse::<f64>() {
        Ok(h) if h.is_finite() && h >= 0.0 => h,
        _ => DEFAULT_IMAGE_HEIGHT_PX,
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn count_tag(el: ElementRef<'_>, tag: &str) -> usize {
    el.descendants().filter_map(ElementRef::wrap).filter(|e| e.value().name() == tag).count()
}

//! Page geometry and typography shared by measurement and splitting.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use serde::{Deserialize, Serialize};

/// Font metrics the measurement surface renders with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_size_px: f64,
    /// Multiple of the font size.
    pub line_height: f64,
    /// Average glyph advance as a fraction of the font size.
    pub avg_char_width_em: f64,
    /// Vertical gap between consecutive blocks.
    pub block_spacing_px: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self { font_size_px: 16.0, line_height: 1.5, avg_char_width_em: 0.5, block_spacing_px: 16.0 }
    }
}

impl Typography {
    #[must_use]
    pub fn line_height_px(&self) -> f64 {
        self.font_size_px * self.line_height
    }
}

/// Printable page size and margins in CSS pixels (96 dpi).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub typography: Typography,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::letter()
    }
}

impl PageLayout {
    /// US Letter, one-inch margins.
    #[must_use]
    pub fn letter() -> Self {
        Self {
            page_width: 816.0,
            page_height: 1056.0,
            margin_top: 96.0,
            margin_bottom: 96.0,
            margin_left: 96.0,
            margin_right: 96.0,
            typography: Typography::default(),
        }
    }

    /// ISO A4, one-inch margins.
    #[must_use]
    pub fn a4() -> Self {
        Self { page_width: 794.0, page_height: 1123.0, ..Self::letter() }
    }

    /// Content height available on one page: page height minus vertical margins.
    #[must_use]
    pub fn budget(&self) -> f64 {
        (self.page_height - self.margin_top - self.margin_bottom).max(0.0)
    }

    /// Width a block is laid out in.
    #[must_use]
    pub fn content_width(&self) -> f64 {
        (self.page_width - self.margin_left - self.margin_right).max(0.0)
    }
}

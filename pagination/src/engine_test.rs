#![allow(clippy::float_cmp)]

use proptest::prelude::*;

use super::*;
use crate::measure::{EstimatingSurface, FixedHeights};

struct Unavailable;

impl MeasureSurface for Unavailable {
    fn measure(&self, _blocks: &[String]) -> Result<f64, MeasureError> {
        Err(MeasureError::Unavailable("no layout engine".into()))
    }
}

struct Reports(f64);

impl MeasureSurface for Reports {
    fn measure(&self, _blocks: &[String]) -> Result<f64, MeasureError> {
        Ok(self.0)
    }
}

fn layout_with_budget(budget: f64) -> PageLayout {
    PageLayout { page_height: budget, margin_top: 0.0, margin_bottom: 0.0, ..PageLayout::letter() }
}

fn chunks(pages: &[Page]) -> Vec<Vec<String>> {
    pages.iter().map(|p| p.content_chunk.clone()).collect()
}

// =============================================================
// Splitting
// =============================================================

#[test]
fn three_blocks_of_400_with_900_budget() {
    let html = "<p>1</p><p>2</p><p>3</p>";
    let pages = paginate(html, &layout_with_budget(900.0), &FixedHeights::uniform(400.0));
    assert_eq!(chunks(&pages), vec![vec!["<p>1</p>", "<p>2</p>"], vec!["<p>3</p>"]]);
    assert_eq!(pages[0].measured_height, Some(800.0));
    assert_eq!(pages[1].measured_height, Some(400.0));
}

#[test]
fn exact_fit_stays_on_page() {
    let html = "<p>1</p><p>2</p>";
    let pages = paginate(html, &layout_with_budget(800.0), &FixedHeights::uniform(400.0));
    assert_eq!(pages.len(), 1);
}

#[test]
fn empty_input_yields_one_empty_page() {
    let pages = paginate("", &PageLayout::letter(), &FixedHeights::uniform(10.0));
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());
    assert_eq!(pages[0].id, "page-1");
    assert_eq!(pages[0].measured_height, Some(0.0));
}

#[test]
fn oversized_block_sits_alone() {
    let html = "<p>a</p><p>huge</p><p>b</p>";
    let surface = FixedHeights::uniform(100.0).with("<p>huge</p>", 5000.0);
    let pages = paginate(html, &layout_with_budget(900.0), &surface);
    assert_eq!(chunks(&pages), vec![vec!["<p>a</p>"], vec!["<p>huge</p>"], vec!["<p>b</p>"]]);
    assert_eq!(pages[1].measured_height, Some(5000.0));
}

#[test]
fn oversized_first_block_is_its_own_page() {
    let html = "<p>huge</p><p>b</p>";
    let surface = FixedHeights::uniform(100.0).with("<p>huge</p>", 5000.0);
    let pages = paginate(html, &layout_with_budget(900.0), &surface);
    assert_eq!(chunks(&pages), vec![vec!["<p>huge</p>"], vec!["<p>b</p>"]]);
}

#[test]
fn page_ids_and_indices_follow_order() {
    let html = "<p>1</p><p>2</p><p>3</p>";
    let pages = paginate(html, &layout_with_budget(100.0), &FixedHeights::uniform(100.0));
    let ids: Vec<_> = pages.iter().map(|p| (p.id.as_str(), p.index)).collect();
    assert_eq!(ids, vec![("page-1", 0), ("page-2", 1), ("page-3", 2)]);
}

#[test]
fn page_html_concatenates_chunk() {
    let pages = paginate("<p>a</p><p>b</p>", &PageLayout::letter(), &FixedHeights::uniform(1.0));
    assert_eq!(pages[0].html(), "<p>a</p><p>b</p>");
}

#[test]
fn estimating_surface_breaks_long_documents() {
    let para = format!("<p>{}</p>", "word ".repeat(60));
    let html = para.repeat(30);
    let paginator = Paginator::new(PageLayout::letter(), EstimatingSurface::new(&PageLayout::letter()));
    let pages = paginator.paginate(&html);
    assert!(pages.len() > 1);
    for page in &pages {
        assert!(page.measured_height.unwrap() <= paginator.layout().budget());
    }
    let total: usize = pages.iter().map(|p| p.content_chunk.len()).sum();
    assert_eq!(total, 30);
}

// =============================================================
// Degraded measurement
// =============================================================

#[test]
fn unavailable_surface_degrades_to_one_unmeasured_page() {
    let html = "<p>1</p><p>2</p><p>3</p>";
    let pages = paginate(html, &PageLayout::letter(), &Unavailable);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].content_chunk.len(), 3);
    assert_eq!(pages[0].measured_height, None);
}

#[test]
fn non_finite_height_degrades() {
    let pages = paginate("<p>1</p>", &PageLayout::letter(), &Reports(f64::NAN));
    assert_eq!(pages[0].measured_height, None);
}

#[test]
fn split_pages_reports_invalid_height() {
    let err = split_pages(&["<p>x</p>".to_owned()], 100.0, &Reports(-1.0)).unwrap_err();
    assert_eq!(err, MeasureError::InvalidHeight(-1.0));
}

#[test]
fn page_serializes_camel_case() {
    let pages = paginate("<p>a</p>", &PageLayout::letter(), &FixedHeights::uniform(12.0));
    let json = serde_json::to_value(&pages[0]).unwrap();
    assert_eq!(json["id"], "page-1");
    assert_eq!(json["contentChunk"][0], "<p>a</p>");
    assert_eq!(json["measuredHeight"], 12.0);
}

// =============================================================
// Properties
// =============================================================

proptest! {
    #[test]
    fn pagination_is_idempotent(heights in proptest::collection::vec(1.0f64..1200.0, 0..30)) {
        let mut surface = FixedHeights::uniform(0.0);
        let mut html = String::new();
        for (i, h) in heights.iter().enumerate() {
            let block = format!("<p>{i}</p>");
            html.push_str(&block);
            surface = surface.with(block, *h);
        }
        let layout = layout_with_budget(900.0);
        let first = paginate(&html, &layout, &surface);
        let second = paginate(&html, &layout, &surface);
        prop_assert_eq!(&first, &second);

        // Every block appears exactly once, in order.
        let flat: Vec<String> = first.iter().flat_map(|p| p.content_chunk.clone()).collect();
        let expected: Vec<String> = (0..heights.len()).map(|i| format!("<p>{i}</p>")).collect();
        prop_assert_eq!(flat, expected);

        // Only single-block pages may exceed the budget.
        for page in &first {
            if page.content_chunk.len() > 1 {
                prop_assert!(page.measured_height.unwrap_or_default() <= 900.0);
            }
        }
    }
}

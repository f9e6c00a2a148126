#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn wide_limits() -> SizeLimits {
    SizeLimits::new(Size::new(10.0, 10.0), Size::new(1000.0, 1000.0))
}

fn resize(start: Rect, dir: ResizeDirection, from: Point, to: Point) -> Rect {
    Interaction::begin(from, start, DragMode::Resize(dir), wide_limits()).compute(to)
}

// =============================================================
// Move
// =============================================================

#[test]
fn move_translates_by_pointer_delta() {
    let i = Interaction::begin(pt(75.0, 80.0), Rect::new(50.0, 60.0, 100.0, 80.0), DragMode::Move, wide_limits());
    let r = i.compute(pt(85.0, 90.0));
    assert_eq!(r, Rect::new(60.0, 70.0, 100.0, 80.0));
}

#[test]
fn move_clamps_origin_to_zero() {
    let i = Interaction::begin(pt(10.0, 10.0), Rect::new(5.0, 5.0, 100.0, 80.0), DragMode::Move, wide_limits());
    let r = i.compute(pt(-50.0, -50.0));
    assert_eq!(r.x, 0.0);
    assert_eq!(r.y, 0.0);
    assert_eq!(r.width, 100.0);
}

#[test]
fn repeated_updates_recompute_from_baseline() {
    let mut i = Interaction::begin(pt(0.0, 0.0), Rect::new(0.0, 0.0, 50.0, 50.0), DragMode::Move, wide_limits());
    i.update(pt(10.0, 10.0));
    i.update(pt(20.0, 20.0));
    let r = i.update(pt(20.0, 20.0));
    // Same pointer twice yields the same geometry; nothing accumulates.
    assert_eq!(r, Rect::new(20.0, 20.0, 50.0, 50.0));
}

// =============================================================
// Resize: each compass direction
// =============================================================

#[test]
fn resize_se_grows_dimensions() {
    let r = resize(Rect::new(10.0, 20.0, 100.0, 80.0), ResizeDirection::Se, pt(110.0, 100.0), pt(130.0, 120.0));
    assert_eq!(r, Rect::new(10.0, 20.0, 120.0, 100.0));
}

#[test]
fn resize_nw_moves_origin_and_shrinks() {
    let r = resize(Rect::new(10.0, 20.0, 100.0, 80.0), ResizeDirection::Nw, pt(10.0, 20.0), pt(30.0, 40.0));
    assert_eq!(r, Rect::new(30.0, 40.0, 80.0, 60.0));
}

#[test]
fn resize_n_only_changes_y_and_height() {
    let r = resize(Rect::new(10.0, 20.0, 100.0, 80.0), ResizeDirection::N, pt(60.0, 20.0), pt(60.0, 30.0));
    assert_eq!(r, Rect::new(10.0, 30.0, 100.0, 70.0));
}

#[test]
fn resize_e_only_changes_width() {
    let r = resize(Rect::new(0.0, 0.0, 50.0, 50.0), ResizeDirection::E, pt(50.0, 25.0), pt(80.0, 99.0));
    assert_eq!(r, Rect::new(0.0, 0.0, 80.0, 50.0));
}

#[test]
fn resize_w_moves_x_and_shrinks_width() {
    let r = resize(Rect::new(10.0, 0.0, 100.0, 50.0), ResizeDirection::W, pt(10.0, 25.0), pt(30.0, 25.0));
    assert_eq!(r, Rect::new(30.0, 0.0, 80.0, 50.0));
}

#[test]
fn resize_s_only_changes_height() {
    let r = resize(Rect::new(0.0, 0.0, 50.0, 50.0), ResizeDirection::S, pt(25.0, 50.0), pt(90.0, 70.0));
    assert_eq!(r, Rect::new(0.0, 0.0, 50.0, 70.0));
}

#[test]
fn resize_ne_changes_y_h_and_w() {
    let r = resize(Rect::new(0.0, 10.0, 50.0, 50.0), ResizeDirection::Ne, pt(50.0, 10.0), pt(60.0, 5.0));
    assert_eq!(r, Rect::new(0.0, 5.0, 60.0, 55.0));
}

#[test]
fn resize_sw_changes_x_w_and_h() {
    let r = resize(Rect::new(10.0, 0.0, 50.0, 50.0), ResizeDirection::Sw, pt(10.0, 50.0), pt(5.0, 60.0));
    assert_eq!(r, Rect::new(5.0, 0.0, 55.0, 60.0));
}

// =============================================================
// Resize: limits
// =============================================================

#[test]
fn resize_west_past_minimum_keeps_right_edge_fixed() {
    let start = Rect::new(100.0, 0.0, 100.0, 50.0);
    let r = resize(start, ResizeDirection::W, pt(100.0, 25.0), pt(500.0, 25.0));
    assert_eq!(r.width, 10.0);
    assert_eq!(r.right(), start.right());
}

#[test]
fn resize_north_past_minimum_keeps_bottom_edge_fixed() {
    let start = Rect::new(0.0, 100.0, 50.0, 100.0);
    let r = resize(start, ResizeDirection::N, pt(25.0, 100.0), pt(25.0, 900.0));
    assert_eq!(r.height, 10.0);
    assert_eq!(r.bottom(), start.bottom());
}

#[test]
fn resize_west_cannot_push_origin_negative() {
    let start = Rect::new(20.0, 0.0, 50.0, 50.0);
    let r = resize(start, ResizeDirection::W, pt(20.0, 25.0), pt(-500.0, 25.0));
    assert_eq!(r.x, 0.0);
    assert_eq!(r.width, 70.0);
}

#[test]
fn resize_east_clamps_to_maximum() {
    let limits = SizeLimits::new(Size::new(10.0, 10.0), Size::new(120.0, 60.0));
    let i = Interaction::begin(pt(50.0, 50.0), Rect::new(0.0, 0.0, 50.0, 50.0), DragMode::Resize(ResizeDirection::Se), limits);
    let r = i.compute(pt(5000.0, 5000.0));
    assert_eq!(r.width, 120.0);
    assert_eq!(r.height, 60.0);
}

#[test]
fn resize_nan_pointer_falls_back_to_minimum() {
    let r = resize(Rect::new(0.0, 0.0, 50.0, 50.0), ResizeDirection::E, pt(50.0, 25.0), pt(f64::NAN, 25.0));
    assert_eq!(r.width, 10.0);
}

// =============================================================
// Callbacks
// =============================================================

#[test]
fn move_update_fires_on_move_callback() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut i = Interaction::begin(pt(0.0, 0.0), Rect::new(0.0, 0.0, 20.0, 20.0), DragMode::Move, wide_limits())
        .on_move(move |p| sink.borrow_mut().push(p))
        .on_resize(|_| panic!("resize callback must not fire for a move"));
    i.update(pt(5.0, 5.0));
    i.update(pt(7.0, 9.0));
    assert_eq!(*seen.borrow(), vec![pt(5.0, 5.0), pt(7.0, 9.0)]);
}

#[test]
fn snapped_move_reports_snapped_origin() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut i = Interaction::begin(pt(0.0, 0.0), Rect::new(103.0, 107.0, 20.0, 20.0), DragMode::Move, wide_limits())
        .snap_to(10.0)
        .on_move(move |p| sink.borrow_mut().push(p));
    let r = i.update(pt(4.0, 1.0));
    assert_eq!(r.origin(), pt(110.0, 110.0));
    assert_eq!(*seen.borrow(), vec![pt(110.0, 110.0)]);
}

#[test]
fn snapped_move_without_motion_keeps_start() {
    let start = Rect::new(103.0, 107.0, 20.0, 20.0);
    let i = Interaction::begin(pt(5.0, 5.0), start, DragMode::Move, wide_limits()).snap_to(10.0);
    assert_eq!(i.compute(pt(5.0, 5.0)), start);
}

#[test]
fn snap_does_not_apply_to_resize() {
    let i = Interaction::begin(
        pt(20.0, 20.0),
        Rect::new(0.0, 0.0, 20.0, 20.0),
        DragMode::Resize(ResizeDirection::Se),
        wide_limits(),
    )
    .snap_to(10.0);
    assert_eq!(i.compute(pt(23.0, 27.0)), Rect::new(0.0, 0.0, 23.0, 27.0));
}

#[test]
fn resize_update_fires_on_resize_callback() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut i = Interaction::begin(
        pt(20.0, 20.0),
        Rect::new(0.0, 0.0, 20.0, 20.0),
        DragMode::Resize(ResizeDirection::Se),
        wide_limits(),
    )
    .on_resize(move |r| sink.borrow_mut().push(r));
    i.update(pt(30.0, 40.0));
    assert_eq!(*seen.borrow(), vec![Rect::new(0.0, 0.0, 30.0, 40.0)]);
}

// =============================================================
// Handles
// =============================================================

#[test]
fn handle_points_sit_on_edges() {
    let r = Rect::new(0.0, 0.0, 100.0, 50.0);
    assert_eq!(ResizeDirection::Nw.handle_point(r), pt(0.0, 0.0));
    assert_eq!(ResizeDirection::N.handle_point(r), pt(50.0, 0.0));
    assert_eq!(ResizeDirection::E.handle_point(r), pt(100.0, 25.0));
    assert_eq!(ResizeDirection::Se.handle_point(r), pt(100.0, 50.0));
    assert_eq!(ResizeDirection::Sw.handle_point(r), pt(0.0, 50.0));
}

#[test]
fn every_direction_has_a_cursor() {
    for dir in ResizeDirection::ALL {
        assert!(dir.cursor().ends_with("-resize"));
    }
}

// =============================================================
// Properties
// =============================================================

fn direction() -> impl Strategy<Value = ResizeDirection> {
    (0usize..8).prop_map(|i| ResizeDirection::ALL[i])
}

proptest! {
    #[test]
    fn resize_never_leaves_limits(
        dir in direction(),
        x in 0.0f64..500.0,
        y in 0.0f64..500.0,
        w in 20.0f64..200.0,
        h in 20.0f64..200.0,
        dx in -5000.0f64..5000.0,
        dy in -5000.0f64..5000.0,
    ) {
        let limits = SizeLimits::new(Size::new(20.0, 20.0), Size::new(300.0, 250.0));
        let start = Rect::new(x, y, w, h);
        let r = resize_rect(start, dir, dx, dy, limits);
        prop_assert!(r.width >= 20.0 && r.width <= 300.0, "width {}", r.width);
        prop_assert!(r.height >= 20.0 && r.height <= 250.0, "height {}", r.height);
        prop_assert!(r.x >= 0.0 && r.y >= 0.0);
    }

    #[test]
    fn resize_keeps_opposite_edges_fixed(
        dir in direction(),
        dx in -300.0f64..300.0,
        dy in -300.0f64..300.0,
    ) {
        let start = Rect::new(400.0, 400.0, 100.0, 100.0);
        let r = resize_rect(start, dir, dx, dy, wide_limits());
        if dir.has_west() {
            prop_assert!((r.right() - start.right()).abs() < 1e-9);
        }
        if dir.has_north() {
            prop_assert!((r.bottom() - start.bottom()).abs() < 1e-9);
        }
        if !dir.has_west() {
            prop_assert_eq!(r.x, start.x);
        }
        if !dir.has_north() {
            prop_assert_eq!(r.y, start.y);
        }
    }
}

//! Property checks for the snap resolver, displacement and the live bridge.
//!
//! Coordinates are whole pixels with even sizes so centers stay exact and
//! comparisons need no tolerance.

use std::rc::Rc;

use layout_snap::backend::{AcceleratedBackend, SnapBackend, SoftwareBackend};
use layout_snap::geometry::overlap_area;
use layout_snap::{
    Container, ElementStyle, EngineConfig, IndexConfig, LiveBridge, ManualScheduler, Rect, Scene,
    Sibling, SnapOptions, SpatialIndex, intersects, resolve_displacement, resolve_snap,
    resolve_snap_with,
};
use proptest::prelude::*;

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-400i32..400, -400i32..400, 1i32..60, 1i32..60).prop_map(|(x, y, w, h)| {
        Rect::new(f64::from(x), f64::from(y), f64::from(w * 2), f64::from(h * 2))
    })
}

fn siblings_strategy() -> impl Strategy<Value = Vec<Rect>> {
    prop::collection::vec(rect_strategy(), 0..24)
}

fn options_strategy() -> impl Strategy<Value = SnapOptions> {
    (1i32..20, any::<bool>(), any::<bool>()).prop_map(|(threshold, container, gap_snapping)| {
        SnapOptions {
            threshold: f64::from(threshold),
            container: container.then(|| Rect::new(0.0, 0.0, 800.0, 600.0)),
            gap_snapping,
        }
    })
}

fn named(rects: &[Rect]) -> Vec<Sibling> {
    rects
        .iter()
        .enumerate()
        .map(|(idx, rect)| Sibling {
            id: format!("s{idx}"),
            rect: *rect,
        })
        .collect()
}

fn scene_with(moving: Rect, siblings: &[Rect]) -> Scene {
    let mut container = Container::new("root").with_size(800.0, 600.0).with_child(
        "moving",
        ElementStyle::pixels(moving.left, moving.top, moving.width, moving.height),
    );
    for (idx, rect) in siblings.iter().enumerate() {
        container = container.with_child(
            format!("s{idx}"),
            ElementStyle::pixels(rect.left, rect.top, rect.width, rect.height),
        );
    }
    Scene::new(vec![container])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn intersection_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(intersects(&a, &b), intersects(&b, &a));
        prop_assert_eq!(overlap_area(&a, &b), overlap_area(&b, &a));
        prop_assert_eq!(intersects(&a, &b), overlap_area(&a, &b) > 0.0);
    }

    #[test]
    fn lone_element_never_moves(moving in rect_strategy(), options in options_strategy()) {
        let result = resolve_snap_with(&moving, &[], &options);
        prop_assert_eq!((result.x, result.y), (moving.left, moving.top));
        prop_assert!(result.guides.is_empty());
    }

    #[test]
    fn snapping_moves_less_than_threshold(
        moving in rect_strategy(),
        siblings in siblings_strategy(),
        options in options_strategy(),
    ) {
        let result = resolve_snap_with(&moving, &siblings, &options);
        prop_assert!((result.x - moving.left).abs() < options.threshold);
        prop_assert!((result.y - moving.top).abs() < options.threshold);
        if result.guides.is_empty() {
            prop_assert_eq!((result.x, result.y), (moving.left, moving.top));
        }
    }

    #[test]
    fn direct_snapping_is_idempotent(
        moving in rect_strategy(),
        siblings in siblings_strategy(),
        threshold in 1i32..20,
    ) {
        let options = SnapOptions {
            gap_snapping: false,
            ..SnapOptions::with_threshold(f64::from(threshold))
        };
        let first = resolve_snap_with(&moving, &siblings, &options);
        let placed = first.rect(&moving);
        let second = resolve_snap_with(&placed, &siblings, &options);
        prop_assert_eq!((second.x, second.y), (first.x, first.y));
        prop_assert_eq!(second.guides.len(), first.guides.len());
    }

    #[test]
    fn backends_agree(
        siblings in siblings_strategy(),
        probes in prop::collection::vec(rect_strategy(), 1..8),
        options in options_strategy(),
    ) {
        let mut software = SoftwareBackend::default();
        let mut accelerated = AcceleratedBackend::default();
        software.prepare(&siblings, &options);
        accelerated.prepare(&siblings, &options);
        for probe in &probes {
            prop_assert_eq!(software.resolve(probe), accelerated.resolve(probe));
        }
    }

    #[test]
    fn displacement_only_touches_overlapping_siblings(
        proposed in rect_strategy(),
        rects in siblings_strategy(),
    ) {
        let siblings = named(&rects);
        let map = resolve_displacement("moving", &proposed, &siblings);
        for sibling in &siblings {
            match map.get(&sibling.id) {
                Some(offset) => {
                    prop_assert!(intersects(&proposed, &sibling.rect));
                    let pushed = sibling.rect.moved_to(offset.x, offset.y);
                    prop_assert!(!intersects(&proposed, &pushed));
                }
                None => prop_assert!(!intersects(&proposed, &sibling.rect)),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cancel_restores_committed_geometry(
        moving in rect_strategy(),
        siblings in prop::collection::vec(rect_strategy(), 1..12),
        steps in prop::collection::vec((-400i32..400, -400i32..400), 1..6),
    ) {
        let scene = scene_with(moving, &siblings);
        let index = SpatialIndex::build(&scene, &IndexConfig::default());
        let scheduler = ManualScheduler::new();
        let bridge = LiveBridge::new(index, EngineConfig::default(), Rc::new(scheduler.clone()));
        let _sub = bridge.subscribe(|_| {});

        prop_assert!(bridge.begin_drag("moving"));
        for (frame, (x, y)) in steps.iter().enumerate() {
            bridge.update_drag(f64::from(*x), f64::from(*y), moving.width, moving.height);
            scheduler.run_frame(frame as f64 * 16.0);
        }
        bridge.cancel_drag();

        prop_assert!(bridge.frame().guides().is_empty());
        prop_assert_eq!(bridge.get_bounds("moving"), Some(moving));
        for (idx, rect) in siblings.iter().enumerate() {
            prop_assert_eq!(bridge.get_bounds(&format!("s{idx}")), Some(*rect));
        }
    }

    #[test]
    fn unsubscribing_twice_is_harmless(count in 1usize..6) {
        let index = SpatialIndex::build(&scene_with(Rect::new(0.0, 0.0, 10.0, 10.0), &[]), &IndexConfig::default());
        let scheduler = ManualScheduler::new();
        let bridge = LiveBridge::new(index, EngineConfig::default(), Rc::new(scheduler.clone()));
        let subs: Vec<_> = (0..count).map(|_| bridge.subscribe(|_| {})).collect();
        prop_assert_eq!(bridge.listener_count(), count);
        prop_assert_eq!(scheduler.active(), 1);
        for sub in &subs {
            sub.unsubscribe();
            sub.unsubscribe();
        }
        prop_assert_eq!(bridge.listener_count(), 0);
        prop_assert_eq!(scheduler.active(), 0);
        prop_assert_eq!(scheduler.run_frame(16.0), 0);
    }
}

#[test]
fn threshold_wrapper_matches_default_options() {
    let siblings = [Rect::new(0.0, 0.0, 40.0, 40.0)];
    let moving = Rect::new(43.0, 100.0, 20.0, 20.0);
    assert_eq!(
        resolve_snap(&moving, &siblings, 8.0),
        resolve_snap_with(&moving, &siblings, &SnapOptions::with_threshold(8.0))
    );
}

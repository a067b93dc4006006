use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use layout_snap::backend::{AcceleratedBackend, SnapBackend, SoftwareBackend};
use layout_snap::{
    Container, ElementStyle, EngineConfig, IndexConfig, LiveBridge, ManualScheduler, Rect, Scene,
    SnapOptions, SpatialIndex, resolve_displacement,
};
use std::hint::black_box;
use std::rc::Rc;

/// Cards laid out on a grid with a 24px gutter, plus a little jitter so not
/// every edge lines up.
fn grid_siblings(count: usize) -> Vec<Rect> {
    let columns = (count as f64).sqrt().ceil().max(1.0) as usize;
    (0..count)
        .map(|i| {
            let col = (i % columns) as f64;
            let row = (i / columns) as f64;
            let jitter = ((i * 7) % 5) as f64;
            Rect::new(col * 144.0 + jitter, row * 104.0, 120.0, 80.0)
        })
        .collect()
}

fn grid_scene(count: usize) -> Scene {
    let mut container = Container::new("canvas").with_size(4096.0, 4096.0);
    for (idx, rect) in grid_siblings(count).iter().enumerate() {
        container = container.with_child(
            format!("card{idx}"),
            ElementStyle::pixels(rect.left, rect.top, rect.width, rect.height),
        );
    }
    Scene::new(vec![container])
}

fn probes() -> Vec<Rect> {
    (0..64)
        .map(|i| Rect::new(i as f64 * 37.5, i as f64 * 21.25, 120.0, 80.0))
        .collect()
}

fn bench_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("snap_backends");
    let options = SnapOptions {
        container: Some(Rect::new(0.0, 0.0, 4096.0, 4096.0)),
        ..SnapOptions::default()
    };
    let probes = probes();
    for count in [16usize, 256, 2048] {
        let siblings = grid_siblings(count);
        let mut software = SoftwareBackend::default();
        software.prepare(&siblings, &options);
        let mut accelerated = AcceleratedBackend::default();
        accelerated.prepare(&siblings, &options);

        group.bench_with_input(BenchmarkId::new("software", count), &probes, |b, probes| {
            b.iter(|| {
                for probe in probes {
                    black_box(software.resolve(black_box(probe)));
                }
            });
        });
        group.bench_with_input(
            BenchmarkId::new("accelerated", count),
            &probes,
            |b, probes| {
                b.iter(|| {
                    for probe in probes {
                        black_box(accelerated.resolve(black_box(probe)));
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_index");
    for count in [256usize, 4096] {
        let scene = grid_scene(count);
        group.bench_with_input(BenchmarkId::new("build", count), &scene, |b, scene| {
            b.iter(|| black_box(SpatialIndex::build(black_box(scene), &IndexConfig::default())));
        });
        let index = SpatialIndex::build(&scene, &IndexConfig::default());
        let probe = Rect::new(1000.0, 1000.0, 300.0, 200.0);
        group.bench_with_input(BenchmarkId::new("query_overlaps", count), &index, |b, index| {
            b.iter(|| black_box(index.query_overlaps("canvas", black_box(&probe)).len()));
        });
    }
    group.finish();
}

fn bench_displacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("displacement");
    for count in [256usize, 2048] {
        let index = SpatialIndex::build(&grid_scene(count), &IndexConfig::default());
        let siblings = index.siblings("canvas", "card0");
        let proposed = Rect::new(700.0, 500.0, 400.0, 300.0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &siblings, |b, siblings| {
            b.iter(|| black_box(resolve_displacement("card0", black_box(&proposed), siblings).len()));
        });
    }
    group.finish();
}

fn bench_drag_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag_frame");
    for count in [256usize, 2048] {
        let index = SpatialIndex::build(&grid_scene(count), &IndexConfig::default());
        let scheduler = ManualScheduler::new();
        let bridge = LiveBridge::new(index, EngineConfig::default(), Rc::new(scheduler.clone()));
        let _sub = bridge.subscribe(|frame| {
            black_box(frame.guides().len());
        });
        bridge.begin_drag("card0");
        let mut step = 0.0;
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| {
                step += 3.0;
                bridge.update_drag(step % 2000.0, step % 1500.0, 120.0, 80.0);
                black_box(scheduler.run_frame(step));
            });
        });
        bridge.cancel_drag();
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_backends, bench_index, bench_displacement, bench_drag_frame
);
criterion_main!(benches);

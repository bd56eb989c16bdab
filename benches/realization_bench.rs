use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mobod::*;
use std::hint::black_box;

fn prepare_chain(body_count: usize) -> MatterTree {
    let mut tree = MatterTree::default();
    let mut parent = MobilizedBodyIndex::GROUND;
    for i in 0..body_count {
        let mobilizer = if i % 2 == 0 { MobilizerType::Pin } else { MobilizerType::Ball };
        let node = BodyNode::new(&format!("link{i}"), parent, mobilizer)
            .with_inboard_frame(Transform::from_translation(DVec3::new(0.0, -0.5, 0.0)))
            .with_mass_properties(
                MassProperties::solid_box(1.0, DVec3::new(0.05, 0.25, 0.05)).unwrap_or_default(),
            );
        match tree.add_body(node) {
            Ok(idx) => parent = idx,
            Err(e) => panic!("chain construction failed: {e}"),
        }
    }
    tree
}

fn moving_state(tree: &MatterTree) -> State {
    let mut state = tree.create_state();
    for (i, u) in state.upd_u().iter_mut().enumerate() {
        *u = 0.1 * ((i % 7) as f64 - 3.0);
    }
    state
}

fn bench_realize(c: &mut Criterion) {
    let mut group = c.benchmark_group("realize");
    for &count in &[8usize, 64, 256] {
        let tree = prepare_chain(count);
        group.bench_with_input(BenchmarkId::new("position", count), &count, |b, _| {
            b.iter(|| {
                let mut state = moving_state(&tree);
                tree.realize(&mut state, Stage::Position).ok();
                black_box(state)
            })
        });
        group.bench_with_input(BenchmarkId::new("acceleration", count), &count, |b, _| {
            b.iter(|| {
                let mut state = moving_state(&tree);
                tree.realize(&mut state, Stage::Acceleration).ok();
                black_box(state)
            })
        });
    }
    group.finish();
}

fn bench_station_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("station_mapping");
    let tree = prepare_chain(64);
    let mut state = moving_state(&tree);
    if let Err(e) = tree.realize(&mut state, Stage::Position) {
        panic!("realization failed: {e}");
    }
    let tip = tree
        .mobilized_body(MobilizedBodyIndex(64))
        .unwrap_or_else(|e| panic!("missing tip: {e}"));
    for &count in &[1_000usize, 100_000] {
        let stations: Vec<DVec3> = (0..count).map(|i| DVec3::splat(i as f64 * 1e-3)).collect();
        group.bench_with_input(BenchmarkId::new("batch", count), &stations, |b, stations| {
            b.iter(|| black_box(tip.find_station_locations_in_ground(&state, stations)))
        });
        group.bench_with_input(BenchmarkId::new("one_by_one", count), &stations, |b, stations| {
            b.iter(|| {
                let out: Vec<_> = stations
                    .iter()
                    .map(|s| tip.find_station_location_in_ground(&state, *s))
                    .collect();
                black_box(out)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_realize, bench_station_mapping);
criterion_main!(benches);

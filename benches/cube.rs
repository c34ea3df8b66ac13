//! Benchmarks for the puzzle core.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rubix::resolver::{resolve, Gesture, PlanarProjector};
use rubix::{is_solved, Cube, Direction, Move, Session, Turn, TurnEngine};

/// Benchmark a quarter turn and its inverse on several cube sizes.
fn bench_layer_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("layer_turn");
    for size in [3, 5, 9] {
        let mut engine = TurnEngine::new(Cube::new(size).unwrap());
        let mv = Move::new(Direction::PosX, size / 2, Turn::Positive);
        group.bench_with_input(BenchmarkId::from_parameter(size), &mv, |b, &mv| {
            b.iter(|| {
                engine.apply(black_box(mv)).unwrap();
                engine.apply(black_box(mv.inverse())).unwrap();
            })
        });
    }
    group.finish();
}

/// Benchmark solve detection on a scrambled cube.
fn bench_is_solved(c: &mut Criterion) {
    let mut session = Session::new(5).unwrap();
    session.scramble(&mut StdRng::seed_from_u64(1)).unwrap();
    session.run_sequence().unwrap();

    c.bench_function("is_solved_5x5", |b| {
        b.iter(|| is_solved(black_box(session.cube())))
    });
}

/// Benchmark a full scramble followed by the reverse solve.
fn bench_scramble_and_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("scramble_and_reverse");
    group.sample_size(20);
    group.bench_function("4x4", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let mut session = Session::new(4).unwrap();
            session.scramble(&mut rng).unwrap();
            session.run_sequence().unwrap();
            session.solve().unwrap();
            session.run_sequence().unwrap()
        })
    });
    group.finish();
}

/// Benchmark resolving a drag gesture into a move.
fn bench_resolve_gesture(c: &mut Criterion) {
    let camera_forward = Vec3::new(-0.4, -0.5, -0.77).normalize();
    let gesture = Gesture {
        face_normal: Vec3::Z,
        contact_point: Vec3::new(0.3, 0.6, 1.5),
        drag: Vec2::new(0.2, 0.05),
        camera_up: Vec3::Y,
        camera_forward,
        piece: (1, 2, 2),
    };
    let projector = PlanarProjector::new(camera_forward, Vec3::Y);

    c.bench_function("resolve_gesture", |b| {
        b.iter(|| resolve(black_box(&gesture), 3, &projector))
    });
}

criterion_group!(
    benches,
    bench_layer_turn,
    bench_is_solved,
    bench_scramble_and_reverse,
    bench_resolve_gesture
);
criterion_main!(benches);

//! Criterion micro-benchmarks for resource acquire/release and sampling.

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion};
use ringlock_core::{ActorId, ResourceId};
use ringlock_engine::Resource;

fn bench_uncontended(c: &mut Criterion) {
    let resource = Resource::new(ResourceId(0));
    c.bench_function("acquire_release_uncontended", |b| {
        b.iter(|| {
            let guard = resource.acquire(black_box(ActorId(0))).unwrap();
            drop(guard);
        });
    });
}

fn bench_observe(c: &mut Criterion) {
    let resource = Resource::new(ResourceId(0));
    let _guard = resource.acquire(ActorId(1)).unwrap();
    c.bench_function("observe_state", |b| {
        b.iter(|| black_box(resource.observe_state()));
    });
}

fn bench_two_thread_hand_off(c: &mut Criterion) {
    c.bench_function("hand_off_2_threads_1000", |b| {
        b.iter(|| {
            let resource = Arc::new(Resource::new(ResourceId(0)));
            let handles: Vec<_> = (0..2u32)
                .map(|id| {
                    let resource = Arc::clone(&resource);
                    thread::spawn(move || {
                        for _ in 0..500 {
                            let _g = resource.acquire(ActorId(id)).unwrap();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            black_box(resource.acquisition_count());
        });
    });
}

criterion_group!(
    benches,
    bench_uncontended,
    bench_observe,
    bench_two_thread_hand_off
);
criterion_main!(benches);

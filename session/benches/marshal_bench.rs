use criterion::{Criterion, black_box, criterion_group, criterion_main};
use inferlink_engine::MemoryLocation;
use inferlink_session::{HostValue, to_host, to_native};

fn bench_f32_round_trip(c: &mut Criterion) {
    let data = vec![0.5f32; 1 * 100 * 80];
    let host = HostValue::from_f32(vec![1, 100, 80], &data).unwrap();

    c.bench_function("marshal_f32_round_trip", |b| {
        b.iter(|| {
            let native = to_native(black_box(&host), None, &MemoryLocation::Cpu).unwrap();
            let _ = black_box(to_host(native).unwrap());
        });
    });
}

fn bench_string_encode(c: &mut Criterion) {
    let values: Vec<String> = (0..256).map(|i| format!("token-{i}")).collect();
    let host = HostValue::Strings {
        shape: vec![256],
        values,
    };

    c.bench_function("marshal_string_encode", |b| {
        b.iter(|| {
            let _ = black_box(to_native(black_box(&host), None, &MemoryLocation::Cpu).unwrap());
        });
    });
}

criterion_group!(benches, bench_f32_round_trip, bench_string_encode);
criterion_main!(benches);

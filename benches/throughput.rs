mod generator;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use generator::Generator;
use jsonpull::{parse, parse_bytes, Config, ValueKind};
use rand::{rngs::StdRng, SeedableRng};

macro_rules! drain_skipping {
    ($iter:ident) => {{
        loop {
            match $iter.whats_next() {
                ValueKind::Invalid => break,
                _ => $iter.skip(),
            }
        }
        assert!($iter.ok().is_ok());
    }};
}

macro_rules! drain_with_content {
    ($iter:ident) => {{
        loop {
            match $iter.whats_next() {
                ValueKind::Invalid => break,
                ValueKind::String => {
                    black_box($iter.read_string());
                }
                ValueKind::Number => {
                    black_box($iter.read_f64());
                }
                ValueKind::Bool => {
                    black_box($iter.read_bool());
                }
                ValueKind::Null => {
                    $iter.read_null();
                }
                ValueKind::Array => {
                    while $iter.read_array() {
                        black_box($iter.skip_and_return_bytes());
                    }
                }
                ValueKind::Object => {
                    while let Some(key) = $iter.read_object() {
                        black_box(key);
                        $iter.skip();
                    }
                }
            }
        }
        assert!($iter.ok().is_ok());
    }};
}

fn bench_throughput(c: &mut Criterion) {
    const LEN: usize = 2 * 1024 * 1024;

    let mut generator = Generator::new(StdRng::seed_from_u64(0x2026_0802), true);
    let mut json = Vec::with_capacity(LEN + 4096);
    generator.generate(LEN, &mut json);

    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Bytes(json.len() as u64));
    group.sample_size(10);

    group.bench_function("fixed: skip everything", |b| {
        b.iter(|| {
            let mut iter = parse_bytes(Config::default(), json.clone());
            drain_skipping!(iter);
        });
    });

    group.bench_function("streaming 8 KiB window: skip everything", |b| {
        b.iter(|| {
            let mut iter = parse(Config::default(), json.as_slice(), 8 * 1024);
            drain_skipping!(iter);
        });
    });

    group.bench_function("streaming 512 B window: skip everything", |b| {
        b.iter(|| {
            let mut iter = parse(Config::default(), json.as_slice(), 512);
            drain_skipping!(iter);
        });
    });

    group.bench_function("streaming 8 KiB window: fetch content", |b| {
        b.iter(|| {
            let mut iter = parse(Config::default(), json.as_slice(), 8 * 1024);
            drain_with_content!(iter);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);

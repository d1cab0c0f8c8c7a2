//! Benchmarks for turbine block writing and reading
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tempfile::tempdir;
use turbine::storage::{Mode, Reader, Writer, WriterConfig};

// 100 samples per block at 10ms spacing
fn write_blocks(root: &std::path::Path, config: WriterConfig, samples: usize) {
    let mut writer = Writer::new(root, "bench", config).unwrap();
    for i in 0..samples {
        writer.set_time_ms(i as i64 * 10);
        writer.put_data("value.f32", i as f32).unwrap();
        if i % 100 == 99 {
            writer.flush().unwrap();
        }
    }
    writer.close().unwrap();
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");

    for size in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("streamed_zip_{}", size), |b| {
            b.iter(|| {
                let dir = tempdir().unwrap();
                write_blocks(dir.path(), WriterConfig::default(), black_box(size));
            })
        });

        group.bench_function(format!("packed_zip_{}", size), |b| {
            let config = WriterConfig {
                packed: true,
                ..WriterConfig::default()
            };
            b.iter(|| {
                let dir = tempdir().unwrap();
                write_blocks(dir.path(), config.clone(), black_box(size));
            })
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for size in [1_000usize, 10_000] {
        let dir = tempdir().unwrap();
        write_blocks(dir.path(), WriterConfig::default(), size);
        let reader = Reader::new(dir.path());
        let duration = size as f64 * 0.010;

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("gather_{}", size), |b| {
            b.iter(|| {
                let data = reader
                    .get_data("bench", "value.f32", 0.0, black_box(duration), Mode::Absolute)
                    .unwrap();
                assert_eq!(data.size(), size);
            })
        });

        group.bench_function(format!("newest_{}", size), |b| {
            b.iter(|| {
                reader
                    .get_data("bench", "value.f32", 0.0, black_box(1.0), Mode::Newest)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);

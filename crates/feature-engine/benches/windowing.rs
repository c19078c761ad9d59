use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{build_windows, StatisticalExtractor, WindowFeatureExtractor};
use readout::{Readout, ReadoutTable};

fn fleet(vehicles: u64, readouts: u64, channels: usize) -> ReadoutTable {
    let names = (0..channels).map(|c| format!("{c}_0")).collect();
    let rows = (0..vehicles)
        .flat_map(|v| {
            (0..readouts).map(move |t| {
                let values = (0..channels).map(|c| Some((v * 31 + t * 7 + c as u64) as f64)).collect();
                Readout::new(v, t as f64 * 0.8, values)
            })
        })
        .collect();
    ReadoutTable::from_rows(names, rows).expect("consistent widths")
}

fn bench_windowing(c: &mut Criterion) {
    let table = fleet(50, 60, 8);

    c.bench_function("build_windows 50x60x8 w=8,16", |b| {
        b.iter(|| build_windows(black_box(&table), black_box(&[8.0, 16.0])))
    });

    let windows = build_windows(&table, &[8.0]).expect("valid sizes");
    let extractor = StatisticalExtractor::with_default_statistics(4).expect("valid extractor");
    c.bench_function("extract default statistics", |b| {
        b.iter(|| extractor.extract(black_box(&windows)))
    });
}

criterion_group!(benches, bench_windowing);
criterion_main!(benches);

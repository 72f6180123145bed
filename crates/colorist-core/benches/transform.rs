//! Transform engine benchmarks.
//!
//! Benchmarks the hot paths identified in spec.md §5: the per-pixel
//! transform kernel (Prepare once, Run many) and the unorm<->float
//! conversions every codec plugin relies on.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use colorist_core::profile::{CurveType, Primaries, Profile};
use colorist_core::transform::{ToneMapMode, ToneMapParams, Transform};
use colorist_core::{pixelmath, Image};

fn checkerboard_image(width: u32, height: u32, profile: &Profile) -> Image {
    let mut image = Image::create(width, height, 8, Some(profile)).unwrap();
    for y in 0..height {
        for x in 0..width {
            let t = ((x + y) % 2) as f32;
            image.set_pixel(x, y, [t, 1.0 - t, 0.5, 1.0]).unwrap();
        }
    }
    image
}

fn bench_transform_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_convert");

    let srgb = Profile::create_stock("srgb").unwrap();
    let bt2020_pq = Profile::create_stock("bt2020-pq").unwrap();
    let bt709_widegamut = Profile::create(Primaries::BT2020, CurveType::Gamma(2.2), 100, "wide").unwrap();

    for &side in &[64usize, 256, 1024] {
        let image = checkerboard_image(side as u32, side as u32, &srgb);
        group.throughput(Throughput::Elements((side * side) as u64));

        group.bench_with_input(BenchmarkId::new("reformat_only", side), &side, |b, _| {
            let transform = Transform::new(&srgb, &srgb, ToneMapMode::Auto, ToneMapParams::default());
            let prepared = transform.prepare(100).unwrap();
            b.iter(|| black_box(prepared.convert(black_box(&image), 8, 1).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("matrix_only", side), &side, |b, _| {
            let transform =
                Transform::new(&srgb, &bt709_widegamut, ToneMapMode::Off, ToneMapParams::default());
            let prepared = transform.prepare(100).unwrap();
            b.iter(|| black_box(prepared.convert(black_box(&image), 8, 1).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("tonemap", side), &side, |b, _| {
            let transform =
                Transform::new(&bt2020_pq, &srgb, ToneMapMode::Auto, ToneMapParams::default());
            let prepared = transform.prepare(100).unwrap();
            b.iter(|| black_box(prepared.convert(black_box(&image), 8, 1).unwrap()))
        });
    }

    group.finish();
}

fn bench_transform_parallel_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_parallel_scaling");

    let srgb = Profile::create_stock("srgb").unwrap();
    let bt2020_pq = Profile::create_stock("bt2020-pq").unwrap();
    let image = checkerboard_image(512, 512, &bt2020_pq);
    group.throughput(Throughput::Elements(512 * 512));

    for &jobs in &[1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("jobs", jobs), &jobs, |b, &jobs| {
            let transform = Transform::new(&bt2020_pq, &srgb, ToneMapMode::Auto, ToneMapParams::default());
            let prepared = transform.prepare(100).unwrap();
            b.iter(|| black_box(prepared.convert(black_box(&image), 8, jobs).unwrap()))
        });
    }

    group.finish();
}

fn bench_unorm_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("unorm_conversion");

    for &count in &[1_000usize, 100_000, 1_000_000] {
        let samples_u8: Vec<u8> = (0..count * 4).map(|i| (i % 256) as u8).collect();
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("u8_to_float", count), &count, |b, _| {
            b.iter(|| black_box(pixelmath::unorm_to_float_u8(black_box(&samples_u8))))
        });

        let floats = pixelmath::unorm_to_float_u8(&samples_u8);
        group.bench_with_input(BenchmarkId::new("float_to_u8", count), &count, |b, _| {
            b.iter(|| black_box(pixelmath::float_to_unorm_u8(black_box(&floats))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_transform_convert,
    bench_transform_parallel_scaling,
    bench_unorm_conversion,
);
criterion_main!(benches);

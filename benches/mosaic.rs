use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use region_fx::region::Region;
use region_fx::transform::{CropTransform, MosaicTransform, RegionTransform};
use region_fx::video::Frame;

fn test_frame() -> Frame {
    let image = image::RgbImage::from_fn(1920, 1080, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    Frame::new(image)
}

fn bench_mosaic(c: &mut Criterion) {
    let frame = test_frame();
    let mut group = c.benchmark_group("mosaic_1080p");

    for (label, region) in [
        ("small", Region { start_x: 100, start_y: 100, end_x: 300, end_y: 240 }),
        ("half", Region { start_x: 0, start_y: 0, end_x: 960, end_y: 540 }),
        ("full", Region { start_x: 0, start_y: 0, end_x: 1920, end_y: 1080 }),
    ] {
        let transform = MosaicTransform::new(10);
        group.bench_with_input(BenchmarkId::from_parameter(label), &region, |b, region| {
            b.iter(|| transform.apply(black_box(frame.clone()), region))
        });
    }
    group.finish();
}

fn bench_crop(c: &mut Criterion) {
    let frame = test_frame();
    let transform = CropTransform::new(false);
    let region = Region { start_x: 100, start_y: 100, end_x: 300, end_y: 240 };

    c.bench_function("crop_1080p_small", |b| {
        b.iter(|| transform.apply(black_box(frame.clone()), &region))
    });
}

criterion_group!(benches, bench_mosaic, bench_crop);
criterion_main!(benches);

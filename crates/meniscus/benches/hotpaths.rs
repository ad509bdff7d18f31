use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use meniscus::{CleanerConfig, DetectorConfig, MeniscusDetector, Roi, SeriesCleaner};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Camera-sized frame with one noisy container ROI.
fn make_frame(w: u32, h: u32, roi: &Roi, level: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(w, h, |x, y| {
        let inside = x >= roi.x && x < roi.x + roi.width && y >= roi.y && y < roi.y + roi.height;
        let base: i16 = match (inside, y >= level) {
            (false, _) => 90,
            (true, false) => 25,
            (true, true) => 210,
        };
        let v = (base + rng.gen_range(-15i16..=15)).clamp(0, 255) as u8;
        Rgb([v, v, v])
    })
}

fn bench_detector(c: &mut Criterion) {
    let roi = Roi::new(400, 100, 160, 700).unwrap();
    let frame = make_frame(1280, 960, &roi, 450, 7);

    let perimeter = MeniscusDetector::new(DetectorConfig::max_perimeter());
    c.bench_function("detect_160x700_max_perimeter", |b| {
        b.iter(|| black_box(perimeter.detect(black_box(&roi), black_box(&frame)).ok()))
    });

    let aspect = MeniscusDetector::new(DetectorConfig::max_aspect_ratio());
    c.bench_function("detect_160x700_max_aspect_ratio", |b| {
        b.iter(|| black_box(aspect.detect(black_box(&roi), black_box(&frame)).ok()))
    });

    c.bench_function("detect_with_debug_160x700", |b| {
        b.iter(|| {
            black_box(
                perimeter
                    .detect_with_debug(black_box(&roi), black_box(&frame))
                    .ok(),
            )
        })
    });
}

fn bench_cleaner(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let series: Vec<Option<f64>> = (0..10_000)
        .map(|i| {
            if i % 97 == 0 {
                None
            } else if i % 131 == 0 {
                Some(50.0)
            } else {
                Some(3.0 + rng.gen_range(-0.05..0.05))
            }
        })
        .collect();
    let cleaner = SeriesCleaner::new(CleanerConfig::legacy());

    c.bench_function("clean_10k_samples", |b| {
        b.iter(|| black_box(cleaner.clean(black_box(&series)).1.n_filled))
    });
}

criterion_group!(hotpaths, bench_detector, bench_cleaner);
criterion_main!(hotpaths);

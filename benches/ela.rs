use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use forensic_pipeline::analysis::ela::ErrorLevelAnalyzer;
use image::{DynamicImage, Rgb, RgbImage};

fn bench_ela(c: &mut Criterion) {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(512, 512, |x, y| {
        Rgb([(x ^ y) as u8, (x * 3) as u8, (y * 5) as u8])
    }));

    for quality in [95, 90, 75] {
        let analyzer = ErrorLevelAnalyzer::new(quality);
        c.bench_function(&format!("ela_512x512_q{}", quality), |b| {
            b.iter(|| analyzer.analyze(black_box(&image)))
        });
    }
}

criterion_group!(benches, bench_ela);
criterion_main!(benches);

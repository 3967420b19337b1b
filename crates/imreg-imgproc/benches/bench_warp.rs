use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use imreg_image::{Image, ImageSize};
use imreg_imgproc::{interpolation::InterpolationMode, warp::warp_perspective};

fn bench_warp_perspective(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp_perspective");

    let m = [0.98, 0.05, 12.0, -0.03, 1.01, -4.0, 1e-5, 2e-5, 1.0];

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{width}x{height}");

        let image_size = ImageSize {
            width: *width,
            height: *height,
        };

        let image_data = (0..width * height * 3).map(|v| (v % 255) as f32).collect();
        let image = Image::<f32, 3>::new(image_size, image_data).unwrap();
        let output = Image::<f32, 3>::from_size_val(image_size, 0.0).unwrap();

        for mode in [InterpolationMode::Bilinear, InterpolationMode::Nearest] {
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), &parameter_string),
                &(&image, &output),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    b.iter(|| {
                        std::hint::black_box(warp_perspective(src, &mut dst, &m, mode, [0.0; 3]))
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_warp_perspective);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use peeptree_core::{BoundingBox, ImageSize};
use peeptree_tiles::{AnnotationTileMapper, TileParams};

fn synthetic_boxes(n: i32) -> Vec<BoundingBox> {
    (0..n)
        .map(|k| {
            let x = (k * 97) % 1700;
            let y = (k * 53) % 850;
            BoundingBox::new("trunk", x, y, x + 120 + k % 40, y + 170 + k % 25)
        })
        .collect()
}

fn bench_map_image(c: &mut Criterion) {
    let mapper = AnnotationTileMapper::new(TileParams::default()).expect("mapper");
    let source = ImageSize::new(1920, 1080).expect("size");

    for n in [1, 8, 32] {
        let boxes = synthetic_boxes(n);
        c.bench_function(&format!("map_image_{n}_boxes"), |b| {
            b.iter(|| mapper.map_image(black_box(source), black_box(&boxes)))
        });
    }
}

criterion_group!(benches, bench_map_image);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use sheet_packer_core::prelude::*;
use sheet_packer_core::{MaxRectsBinPack, Rect};
use std::hint::black_box;

fn generate_sprites(count: usize, min_size: u32, max_size: u32) -> Vec<SpriteRect<usize>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            SpriteRect::new(i, w, h)
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("packager_search");
    group.sample_size(10);

    for count in [25, 50, 100] {
        let sprites = generate_sprites(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        for parallel in [false, true] {
            let name = if parallel { "parallel" } else { "sequential" };
            let opts = PackerOptions::builder().parallel(parallel).build();
            group.bench_with_input(BenchmarkId::new(name, count), &sprites, |b, sprites| {
                b.iter(|| black_box(pack_sprites(sprites.clone(), opts.clone())))
            });
        }
    }

    group.finish();
}

fn bench_uniform_grid(c: &mut Criterion) {
    let sprites: Vec<SpriteRect<usize>> = (0..256).map(|i| SpriteRect::new(i, 32, 32)).collect();
    let opts = PackerOptions::default();
    c.bench_function("packager_search/uniform_256", |b| {
        b.iter(|| black_box(pack_sprites(sprites.clone(), opts.clone())))
    });
}

fn bench_single_heuristic(c: &mut Criterion) {
    let mut group = c.benchmark_group("maxrects_batch");
    let rects: Vec<Rect<usize>> = generate_sprites(200, 8, 48)
        .into_iter()
        .map(|s| Rect::sized(s.width, s.height, s.key))
        .collect();

    for heuristic in Heuristic::ALL {
        group.bench_function(heuristic.short_name(), |b| {
            b.iter(|| {
                let mut bin = MaxRectsBinPack::with_bin(1024, 1024, true);
                let mut pending = rects.clone();
                black_box(bin.insert_batch(&mut pending, heuristic))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pack,
    bench_uniform_grid,
    bench_single_heuristic
);
criterion_main!(benches);

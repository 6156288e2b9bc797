use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use triangle_evolve::config::Config;
use triangle_evolve::engine::GaEngine;
use triangle_evolve::fitness::FitnessConfig;
use triangle_evolve::model::init_population;
use triangle_evolve::render::{PixelBuffer, Renderer, RendererConfig, TinySkiaRenderer};

const CANVAS: u32 = 64;
const NUM_TRIANGLES: usize = 50;

fn bench_config() -> Config {
    toml::from_str(
        r#"
        [ga]
        pop_size = 30
        generations = 5
        elitism = 2
        seed = 42

        [genome]
        num_triangles = 50

        [data]
        image_path = "unused.png"
        canvas_size = [64, 64]

        [selection]
        name = "tournament"

        [crossover]
        name = "uniform"

        [mutation]
        name = "uniform"

        [fitness]
        name = "pixel_mse"
        "#,
    )
    .unwrap()
}

// A smooth gradient so the target is not trivially matched by one flat color
fn gradient_target() -> PixelBuffer {
    let mut data = Vec::with_capacity((CANVAS * CANVAS * 4) as usize);
    for y in 0..CANVAS {
        for x in 0..CANVAS {
            data.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, 128, 255]);
        }
    }
    PixelBuffer::from_raw(CANVAS, CANVAS, data).unwrap()
}

fn renderer() -> Arc<TinySkiaRenderer> {
    Arc::new(TinySkiaRenderer::new(CANVAS, CANVAS, &RendererConfig::default()).unwrap())
}

fn benchmark_fitness(c: &mut Criterion) {
    let renderer = renderer();
    let candidate = init_population(1, NUM_TRIANGLES, &mut Pcg32::seed_from_u64(1)).remove(0);

    let mut group = c.benchmark_group("Fitness");
    group.bench_function("render", |b| {
        b.iter(|| renderer.render(black_box(candidate.triangles())).unwrap())
    });
    for fitness_config in [FitnessConfig::PixelMse, FitnessConfig::Ssim { window: 7 }] {
        let fitness = fitness_config
            .build(renderer.clone(), gradient_target())
            .unwrap();
        group.bench_function(fitness_config.name(), |b| {
            b.iter(|| fitness.evaluate(black_box(&candidate)).unwrap())
        });
    }
    group.finish();
}

fn benchmark_run(c: &mut Criterion) {
    let config = bench_config();
    let fitness = FitnessConfig::PixelMse
        .build(renderer(), gradient_target())
        .unwrap();

    let mut group = c.benchmark_group("GaEngine");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(10);
    group.bench_function("run_5_generations", |b| {
        b.iter(|| {
            let mut engine = GaEngine::from_config(&config, fitness.clone()).unwrap();
            let population = engine.random_population(NUM_TRIANGLES);
            engine.run(population).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_fitness, benchmark_run);
criterion_main!(benches);

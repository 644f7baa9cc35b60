//! Cornell box demo.
//!
//! Renders the Cornell box preset progressively and writes the raw average,
//! the denoised image and the G-buffer normals as PNGs.
//!
//! Usage: `cargo run --release --example cornell_box -- [iterations] [filter_size]`

use anyhow::{Context, Result};
use atrous_core::presets;
use atrous_renderer::{DenoiseParams, PathTracer, RenderConfig, Rgba8, RussianRoulette, ToneMap};
use std::sync::Arc;
use std::time::Instant;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 400;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let iterations: u32 = match args.next() {
        Some(arg) => arg.parse().context("iterations must be a positive integer")?,
        None => 64,
    };
    let filter_size: u32 = match args.next() {
        Some(arg) => arg.parse().context("filter size must be a non-negative integer")?,
        None => DenoiseParams::default().filter_size,
    };

    let scene = Arc::new(presets::cornell_box(WIDTH, HEIGHT));
    let config = RenderConfig::default()
        .with_max_depth(8)
        .with_russian_roulette(RussianRoulette::default())
        .with_tone_map(ToneMap::Gamma);

    let mut tracer = PathTracer::new(config);
    tracer.init(scene)?;

    println!("Rendering {}x{} for {} iterations...", WIDTH, HEIGHT, iterations);
    let start = Instant::now();
    let mut degenerate = 0;
    for iteration in 1..=iterations {
        let stats = tracer.render(0, iteration)?;
        degenerate += stats.degenerate_samples;
    }
    println!(
        "Rendered in {:?} ({} degenerate samples dropped)",
        start.elapsed(),
        degenerate
    );

    let mut pixels: Vec<Rgba8> = vec![[0; 4]; (WIDTH * HEIGHT) as usize];

    tracer.show_image(&mut pixels, iterations)?;
    save_png("raw.png", &pixels)?;

    let params = DenoiseParams {
        filter_size,
        ..DenoiseParams::default()
    };
    let start = Instant::now();
    tracer.show_denoised_image(&mut pixels, &params, iterations)?;
    println!("Denoised in {:?} ({} passes)", start.elapsed(), params.pass_count());
    save_png("denoised.png", &pixels)?;

    tracer.show_gbuffer(&mut pixels)?;
    save_png("gbuffer.png", &pixels)?;

    tracer.free()?;
    Ok(())
}

fn save_png(path: &str, pixels: &[Rgba8]) -> Result<()> {
    image::save_buffer(
        path,
        bytemuck::cast_slice(pixels),
        WIDTH,
        HEIGHT,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("Failed to write {}", path))?;
    println!("Saved {}", path);
    Ok(())
}

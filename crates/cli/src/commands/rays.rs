//! `rays` command implementation.

use anyhow::{Context, Result};
use contracts::{RayBatch, ScanConfiguration};
use serde::Serialize;
use tracing::info;

use crate::cli::RaysArgs;

/// Overview of one generated revolution
#[derive(Debug, Serialize)]
struct RaySummary {
    model: String,
    laser_count: usize,
    horizontal_steps: usize,
    ray_count: usize,
    ring_ids: Vec<i32>,
    time_span_ms: [f64; 2],
    range_window: [f64; 2],
    rays: Vec<RayRow>,
}

#[derive(Debug, Serialize)]
struct RayRow {
    index: usize,
    origin: [f64; 3],
    direction: [f64; 3],
    min_range: f64,
    max_range: f64,
    time_ms: f64,
}

/// Execute the `rays` command
pub fn run_rays(args: &RaysArgs) -> Result<()> {
    let config = scan_configuration(args);
    let bank = laser_catalog::laser_bank(args.model);

    info!(
        model = %args.model,
        resolution = config.horizontal_resolution_deg,
        min_angle = config.min_h_angle_deg,
        max_angle = config.max_h_angle_deg,
        "Generating rays"
    );

    let batch = ray_generator::generate(&bank, &config)
        .with_context(|| format!("Failed to generate rays for {}", args.model))?;
    let summary = summarize(args, &batch);

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize rays")?;
        println!("{}", json);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// Canonical configuration of the model with CLI overrides applied
fn scan_configuration(args: &RaysArgs) -> ScanConfiguration {
    let mut config = laser_catalog::canonical_configuration(args.model);
    if let Some(resolution) = args.resolution {
        config.horizontal_resolution_deg = resolution;
    }
    if let Some(min) = args.min_angle {
        config.min_h_angle_deg = min;
    }
    if let Some(max) = args.max_angle {
        config.max_h_angle_deg = max;
    }
    config
}

fn summarize(args: &RaysArgs, batch: &RayBatch) -> RaySummary {
    let fold_min = |a: f64, b: f64| a.min(b);
    let fold_max = |a: f64, b: f64| a.max(b);

    let time_span_ms = [
        batch.time_offsets.iter().copied().fold(f64::INFINITY, fold_min),
        batch.time_offsets.iter().copied().fold(f64::NEG_INFINITY, fold_max),
    ];
    let range_window = [
        batch.ranges.iter().map(|r| r.x).fold(f64::INFINITY, fold_min),
        batch.ranges.iter().map(|r| r.y).fold(f64::NEG_INFINITY, fold_max),
    ];

    let rays = (0..args.show.min(batch.ray_count()))
        .map(|i| {
            let origin = batch.origin(i);
            let direction = batch.direction(i);
            RayRow {
                index: i,
                origin: [origin.x, origin.y, origin.z],
                direction: [direction.x, direction.y, direction.z],
                min_range: batch.ranges[i].x,
                max_range: batch.ranges[i].y,
                time_ms: batch.time_offsets[i],
            }
        })
        .collect();

    RaySummary {
        model: args.model.to_string(),
        laser_count: batch.laser_count(),
        horizontal_steps: batch.horizontal_steps,
        ray_count: batch.ray_count(),
        ring_ids: batch.ring_ids.clone(),
        time_span_ms,
        range_window,
        rays,
    }
}

fn print_summary(summary: &RaySummary) {
    println!("\n📡 {}", summary.model);
    println!("   ├─ Lasers: {}", summary.laser_count);
    println!("   ├─ Horizontal steps: {}", summary.horizontal_steps);
    println!("   ├─ Rays: {}", summary.ray_count);
    println!("   ├─ Ring ids: {:?}", summary.ring_ids);
    println!(
        "   ├─ Time offsets: {:.4} .. {:.4} ms",
        summary.time_span_ms[0], summary.time_span_ms[1]
    );
    println!(
        "   └─ Range window: {:.3} .. {:.1} m",
        summary.range_window[0], summary.range_window[1]
    );

    if !summary.rays.is_empty() {
        println!(
            "\n{:>7}  {:>26}  {:>26}  {:>15}  {:>9}",
            "ray", "origin", "direction", "range", "time ms"
        );
        for ray in &summary.rays {
            println!(
                "{:>7}  ({:>7.3},{:>7.3},{:>7.3})  ({:>7.4},{:>7.4},{:>7.4})  {:>6.2}-{:<7.1}  {:>9.5}",
                ray.index,
                ray.origin[0],
                ray.origin[1],
                ray.origin[2],
                ray.direction[0],
                ray.direction[1],
                ray.direction[2],
                ray.min_range,
                ray.max_range,
                ray.time_ms
            );
        }
    }
    println!();
}

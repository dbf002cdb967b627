#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::pedantic)]

use lohimap::{LongLongMap, MapError, RegionStats};
use plotters::prelude::*;
use rand::{Rng, seq::SliceRandom};

// Prime, so the table never resizes while it is being measured
const TABLE_SIZE: usize = 100_003;
// Load factors from 0.1 to 0.95
const NUM_LOAD_FACTORS: usize = 10;

const SERIES: [&str; 4] = ["Lo share", "Hi share", "Lo share after churn", "Hi share after churn"];

#[derive(Debug, Clone, Copy)]
struct Sample {
    keys: usize,
    filled: RegionStats,
    churned: RegionStats,
}

// Fill a fresh table with `n_keys` distinct random keys, then remove every other one
fn measure(rng: &mut impl Rng, n_keys: usize) -> Result<Sample, MapError> {
    let mut map = LongLongMap::with_capacity(TABLE_SIZE)?;
    let mut keys = Vec::with_capacity(n_keys);
    while keys.len() < n_keys {
        let key = rng.random::<i64>();
        if map.put(key, key.wrapping_mul(31))? {
            keys.push(key);
        }
    }
    map.check_integrity()?;
    let filled = map.region_stats()?;

    keys.shuffle(rng);
    for key in keys.iter().step_by(2) {
        map.remove(key)?;
    }
    map.check_integrity()?;
    let churned = map.region_stats()?;

    Ok(Sample { keys: n_keys, filled, churned })
}

fn share(part: usize, stats: &RegionStats) -> f64 {
    let total = stats.lo_len + stats.hi_len;
    if total == 0 { 0.0 } else { part as f64 / total as f64 }
}

fn series_value(sample: &Sample, series: usize) -> f64 {
    match series {
        0 => share(sample.filled.lo_len, &sample.filled),
        1 => share(sample.filled.hi_len, &sample.filled),
        2 => share(sample.churned.lo_len, &sample.churned),
        _ => share(sample.churned.hi_len, &sample.churned),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| 0.1 + (0.95 - 0.1) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();
    let num_keys: Vec<usize> =
        load_factors.iter().map(|&load| (TABLE_SIZE as f64 * load) as usize).collect();

    println!("Load factors: {:?}", load_factors);
    println!("Number of keys: {:?}", num_keys);

    let mut rng = rand::rng();
    let mut samples = Vec::with_capacity(num_keys.len());
    for &n_keys in &num_keys {
        let sample = measure(&mut rng, n_keys)?;
        println!(
            "  {} keys: lo = {}, hi = {}, mean chain = {:.2}, longest chain = {}, after churn lo = {}, hi = {}",
            sample.keys,
            sample.filled.lo_len,
            sample.filled.hi_len,
            sample.filled.mean_chain_len,
            sample.filled.longest_chain,
            sample.churned.lo_len,
            sample.churned.hi_len,
        );
        samples.push(sample);
    }

    let font_family = "sans-serif";
    let colors = [
        RGBColor(220, 50, 50),  // Bright red
        RGBColor(50, 90, 220),  // Bright blue
        RGBColor(50, 180, 50),  // Bright green
        RGBColor(180, 50, 180), // Bright magenta
    ];
    let line_width = 2;
    let marker_size = 4;
    let text_size = 16;
    let title_size = 35;
    let x_labels: Vec<String> = num_keys.iter().map(|&n| n.to_string()).collect();
    let last = samples.len() - 1;

    // Plot 1: how entries split between the regions
    let root = BitMapBackend::new("region_shares.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Lo/Hi Region Shares by Load", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..last, 0.0..1.0)?;

    chart
        .configure_mesh()
        .x_labels(last)
        .x_label_formatter(&|x| x_labels.get(*x).cloned().unwrap_or_default())
        .x_desc("Number of Keys Inserted")
        .y_desc("Share of Entries")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    for (series, &name) in SERIES.iter().enumerate() {
        let color = &colors[series % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(line_width);

        chart
            .draw_series(LineSeries::new(
                samples.iter().enumerate().map(|(i, sample)| (i, series_value(sample, series))),
                line_style,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(samples.iter().enumerate().map(|(i, sample)| {
            Circle::new((i, series_value(sample, series)), marker_size, color.filled())
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    // Plot 2: chain lengths
    let root = BitMapBackend::new("chain_lengths.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_chain =
        samples.iter().map(|sample| sample.filled.longest_chain).max().unwrap_or(1) as f64 * 1.1; // Add 10% margin

    let mut chart = ChartBuilder::on(&root)
        .caption("Collision Chain Length by Load", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..last, 0.0..max_chain)?;

    chart
        .configure_mesh()
        .x_labels(last)
        .x_label_formatter(&|x| x_labels.get(*x).cloned().unwrap_or_default())
        .x_desc("Number of Keys Inserted")
        .y_desc("Entries per Chain")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    let chain_series: [(&str, fn(&Sample) -> f64); 2] = [
        ("Mean chain", |sample| sample.filled.mean_chain_len),
        ("Longest chain", |sample| sample.filled.longest_chain as f64),
    ];
    for (series, (name, value)) in chain_series.into_iter().enumerate() {
        let color = &colors[series % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(line_width);

        chart
            .draw_series(LineSeries::new(
                samples.iter().enumerate().map(|(i, sample)| (i, value(sample))),
                line_style,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            samples
                .iter()
                .enumerate()
                .map(|(i, sample)| Circle::new((i, value(sample)), marker_size, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    println!("Generated plot images: region_shares.png, chain_lengths.png");

    Ok(())
}

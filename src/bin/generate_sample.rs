//! Writes a deterministic synthetic sales dataset for trying the dashboard.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use clap::Parser;
use env_logger::Env;

use sales_dashboard::data::export::export_file;
use sales_dashboard::data::model::{SalesRecord, SalesTable, MAX_RATING};

/// Generate a synthetic sales dataset
#[derive(Parser, Debug)]
#[command(name = "generate-sample", version, about)]
struct Args {
    /// Output path (.csv, .json or .parquet)
    #[arg(short, long, default_value = "nike_sales_data.csv")]
    output: PathBuf,

    /// Number of months to generate, starting January 2023
    #[arg(short, long, default_value = "24")]
    months: u32,

    /// PRNG seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Leave out the Latitude / Longitude columns
    #[arg(long)]
    no_geo: bool,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (region, latitude, longitude, base monthly sales)
const REGIONS: &[(&str, f64, f64, f64)] = &[
    ("North America", 39.8, -98.6, 42_000.0),
    ("Europe", 50.1, 9.7, 31_000.0),
    ("Greater China", 35.9, 104.2, 24_000.0),
    ("Asia Pacific & Latin America", -14.2, -51.9, 15_000.0),
];

/// (product line, share of regional sales, mean rating)
const PRODUCT_LINES: &[(&str, f64, f64)] = &[
    ("Footwear", 0.55, 4.3),
    ("Apparel", 0.30, 3.9),
    ("Equipment", 0.15, 3.6),
];

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut rng = SimpleRng::new(args.seed);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid start date")?;

    let mut records = Vec::new();
    for month in 0..args.months {
        let date = start
            .checked_add_months(Months::new(month))
            .context("date out of range")?;
        // Gentle upward trend with a holiday bump in November / December.
        let seasonal = 1.0 + 0.01 * month as f64 + if month % 12 >= 10 { 0.25 } else { 0.0 };

        for &(region, lat, lon, base) in REGIONS {
            for &(product_line, share, rating) in PRODUCT_LINES {
                let sales = (base * share * seasonal * rng.gauss(1.0, 0.08)).max(0.0).round();
                let rating = (rng.gauss(rating, 0.35) * 10.0).round() / 10.0;

                records.push(SalesRecord {
                    date,
                    region: region.to_string(),
                    product_line: product_line.to_string(),
                    sales,
                    customer_rating: rating.clamp(0.0, MAX_RATING),
                    latitude: (!args.no_geo).then_some(lat),
                    longitude: (!args.no_geo).then_some(lon),
                });
            }
        }
    }

    let table = SalesTable::from_records(records, !args.no_geo);
    export_file(&table, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} sales records ({} months) to {}",
        table.len(),
        args.months,
        args.output.display()
    );
    Ok(())
}

//! Writes `sample_sales.csv`: a small, deterministic order log with a
//! categorical region/product, an ISO order date, a numeric year, a
//! high-cardinality customer id and a couple of measures.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};

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

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const ROWS: usize = 600;

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions = ["North", "South", "East", "West"];
    let products: [(&str, f64); 4] = [
        ("Widget", 19.0),
        ("Gadget", 49.0),
        ("Doohickey", 7.5),
        ("Gizmo", 99.0),
    ];
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid start date")?;

    let output_path = "sample_sales.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(["Order_Date", "Year", "Region", "Product", "Customer_ID", "Units", "Revenue"])?;

    for i in 0..ROWS {
        let date = start
            .checked_add_days(Days::new((i as u64 * 730) / ROWS as u64))
            .context("date out of range")?;
        let region = rng.pick(&regions);
        let (product, price) = *rng.pick(&products);
        let units = rng.gauss(12.0, 4.0).round().max(1.0);
        let revenue = (units * price * 100.0).round() / 100.0;

        writer.write_record([
            date.format("%Y-%m-%d").to_string(),
            date.format("%Y").to_string(),
            region.to_string(),
            product.to_string(),
            format!("C{:05}", rng.next_u64() % 100_000),
            units.to_string(),
            revenue.to_string(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {ROWS} orders to {output_path}");
    Ok(())
}

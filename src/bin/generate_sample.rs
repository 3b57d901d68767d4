use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const RECORD_COUNT: usize = 1500;

const FIRST_NAMES: [&str; 12] = [
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fabio", "Gabriela", "Heitor", "Isabel", "Joao",
    "Larissa", "Marcos",
];
const LAST_NAMES: [&str; 10] = [
    "Silva", "Santos", "Oliveira", "Souza", "Lima", "Pereira", "Costa", "Ferreira", "Almeida",
    "Ribeiro",
];
const CITIES: [&str; 7] = [
    "Sao Paulo",
    "Rio de Janeiro",
    "Belo Horizonte",
    "Recife",
    "Curitiba",
    "Salvador",
    "Porto Alegre",
];

/// Specialization and its typical consultation price.
const SPECIALIZATIONS: [(&str, f64); 14] = [
    ("Cardiologista", 320.0),
    ("Dermatologista", 280.0),
    ("Pediatra", 220.0),
    ("Ginecologista", 260.0),
    ("Psiquiatra", 380.0),
    ("Ortopedista", 300.0),
    ("Oftalmologista", 250.0),
    ("Neurologista", 350.0),
    ("Endocrinologista", 310.0),
    ("Urologista", 290.0),
    ("Psicologo", 180.0),
    ("Nutricionista", 160.0),
    ("Otorrinolaringologista", 270.0),
    ("Clinico Geral", 200.0),
];

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

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Row {
    name: String,
    city: &'static str,
    specialization: &'static str,
    reviews: i64,
    price: Option<f64>,
    telemedicine: i64,
    review_year: Option<String>,
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    (0..RECORD_COUNT)
        .map(|_| {
            let (specialization, base_price) = *rng.pick(&SPECIALIZATIONS);
            let name = format!("{} {}", rng.pick(&FIRST_NAMES), rng.pick(&LAST_NAMES));

            // A handful of missing and extreme prices exercise null handling
            // and the outlier summary.
            let price = if rng.chance(0.02) {
                None
            } else {
                let mut p = rng.gauss(base_price, base_price * 0.2).max(50.0);
                if rng.chance(0.01) {
                    p *= 5.0;
                }
                Some((p / 10.0).round() * 10.0)
            };

            let review_year = if rng.chance(0.03) {
                None
            } else {
                Some((2015 + rng.next_u64() % 10).to_string())
            };

            Row {
                name,
                city: *rng.pick(&CITIES),
                specialization,
                reviews: (rng.next_f64().powi(3) * 400.0) as i64,
                price,
                telemedicine: i64::from(rng.chance(0.45)),
                review_year,
            }
        })
        .collect()
}

const HEADER: [&str; 7] = [
    "name",
    "city1",
    "specialization",
    "reviews",
    "price",
    "telemedicine",
    "newest_review_date",
];

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record([
            row.name.clone(),
            row.city.to_string(),
            row.specialization.to_string(),
            row.reviews.to_string(),
            row.price.map(|p| p.to_string()).unwrap_or_default(),
            row.telemedicine.to_string(),
            row.review_year.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADER[0], DataType::Utf8, false),
        Field::new(HEADER[1], DataType::Utf8, false),
        Field::new(HEADER[2], DataType::Utf8, false),
        Field::new(HEADER[3], DataType::Int64, false),
        Field::new(HEADER[4], DataType::Float64, true),
        Field::new(HEADER[5], DataType::Int64, false),
        Field::new(HEADER[6], DataType::Utf8, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.name.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.city))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.specialization))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.reviews))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.price))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.telemedicine))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.review_year.as_deref()))),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv(&rows, "sample_doctors.csv")?;
    write_parquet(&rows, "sample_doctors.parquet")?;

    println!(
        "Wrote {} professionals to sample_doctors.csv and sample_doctors.parquet",
        rows.len()
    );
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{DateTime, Days, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic marketing-campaign dataset.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Output file; `.parquet` or `.csv`
    #[arg(default_value = "sample_campaigns.parquet")]
    output: PathBuf,

    /// Number of campaign rows
    #[arg(long, default_value_t = 120)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (splitmix64)
struct SimpleRng(u64);

impl SimpleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

struct Row {
    campaign: String,
    channel: &'static str,
    start: NaiveDate,
    end: NaiveDate,
    age_group: &'static str,
    gender: &'static str,
    location: &'static str,
    impressions: i64,
    clicks: i64,
    conversions: i64,
    spend: f64,
    revenue: f64,
}

const CHANNELS: [(&str, f64, f64); 5] = [
    // (name, base CTR, revenue per conversion)
    ("Email", 0.045, 85.0),
    ("Social Media", 0.018, 60.0),
    ("Search", 0.035, 110.0),
    ("Display", 0.006, 70.0),
    ("Influencer", 0.022, 95.0),
];
const AGE_GROUPS: [&str; 5] = ["18-24", "25-34", "35-44", "45-54", "55+"];
const GENDERS: [&str; 3] = ["Female", "Male", "Other"];
const LOCATIONS: [&str; 6] = ["New York", "London", "Berlin", "Tokyo", "Sydney", "Toronto"];
const THEMES: [&str; 8] = [
    "Spring Sale",
    "Summer Launch",
    "Back to School",
    "Black Friday",
    "Holiday Push",
    "Brand Awareness",
    "Loyalty Rewards",
    "New Arrivals",
];

fn generate(rows: usize, first_day: NaiveDate, rng: &mut SimpleRng) -> Vec<Row> {
    (0..rows)
        .map(|i| {
            let (channel, base_ctr, value_per_conv) = CHANNELS[i % CHANNELS.len()];
            let start = first_day + Days::new(rng.range(0.0, 540.0) as u64);
            let end = start + Days::new(rng.range(7.0, 60.0) as u64);

            let impressions = rng.range(5_000.0, 250_000.0).round();
            let clicks = (impressions * base_ctr * rng.range(0.6, 1.4)).round();
            let conversions = (clicks * rng.range(0.01, 0.12)).round();
            let spend = (clicks * rng.range(0.4, 2.5) * 100.0).round() / 100.0;
            let revenue =
                (conversions * value_per_conv * rng.range(0.7, 1.3) * 100.0).round() / 100.0;

            Row {
                campaign: format!("{} {}", rng.pick(&THEMES), start.format("%Y")),
                channel,
                start,
                end,
                age_group: rng.pick(&AGE_GROUPS),
                gender: rng.pick(&GENDERS),
                location: rng.pick(&LOCATIONS),
                impressions: impressions as i64,
                clicks: clicks as i64,
                conversions: conversions as i64,
                spend,
                revenue,
            }
        })
        .collect()
}

fn to_batch(rows: &[Row]) -> Result<RecordBatch> {
    let epoch = DateTime::UNIX_EPOCH.date_naive();
    let days = |d: NaiveDate| (d - epoch).num_days() as i32;
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let count = |f: fn(&Row) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Campaign_Name", DataType::Utf8, false),
        Field::new("Marketing_Channel", DataType::Utf8, false),
        Field::new("Start_Date", DataType::Date32, false),
        Field::new("End_Date", DataType::Date32, false),
        Field::new("Age_Group", DataType::Utf8, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Location", DataType::Utf8, false),
        Field::new("Impressions", DataType::Int64, false),
        Field::new("Clicks", DataType::Int64, false),
        Field::new("Conversions", DataType::Int64, false),
        Field::new("Total_Spend", DataType::Float64, false),
        Field::new("Revenue_Generated", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            text(|r| r.campaign.as_str()),
            text(|r| r.channel),
            Arc::new(Date32Array::from(rows.iter().map(|r| days(r.start)).collect::<Vec<_>>())),
            Arc::new(Date32Array::from(rows.iter().map(|r| days(r.end)).collect::<Vec<_>>())),
            text(|r| r.age_group),
            text(|r| r.gender),
            text(|r| r.location),
            count(|r| r.impressions),
            count(|r| r.clicks),
            count(|r| r.conversions),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.spend).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.revenue).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;
    Ok(batch)
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating writer")?;
    writer.write(batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating output file")?;
    writer.write_record([
        "Campaign_Name",
        "Marketing_Channel",
        "Start_Date",
        "End_Date",
        "Age_Group",
        "Gender",
        "Location",
        "Impressions",
        "Clicks",
        "Conversions",
        "Total_Spend",
        "Revenue_Generated",
    ])?;
    for r in rows {
        writer.write_record([
            r.campaign.clone(),
            r.channel.to_string(),
            r.start.to_string(),
            r.end.to_string(),
            r.age_group.to_string(),
            r.gender.to_string(),
            r.location.to_string(),
            r.impressions.to_string(),
            r.clicks.to_string(),
            r.conversions.to_string(),
            format!("{:.2}", r.spend),
            format!("{:.2}", r.revenue),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = SimpleRng(args.seed);
    let first_day = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid first campaign day")?;
    let rows = generate(args.rows, first_day, &mut rng);
    let batch = to_batch(&rows)?;

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&args.output, &batch)?,
        "csv" => write_csv(&args.output, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    let preview = pretty_format_batches(&[batch.slice(0, rows.len().min(5))])?;
    log::info!("Preview:\n{preview}");
    println!("Wrote {} campaign rows to {}", rows.len(), args.output.display());
    Ok(())
}

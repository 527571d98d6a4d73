use std::fs::File;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array,
    Int64Array, LargeStringArray, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray, UInt32Array,
    UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{columns, CampaignRecord, CellValue, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a campaign dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row naming every required column
/// * `.json`    – `[{ "Campaign_Name": ..., "Impressions": ..., ... }, ...]`
/// * `.parquet` – one column per required field (Utf8, Int, Float, Date32 or Timestamp)
///
/// Spreadsheets (`.xlsx`) must be exported to one of these first.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }?;

    log::info!(
        "Loaded {} campaign rows from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Position of every required column within `names`, in [`columns::REQUIRED`] order.
fn resolve_columns(names: &[&str]) -> Result<Vec<usize>, LoadError> {
    columns::REQUIRED
        .iter()
        .map(|required| {
            names
                .iter()
                .position(|name| name.trim() == *required)
                .ok_or_else(|| LoadError::MissingColumn(required.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    read_csv(open(path)?)
}

/// Parse CSV text.  Every cell starts out as text; empty cells become nulls.
pub(crate) fn read_csv<R: std::io::Read>(source: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| LoadError::parse("CSV", e))?
        .clone();
    let names: Vec<&str> = headers.iter().collect();
    let indices = resolve_columns(&names)?;

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row_no = i + 1;
        let record = result.map_err(|e| LoadError::parse("CSV", format!("row {row_no}: {e}")))?;

        let cells: Vec<CellValue> = indices
            .iter()
            .map(|&idx| match record.get(idx) {
                Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
                _ => CellValue::Null,
            })
            .collect();

        records.push(CampaignRecord::from_cells(row_no, &cells)?);
    }

    Ok(Dataset::new(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Campaign_Name": "Spring Sale",
///     "Marketing_Channel": "Email",
///     "Start_Date": "2024-03-15",
///     "Impressions": 1000,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_json(&text)
}

/// An empty array carries no keys to check and loads as an empty dataset.
pub(crate) fn read_json(text: &str) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_str(text).map_err(|e| LoadError::parse("JSON", e))?;

    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::parse("JSON", "expected a top-level array"))?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 1;
        let obj = row
            .as_object()
            .ok_or_else(|| LoadError::parse("JSON", format!("row {row_no} is not an object")))?;

        let mut cells = Vec::with_capacity(columns::REQUIRED.len());
        for name in columns::REQUIRED {
            let value = obj
                .get(name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
            cells.push(json_to_cell(value));
        }

        records.push(CampaignRecord::from_cells(row_no, &cells)?);
    }

    Ok(Dataset::new(records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => match s.trim() {
            "" => CellValue::Null,
            trimmed => CellValue::Text(trimmed.to_string()),
        },
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars
/// (`df.write_parquet()`).  Categorical columns arrive dictionary-encoded and
/// are cast to plain strings before reading.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::parse("Parquet", e))?;

    // A file without row groups yields no batches; check the schema itself.
    let indices = {
        let schema = builder.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        resolve_columns(&names)?
    };
    let reader = builder.build().map_err(|e| LoadError::parse("Parquet", e))?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::parse("Parquet", e))?;

        let cols: Vec<ArrayRef> = indices
            .iter()
            .map(|&idx| {
                let col = batch.column(idx);
                match col.data_type() {
                    DataType::Dictionary(_, _) => arrow::compute::cast(col, &DataType::Utf8)
                        .map_err(|e| LoadError::parse("Parquet", e)),
                    _ => Ok(col.clone()),
                }
            })
            .collect::<Result<_, _>>()?;

        for row in 0..batch.num_rows() {
            let cells: Vec<CellValue> = cols.iter().map(|col| extract_cell(col, row)).collect();
            let row_no = records.len() + 1;
            records.push(CampaignRecord::from_cells(row_no, &cells)?);
        }
    }

    Ok(Dataset::new(records))
}

fn downcast<T: 'static>(col: &ArrayRef) -> Option<&T> {
    col.as_any().downcast_ref::<T>()
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }

    let value = match col.data_type() {
        DataType::Utf8 => {
            downcast::<StringArray>(col).map(|a| CellValue::Text(a.value(row).to_string()))
        }
        DataType::LargeUtf8 => {
            downcast::<LargeStringArray>(col).map(|a| CellValue::Text(a.value(row).to_string()))
        }
        DataType::Int32 => {
            downcast::<Int32Array>(col).map(|a| CellValue::Integer(a.value(row) as i64))
        }
        DataType::Int64 => downcast::<Int64Array>(col).map(|a| CellValue::Integer(a.value(row))),
        DataType::UInt32 => {
            downcast::<UInt32Array>(col).map(|a| CellValue::Integer(a.value(row) as i64))
        }
        DataType::UInt64 => downcast::<UInt64Array>(col).map(|a| match i64::try_from(a.value(row)) {
            Ok(i) => CellValue::Integer(i),
            Err(_) => CellValue::Float(a.value(row) as f64),
        }),
        DataType::Float32 => {
            downcast::<Float32Array>(col).map(|a| CellValue::Float(a.value(row) as f64))
        }
        DataType::Float64 => downcast::<Float64Array>(col).map(|a| CellValue::Float(a.value(row))),
        DataType::Date32 => downcast::<Date32Array>(col)
            .and_then(|a| date32_to_datetime(a.value(row)))
            .map(|dt| CellValue::Date(dt.date())),
        DataType::Date64 => downcast::<Date64Array>(col)
            .and_then(|a| date64_to_datetime(a.value(row)))
            .map(|dt| CellValue::Date(dt.date())),
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => downcast::<TimestampSecondArray>(col)
                    .and_then(|a| timestamp_s_to_datetime(a.value(row))),
                TimeUnit::Millisecond => downcast::<TimestampMillisecondArray>(col)
                    .and_then(|a| timestamp_ms_to_datetime(a.value(row))),
                TimeUnit::Microsecond => downcast::<TimestampMicrosecondArray>(col)
                    .and_then(|a| timestamp_us_to_datetime(a.value(row))),
                TimeUnit::Nanosecond => downcast::<TimestampNanosecondArray>(col)
                    .and_then(|a| timestamp_ns_to_datetime(a.value(row))),
            };
            datetime.map(|dt| CellValue::Date(dt.date()))
        }
        _ => None,
    };

    value.unwrap_or_else(|| CellValue::Text(format!("{:?}", col.data_type())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::DictionaryArray;
    use arrow::datatypes::{Field, Int32Type, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "Campaign_Name,Marketing_Channel,Start_Date,End_Date,Age_Group,Gender,Location,Impressions,Clicks,Conversions,Total_Spend,Revenue_Generated";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_csv_with_extra_columns_and_any_order() {
        let csv = format!(
            "Notes,{HEADER}\n\
             ignored,Spring,Email,2024-03-15,2024-03-30,18-24,Male,Paris,1000,50,5,100.0,500.0\n\
             ignored,Summer,Social,2024-06-01 00:00:00,2024-06-20,25-34,Female,Rome,\"2,000\",100,20,300,1800\n"
        );
        let file = write_temp(".csv", &csv);

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].marketing_channel, "Social");
        assert_eq!(ds.records[1].impressions, 2000);
        assert_eq!(
            ds.records[1].start_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn csv_missing_column_is_reported_by_name() {
        let header = HEADER.replace(",Revenue_Generated", "");
        let err = read_csv(format!("{header}\n").as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "Revenue_Generated"));
    }

    #[test]
    fn csv_bad_cell_reports_row_and_column() {
        let csv = format!(
            "{HEADER}\nSpring,Email,2024-03-15,2024-03-30,18-24,Male,Paris,1000,lots,5,100,500\n"
        );
        let err = read_csv(csv.as_bytes()).unwrap_err();
        match err {
            LoadError::InvalidValue { row, column, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Clicks");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_records_oriented_json() {
        let json = r#"[
            {"Campaign_Name": "Spring", "Marketing_Channel": "Email",
             "Start_Date": "2024-03-15T00:00:00.000", "End_Date": "2024-03-30",
             "Age_Group": "18-24", "Gender": "Male", "Location": "Paris",
             "Impressions": 1000, "Clicks": 50, "Conversions": 5.0,
             "Total_Spend": 100.5, "Revenue_Generated": 500}
        ]"#;
        let ds = read_json(json).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].conversions, 5);
        assert_eq!(ds.records[0].total_spend, 100.5);
    }

    #[test]
    fn json_row_without_required_key_fails() {
        let json = r#"[{"Campaign_Name": "Spring"}]"#;
        assert!(matches!(
            read_json(json).unwrap_err(),
            LoadError::MissingColumn(_)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn spreadsheet_extension_is_unsupported() {
        let err = load_file(Path::new("campaigns.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ref e) if e == "xlsx"));
    }

    #[test]
    fn loads_parquet_with_dates_and_dictionary_strings() {
        let text = |name: &str| Field::new(name, DataType::Utf8, false);
        let schema = Arc::new(Schema::new(vec![
            text(columns::CAMPAIGN_NAME),
            Field::new(
                columns::MARKETING_CHANNEL,
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                false,
            ),
            Field::new(columns::START_DATE, DataType::Date32, false),
            Field::new(
                columns::END_DATE,
                DataType::Timestamp(TimeUnit::Nanosecond, None),
                false,
            ),
            text(columns::AGE_GROUP),
            text(columns::GENDER),
            text(columns::LOCATION),
            Field::new(columns::IMPRESSIONS, DataType::Int64, false),
            Field::new(columns::CLICKS, DataType::Int64, false),
            Field::new(columns::CONVERSIONS, DataType::Int32, false),
            Field::new(columns::TOTAL_SPEND, DataType::Float64, false),
            Field::new(columns::REVENUE_GENERATED, DataType::Float64, false),
        ]));

        let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let start_days = (start - epoch).num_days() as i32;
        let end_ns = (start_days as i64 + 10) * 86_400 * 1_000_000_000;

        let channels: DictionaryArray<Int32Type> = vec!["Email", "Email"].into_iter().collect();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(channels),
                Arc::new(Date32Array::from(vec![start_days, start_days])),
                Arc::new(TimestampNanosecondArray::from(vec![end_ns, end_ns])),
                Arc::new(StringArray::from(vec!["18-24", "25-34"])),
                Arc::new(StringArray::from(vec!["Male", "Female"])),
                Arc::new(StringArray::from(vec!["Paris", "Rome"])),
                Arc::new(Int64Array::from(vec![1000, 2000])),
                Arc::new(Int64Array::from(vec![50, 100])),
                Arc::new(Int32Array::from(vec![5, 20])),
                Arc::new(Float64Array::from(vec![100.0, 300.0])),
                Arc::new(Float64Array::from(vec![500.0, 1800.0])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let sink = file.as_file().try_clone().unwrap();
        let mut writer = ArrowWriter::try_new(sink, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].marketing_channel, "Email");
        assert_eq!(ds.records[0].start_date, start);
        assert_eq!(
            ds.records[0].end_date,
            NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()
        );
        assert_eq!(ds.records[1].conversions, 20);
    }

    #[test]
    fn parquet_without_rows_still_needs_every_column() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            columns::CAMPAIGN_NAME,
            DataType::Utf8,
            false,
        )]));

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let sink = file.as_file().try_clone().unwrap();
        let writer = ArrowWriter::try_new(sink, schema, None).unwrap();
        writer.close().unwrap();

        let err = load_file(file.path()).unwrap_err();
        assert!(
            matches!(err, LoadError::MissingColumn(ref c) if c == columns::MARKETING_CHANNEL),
            "unexpected result: {err}"
        );
    }

    #[test]
    fn empty_json_array_is_an_empty_dataset() {
        assert!(read_json("[]").unwrap().is_empty());
    }

    #[test]
    fn json_bad_cell_reports_one_based_row() {
        let json = r#"[
            {"Campaign_Name": "Spring", "Marketing_Channel": "Email",
             "Start_Date": "2024-03-15", "End_Date": "2024-03-30",
             "Age_Group": "18-24", "Gender": "Male", "Location": "Paris",
             "Impressions": 1000, "Clicks": 50, "Conversions": 5,
             "Total_Spend": 100, "Revenue_Generated": 500},
            {"Campaign_Name": "Summer", "Marketing_Channel": "Email",
             "Start_Date": "someday", "End_Date": "2024-06-30",
             "Age_Group": "18-24", "Gender": "Male", "Location": "Paris",
             "Impressions": 1000, "Clicks": 50, "Conversions": 5,
             "Total_Spend": 100, "Revenue_Generated": 500}
        ]"#;
        let err = read_json(json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 2, ref column, .. } if column == "Start_Date"));
    }

    #[test]
    fn json_and_csv_categories_trim_alike() {
        let json = r#"[
            {"Campaign_Name": " Spring ", "Marketing_Channel": " Email ",
             "Start_Date": " 2024-03-15 ", "End_Date": "2024-03-30",
             "Age_Group": "18-24", "Gender": "Male", "Location": "Paris",
             "Impressions": " 1,000 ", "Clicks": 50, "Conversions": 5,
             "Total_Spend": 100, "Revenue_Generated": 500}
        ]"#;
        let csv = format!(
            "{HEADER}\n Spring , Email ,2024-03-15,2024-03-30,18-24,Male,Paris,1000,50,5,100,500\n"
        );

        let from_json = read_json(json).unwrap();
        let from_csv = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(from_json.records[0].marketing_channel, "Email");
        assert_eq!(from_json.records[0].campaign_name, from_csv.records[0].campaign_name);
        assert_eq!(
            from_json.records[0].marketing_channel,
            from_csv.records[0].marketing_channel
        );
        assert_eq!(from_json.records[0].impressions, 1000);
    }
}

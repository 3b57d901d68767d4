use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DatasetStore, Record};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal dataset loading failure. Nothing is returned on error: a load is
/// all-or-nothing.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("reading Arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: invalid value {value} in column '{column}'")]
    InvalidField {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("unexpected layout: {0}")]
    InvalidShape(String),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one professional per line (recommended)
/// * `.json`    – `[{ "name": ..., "city1": ..., ... }, ...]`
/// * `.parquet` – one column per field, as written by Pandas or Polars
pub fn load_file(path: &Path) -> Result<DatasetStore, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !matches!(ext.as_str(), "csv" | "json" | "parquet" | "pq") {
        return Err(LoadError::UnsupportedFormat(ext));
    }

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = match ext.as_str() {
        "csv" => read_csv(file)?,
        "json" => read_json(file)?,
        _ => read_parquet(file)?,
    };

    info!(
        "loaded {} records from {} ({ext})",
        records.len(),
        path.display()
    );
    Ok(DatasetStore::from_records(records))
}

/// Load a CSV dataset from any reader.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<DatasetStore, LoadError> {
    Ok(DatasetStore::from_records(read_csv(reader)?))
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    City,
    Specialization,
    Reviews,
    Price,
    Telemedicine,
    ReviewYear,
}

impl Column {
    const ALL: [Column; 7] = [
        Column::Name,
        Column::City,
        Column::Specialization,
        Column::Reviews,
        Column::Price,
        Column::Telemedicine,
        Column::ReviewYear,
    ];

    /// Accepted header names; the first one is canonical.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Name => &["name"],
            Column::City => &["city1", "city"],
            Column::Specialization => &["specialization"],
            Column::Reviews => &["reviews"],
            Column::Price => &["price"],
            Column::Telemedicine => &["telemedicine"],
            Column::ReviewYear => &["newest_review_date", "latest_review_year"],
        }
    }

    fn label(self) -> &'static str {
        self.aliases()[0]
    }
}

/// Position of every required column in `headers`, in [`Column::ALL`] order.
fn locate_columns(headers: &[String]) -> Result<[usize; 7], LoadError> {
    let mut positions = [0usize; 7];
    for (slot, column) in positions.iter_mut().zip(Column::ALL) {
        *slot = headers
            .iter()
            .position(|h| column.aliases().contains(&h.as_str()))
            .ok_or(LoadError::MissingColumn(column.label()))?;
    }
    Ok(positions)
}

// ---------------------------------------------------------------------------
// Cell – one raw source value before coercion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    #[default]
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s:?}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

impl Cell {
    /// CSV cells stay textual; only the empty string is null.
    fn from_text(s: &str) -> Cell {
        if s.is_empty() {
            Cell::Null
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn from_json(val: &JsonValue) -> Cell {
        match val {
            JsonValue::String(s) => Cell::Text(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Cell::Float(f)
                } else {
                    Cell::Text(n.to_string())
                }
            }
            JsonValue::Bool(b) => Cell::Bool(*b),
            JsonValue::Null => Cell::Null,
            other => Cell::Text(other.to_string()),
        }
    }

    fn into_text(self) -> String {
        match self {
            Cell::Text(s) => s,
            Cell::Integer(i) => i.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Null => String::new(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Cell::Float(v) => *v,
            Cell::Integer(i) => *i as f64,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Bool(_) | Cell::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Integral value, accepting floats such as `12.0` written by Pandas.
    fn as_integral(&self) -> Option<i64> {
        match self {
            Cell::Integer(i) => return Some(*i),
            Cell::Text(s) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Some(i);
                }
            }
            _ => {}
        }
        let v = self.as_f64()?;
        (v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
    }

    fn to_price(&self) -> Option<f64> {
        self.as_f64()
    }

    fn to_reviews(&self) -> Option<u32> {
        self.as_integral().and_then(|i| u32::try_from(i).ok())
    }

    fn to_flag(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Cell::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => match self.as_integral()? {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
        }
    }

    /// A bare four-digit year (`"2021"`, `2021`, `2021.0`).
    fn to_year(&self) -> Option<i32> {
        if let Cell::Text(s) = self {
            let s = s.trim();
            if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
                return s.parse().ok();
            }
        }
        self.as_integral()
            .filter(|y| (1000..=9999).contains(y))
            .and_then(|y| i32::try_from(y).ok())
    }
}

/// Coerce one row of raw cells (in [`Column::ALL`] order) into a [`Record`].
///
/// Only `reviews` is strict; price, telemedicine and year fall back to
/// `None` and the record is kept.
fn build_record(row: usize, cells: [Cell; 7]) -> Result<Record, LoadError> {
    let [name, city, specialization, reviews, price, telemedicine, year] = cells;

    let reviews = reviews.to_reviews().ok_or_else(|| LoadError::InvalidField {
        row,
        column: Column::Reviews.label(),
        value: reviews.to_string(),
    })?;

    let price_value = price.to_price();
    if price_value.is_none() && price != Cell::Null {
        debug!("row {row}: price {price} is not a number, stored as null");
    }
    let flag = telemedicine.to_flag();
    if flag.is_none() && telemedicine != Cell::Null {
        debug!("row {row}: telemedicine {telemedicine} is not 0/1, stored as null");
    }
    let year_value = year.to_year();
    if year_value.is_none() && year != Cell::Null {
        debug!("row {row}: review date {year} is not a year, stored as null");
    }

    Ok(Record {
        name: name.into_text(),
        city: city.into_text(),
        specialization: specialization.into_text(),
        reviews,
        price: price_value,
        telemedicine: flag,
        latest_review_year: year_value,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, extra columns are ignored.
fn read_csv<R: Read>(source: R) -> Result<Vec<Record>, LoadError> {
    let mut reader = csv::Reader::from_reader(source);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let positions = locate_columns(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result?;
        let cells = positions.map(|idx| Cell::from_text(row.get(idx).unwrap_or("")));
        records.push(build_record(row_no, cells)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "Ana", "city1": "Recife", "specialization": "Cardiologista",
///     "reviews": 12, "price": 250.0, "telemedicine": 1,
///     "newest_review_date": "2023" },
///   ...
/// ]
/// ```
fn read_json<R: Read>(source: R) -> Result<Vec<Record>, LoadError> {
    let root: JsonValue = serde_json::from_reader(source)?;
    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidShape("expected a top-level JSON array".into()))?;

    let mut records = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| LoadError::InvalidShape(format!("row {row_no} is not a JSON object")))?;

        let mut cells: [Cell; 7] = Default::default();
        for (slot, column) in cells.iter_mut().zip(Column::ALL) {
            let value = column
                .aliases()
                .iter()
                .find_map(|alias| obj.get(*alias))
                .ok_or(LoadError::MissingColumn(column.label()))?;
            *slot = Cell::from_json(value);
        }
        records.push(build_record(row_no, cells)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), including dictionary-encoded
/// `category` columns and string views.
fn read_parquet(file: File) -> Result<Vec<Record>, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let positions = locate_columns(&headers)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns = positions
            .iter()
            .zip(Column::ALL)
            .map(|(&idx, column)| normalize_column(batch.column(idx), column))
            .collect::<Result<Vec<ArrayRef>, LoadError>>()?;

        for row in 0..batch.num_rows() {
            let cells = std::array::from_fn(|i| cell_from_arrow(&columns[i], row));
            records.push(build_record(records.len(), cells)?);
        }
    }
    Ok(records)
}

/// Cast `col` to one of the types [`cell_from_arrow`] reads.
///
/// Dictionaries are unpacked, string views become `Utf8`, narrow and
/// unsigned integers become `Int64` and `Float16` becomes `Float64`. Any
/// other type is an error naming the column.
fn normalize_column(col: &ArrayRef, column: Column) -> Result<ArrayRef, LoadError> {
    let target = match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int32
        | DataType::Int64
        | DataType::Float32
        | DataType::Float64
        | DataType::Boolean => return Ok(col.clone()),
        DataType::Dictionary(_, values) => {
            let unpacked = cast(col, values)?;
            return normalize_column(&unpacked, column);
        }
        DataType::Utf8View | DataType::Null => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 => DataType::Float64,
        other => {
            return Err(LoadError::InvalidShape(format!(
                "column '{}' has unsupported type {other:?}",
                column.label()
            )));
        }
    };
    debug!(
        "casting column '{}' from {:?} to {target:?}",
        column.label(),
        col.data_type()
    );
    Ok(cast(col, &target)?)
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn cell_from_arrow(col: &ArrayRef, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(Cell::Null, |arr| Cell::Integer(arr.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(Cell::Null, |arr| Cell::Integer(arr.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(Cell::Null, |arr| Cell::Float(arr.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(Cell::Null, |arr| Cell::Float(arr.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(Cell::Null, |arr| Cell::Bool(arr.value(row))),
        _ => Cell::Null,
    }
}

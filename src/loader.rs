//! Reads record files into a collection plus one column descriptor per field.

use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::column::Column;
use crate::domain::TableError;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

/// A loaded file: its records and a descriptor for every field.
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub records: Vec<Record>,
    pub columns: Vec<Column>,
}

// One materialised file column.
struct LoadedColumn {
    name: String,
    numeric: bool,
    values: Vec<Value>,
}

pub fn detect_file_type(path: &Path) -> Result<FileType, TableError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(TableError::UnknownFileType),
    }
}

pub fn get_file_info(path: PathBuf) -> Result<FileInfo, TableError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TableError::FileNotFound,
        ErrorKind::PermissionDenied => TableError::PermissionDenied,
        _ => TableError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TableError::LoadingFailed("Not a file!".into()));
    }

    let file_type = detect_file_type(&path)?;
    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}

pub fn load(path: PathBuf) -> Result<Dataset, TableError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?}", file_info);
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;

    // Each column is converted on its own thread.
    let loaded: Result<Vec<LoadedColumn>, PolarsError> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let loaded = loaded?;

    let records = into_records(&loaded, df.height());
    let columns = loaded
        .iter()
        .map(|c| Column::key(c.name.clone()).align_right(c.numeric))
        .collect();

    info!(
        "Loaded {} records with {} columns in {}ms",
        records.len(),
        loaded.len(),
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string();
    Ok(Dataset {
        name,
        records,
        columns,
    })
}

fn into_records(columns: &[LoadedColumn], height: usize) -> Vec<Record> {
    (0..height)
        .map(|ridx| {
            columns
                .iter()
                .map(|c| (c.name.clone(), c.values[ridx].clone()))
                .collect()
        })
        .collect()
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
    let dtype = df.column(col_name)?.dtype().clone();
    let numeric = is_numeric_type(&dtype);
    let boolean = dtype == DataType::Boolean;

    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let values = series
        .into_iter()
        .map(|value| match value {
            None => Value::Empty,
            Some(s) if numeric => s
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::Text(s.to_string())),
            Some(s) if boolean => Value::Bool(s == "true"),
            Some(s) => Value::Text(s.to_string()),
        })
        .collect();

    Ok(LoadedColumn {
        name: col_name.to_string(),
        numeric,
        values,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

//! CSV persistence for raw and ingested partitions.

use std::path::Path;

use super::error::DatasetError;
use super::frame::{Column, ColumnData, DataFrame};

const NULL_TOKENS: &[&str] = &["", "NaN", "nan", "na", "NA"];

/// Write a frame as CSV with a header row, creating parent directories.
pub fn write_csv(frame: &DataFrame, path: &Path) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(frame.column_names())?;
    for row in 0..frame.n_rows() {
        writer.write_record(frame.columns().iter().map(|c| c.data.cell_string(row)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a CSV written by [`write_csv`] (or any headered CSV), inferring
/// column storage types from the cell text.
pub fn read_csv(path: &Path) -> Result<DataFrame, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DatasetError::MalformedCsv {
                path: path.to_path_buf(),
                reason: format!(
                    "row {} has {} fields, header has {}",
                    line + 1,
                    record.len(),
                    headers.len()
                ),
            });
        }
        for (j, field) in record.iter().enumerate() {
            cells[j].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, infer_text_column(values)))
        .collect();
    DataFrame::new(columns)
}

fn infer_text_column(values: Vec<String>) -> ColumnData {
    let is_null = |s: &str| NULL_TOKENS.contains(&s);
    let has_null = values.iter().any(|v| is_null(v));

    if !has_null && values.iter().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnData::Int64(values.iter().filter_map(|v| v.parse().ok()).collect());
    }
    if !values.is_empty()
        && !has_null
        && values
            .iter()
            .all(|v| matches!(v.as_str(), "True" | "False" | "true" | "false"))
    {
        return ColumnData::Bool(
            values
                .iter()
                .map(|v| v.eq_ignore_ascii_case("true"))
                .collect(),
        );
    }
    if values
        .iter()
        .all(|v| is_null(v) || v.parse::<f64>().is_ok())
    {
        return ColumnData::Float64(
            values
                .iter()
                .map(|v| {
                    if is_null(v) {
                        f64::NAN
                    } else {
                        v.parse().unwrap_or(f64::NAN)
                    }
                })
                .collect(),
        );
    }
    ColumnData::Object(values)
}

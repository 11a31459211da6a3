//! 検索対象ロケーションの読み込み。
use std::{fs::File, io::Read, path::Path};

use csv::ReaderBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationsError {
    #[error("failed to open locations file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read locations CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("column {column:?} not found in CSV header")]
    MissingColumn { column: String },
}

/// CSVファイルの指定列をロケーション一覧として読み込む。
///
/// # Errors
/// ファイルが開けない、CSVとして壊れている、列が存在しない場合は [`LocationsError`] を返す。
pub fn load_csv_column(path: &Path, column: &str) -> Result<Vec<String>, LocationsError> {
    let file = File::open(path).map_err(|source| LocationsError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_csv_column(file, column)
}

/// ヘッダー名で列を探し、空でない値を行順に返す。
///
/// # Errors
/// CSVの読み込みに失敗した場合、または列が見つからない場合は [`LocationsError`] を返す。
pub fn read_csv_column<R: Read>(reader: R, column: &str) -> Result<Vec<String>, LocationsError> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| LocationsError::MissingColumn {
            column: column.to_string(),
        })?;

    let mut locations = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(index).filter(|value| !value.is_empty()) {
            locations.push(value.to_string());
        }
    }
    Ok(locations)
}

/// 各ロケーションの末尾に国名などの接尾辞を付ける。
#[must_use]
pub fn apply_suffix(locations: Vec<String>, suffix: &str) -> Vec<String> {
    if suffix.is_empty() {
        return locations;
    }
    locations
        .into_iter()
        .map(|location| format!("{location}{suffix}"))
        .collect()
}

use crate::domain::model::RawRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{AnnotateError, Result};
use crate::utils::validation::validate_file_extension;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    JsonLines,
    JsonArray,
    Csv,
}

impl RecordFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        validate_file_extension("bio_file", Path::new(path), &["jsonl", "json", "csv"]).map_err(|_| {
            AnnotateError::UnsupportedFormatError {
                path: path.to_string(),
            }
        })?;

        if path.ends_with(".jsonl") {
            Ok(Self::JsonLines)
        } else if path.ends_with(".json") {
            Ok(Self::JsonArray)
        } else {
            Ok(Self::Csv)
        }
    }
}

/// 每行一個 JSON 物件，空白行略過
pub fn parse_json_lines(path: &str, data: &[u8]) -> Result<Vec<RawRecord>> {
    let text = std::str::from_utf8(data).map_err(|e| AnnotateError::RecordError {
        path: path.to_string(),
        line: 0,
        message: format!("not valid UTF-8: {}", e),
    })?;

    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| AnnotateError::RecordError {
            path: path.to_string(),
            line: index + 1,
            message: e.to_string(),
        })?;
        match value {
            Value::Object(obj) => records.push(obj),
            _ => {
                return Err(AnnotateError::RecordError {
                    path: path.to_string(),
                    line: index + 1,
                    message: "expected a JSON object".to_string(),
                })
            }
        }
    }
    Ok(records)
}

pub fn parse_json_array(path: &str, data: &[u8]) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_slice(data)?;
    let Value::Array(items) = value else {
        return Err(AnnotateError::RecordError {
            path: path.to_string(),
            line: 1,
            message: "expected a JSON array of objects".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => Ok(obj),
            _ => Err(AnnotateError::RecordError {
                path: path.to_string(),
                line: index + 1,
                message: "array element is not a JSON object".to_string(),
            }),
        })
        .collect()
}

/// CSV 第一行為欄位名稱；空白欄位視為 null
pub fn parse_csv(data: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = RawRecord::new();
        for (header, field) in headers.iter().zip(row.iter()) {
            let value = if field.is_empty() {
                Value::Null
            } else {
                Value::String(field.to_string())
            };
            record.insert(header.to_string(), value);
        }
        records.push(record);
    }
    Ok(records)
}

pub async fn read_records<S: Storage>(storage: &S, path: &str, format: RecordFormat) -> Result<Vec<RawRecord>> {
    let data = storage.read_file(path).await?;
    let records = match format {
        RecordFormat::JsonLines => parse_json_lines(path, &data)?,
        RecordFormat::JsonArray => parse_json_array(path, &data)?,
        RecordFormat::Csv => parse_csv(&data)?,
    };
    tracing::debug!("Read {} records from {}", records.len(), path);
    Ok(records)
}

pub async fn read_json_lines<S: Storage>(storage: &S, path: &str) -> Result<Vec<RawRecord>> {
    read_records(storage, path, RecordFormat::JsonLines).await
}

/// 依副檔名判斷格式
pub async fn read_bio_file<S: Storage>(storage: &S, path: &str) -> Result<Vec<RawRecord>> {
    let format = RecordFormat::from_path(path)?;
    read_records(storage, path, format).await
}

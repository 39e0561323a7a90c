//! File generation: CSV and JSON exports
//!
//! Exports are built in memory and returned as a downloadable body with a
//! `Content-Disposition` filename.

pub mod csv;
pub mod json;

pub use csv::{CsvColumn, count_records, to_csv, to_csv_with_columns, values_to_csv};
pub use json::{ExportDocument, to_json};

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(other.to_string()),
        }
    }
}

/// A generated file ready to be downloaded
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl ExportFile {
    pub fn new(filename: impl Into<String>, content_type: &'static str, body: String) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            body,
        }
    }

    /// Number of data rows (CSV) or elements (JSON array)
    pub fn record_count(&self) -> usize {
        if self.content_type.starts_with("text/csv") {
            count_records(&self.body).saturating_sub(1)
        } else {
            serde_json::from_str::<serde_json::Value>(&self.body)
                .ok()
                .and_then(|v| v.as_array().map(Vec::len))
                .unwrap_or(0)
        }
    }
}

impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        let mut response = self.body.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

/// `<stem>-YYYY-MM-DD.<ext>`
pub fn dated_filename(stem: &str, format: ExportFormat) -> String {
    format!(
        "{}-{}.{}",
        stem,
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    )
}

/// Export every row with all of its serialized fields
pub fn export_rows<T: Serialize>(
    stem: &str,
    rows: &[T],
    format: ExportFormat,
) -> anyhow::Result<ExportFile> {
    let body = match format {
        ExportFormat::Csv => to_csv(rows)?,
        ExportFormat::Json => to_json(rows)?,
    };
    Ok(ExportFile::new(
        dated_filename(stem, format),
        format.content_type(),
        body,
    ))
}

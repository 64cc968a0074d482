//! Response formatting: JSON is required, CSV is declared but left
//! unimplemented per the source, surfaced as a [`FormatError`] that the
//! dispatcher turns into a 404.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::FormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        match raw {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(FormatError::Unknown(other.to_string())),
        }
    }
}

#[derive(Serialize)]
struct ResultItem {
    id: u64,
    dist: u64,
    fields: HashMap<String, String>,
}

#[derive(Serialize)]
struct Response {
    result: Vec<ResultItem>,
}

/// Renders `rows` (id, distance, attribute-row triples) under `fmt`,
/// returning the body plus its `Content-Type`.
pub fn render(
    fmt: Format,
    field_names: &[String],
    rows: Vec<(u64, u64, Vec<String>)>,
) -> Result<(String, &'static str), FormatError> {
    match fmt {
        Format::Json => Ok((render_json(field_names, rows), "application/json")),
        Format::Csv => Err(FormatError::Unsupported("csv")),
    }
}

fn render_json(field_names: &[String], rows: Vec<(u64, u64, Vec<String>)>) -> String {
    let result = rows
        .into_iter()
        .map(|(id, dist, attrs)| ResultItem {
            id,
            dist,
            fields: field_names
                .iter()
                .cloned()
                .zip(attrs)
                .collect::<HashMap<_, _>>(),
        })
        .collect();
    serde_json::to_string(&Response { result }).expect("response model always serializes")
}

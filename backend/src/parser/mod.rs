//! Record parser with encoding and delimiter auto-detection.
//!
//! Reads the CSV exports and JSON arrays the dashboard backend produces and
//! converts every cell into a typed [`Value`] once, here. The `"***"`
//! sentinel becomes [`Value::Suppressed`] and empty cells become
//! [`Value::Absent`].

use serde::Serialize;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::{Record, Value};

/// Which decoder produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Json,
}

/// Parsed records plus what was detected along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInput {
    pub records: Vec<Record>,
    pub format: InputFormat,
    pub encoding: String,
    /// `None` for JSON input.
    pub delimiter: Option<char>,
    /// CSV headers, or the keys of the first JSON record.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given encoding label.
///
/// UTF-8 falls back to lossy decoding. Other labels go through
/// `encoding_rs`, and malformed sequences are an error.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ParseResult<String> {
    let label = encoding.to_lowercase();
    if matches!(label.as_str(), "utf-8" | "utf8" | "ascii") {
        let text = String::from_utf8_lossy(bytes);
        return Ok(text.trim_start_matches('\u{feff}').to_string());
    }

    let Some(codec) = encoding_rs::Encoding::for_label(label.as_bytes()) else {
        return Ok(String::from_utf8_lossy(bytes)
            .trim_start_matches('\u{feff}')
            .to_string());
    };

    let (text, _, had_errors) = codec.decode(bytes);
    if had_errors {
        return Err(ParseError::EncodingError(format!(
            "input is not valid {}",
            codec.name()
        )));
    }
    Ok(text.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// `|` is never a candidate: it separates category and metric inside the
/// column names.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = ',';
    let mut best_count = 0;
    for sep in [',', ';', '\t'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Parse CSV text with an explicit delimiter.
///
/// Short rows are padded with absent cells; blank lines are skipped.
pub fn parse_csv_records(content: &str, delimiter: char) -> ParseResult<(Vec<String>, Vec<Record>)> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ParseError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        records.push(
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), Value::from_raw(row.get(i).unwrap_or(""))))
                .collect(),
        );
    }

    Ok((headers, records))
}

/// Parse a JSON array of objects.
pub fn parse_json_records(content: &str) -> ParseResult<Vec<Record>> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let value: serde_json::Value = serde_json::from_str(content)?;
    let items = value
        .as_array()
        .ok_or_else(|| ParseError::NotRecords("top-level value is not an array".to_string()))?;

    items.iter().map(Record::from_json).collect()
}

/// Parse bytes, detecting JSON or CSV, the encoding and the delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ParseResult<ParsedInput> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    if content.trim_start().starts_with('[') {
        let records = parse_json_records(&content)?;
        let headers = records
            .first()
            .map(|r| r.keys().map(str::to_string).collect())
            .unwrap_or_default();
        return Ok(ParsedInput {
            records,
            format: InputFormat::Json,
            encoding,
            delimiter: None,
            headers,
        });
    }

    let delimiter = detect_delimiter(&content);
    let (headers, records) = parse_csv_records(&content, delimiter)?;
    Ok(ParsedInput {
        records,
        format: InputFormat::Csv,
        encoding,
        delimiter: Some(delimiter),
        headers,
    })
}

/// Parse a file with [`parse_bytes_auto`].
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> ParseResult<ParsedInput> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

//! Format detection and preview parsing for downloaded resource files.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use flate2::read::GzDecoder;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DataGouvError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const CSV_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
/// Object keys that commonly wrap the record array of a JSON export.
const JSON_RECORD_KEYS: [&str; 2] = ["data", "features"];

/// Formats the download path can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::JsonLines => "jsonl",
        }
    }

    /// Map a declared format or file extension to a readable format.
    ///
    /// `Ok(None)` means the name says nothing useful; an `Err` means it names
    /// a format that cannot be parsed.
    fn from_name(name: &str) -> Result<Option<Self>> {
        let name = name.trim().trim_start_matches('.').to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        match name {
            "csv" | "tsv" | "txt" => Ok(Some(FileFormat::Csv)),
            "json" | "geojson" => Ok(Some(FileFormat::Json)),
            "jsonl" | "ndjson" => Ok(Some(FileFormat::JsonLines)),
            "xls" | "xlsx" | "ods" | "zip" | "pdf" | "parquet" | "shp" | "xml" | "doc"
            | "docx" | "7z" | "tar" => Err(DataGouvError::unsupported_format(name)),
            _ => Ok(None),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First rows of a parsed file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTable {
    /// Column names in file order
    pub columns: Vec<String>,
    /// At most `max_rows` records
    pub rows: Vec<Map<String, Value>>,
    /// Number of records in the whole file
    pub total_rows: usize,
    /// Field separator, for CSV files
    pub delimiter: Option<char>,
}

/// Detect the format of a downloaded file.
///
/// The declared resource format wins, then the URL extension, then the
/// content itself. Returns the format and whether the bytes are gzip-compressed.
pub fn detect_format(
    declared: Option<&str>,
    url: Option<&str>,
    bytes: &[u8],
) -> Result<(FileFormat, bool)> {
    let gzipped = bytes.starts_with(&GZIP_MAGIC);

    if let Some(declared) = declared
        && let Some(format) = FileFormat::from_name(declared)?
    {
        return Ok((format, gzipped));
    }

    if let Some(extension) = url.and_then(url_extension)
        && let Some(format) = FileFormat::from_name(&extension)?
    {
        return Ok((format, gzipped));
    }

    if gzipped {
        // Content sniffing needs the decompressed bytes.
        let mut head = Vec::new();
        GzDecoder::new(bytes)
            .take(64 * 1024)
            .read_to_end(&mut head)?;
        return sniff(&head, declared).map(|format| (format, true));
    }
    sniff(bytes, declared).map(|format| (format, false))
}

fn sniff(bytes: &[u8], declared: Option<&str>) -> Result<FileFormat> {
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
    match text.trim_start_matches('\u{feff}').trim_start().chars().next() {
        Some('[') => Ok(FileFormat::Json),
        Some('{') if text.lines().filter(|l| !l.trim().is_empty()).count() > 1
            && text.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('{')) =>
        {
            Ok(FileFormat::JsonLines)
        }
        Some('{') => Ok(FileFormat::Json),
        Some(_) if !bytes.contains(&0) => Ok(FileFormat::Csv),
        _ => Err(DataGouvError::unsupported_format(
            declared.filter(|d| !d.trim().is_empty()).unwrap_or("unknown"),
        )),
    }
}

fn url_extension(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let filename = parsed.path_segments()?.next_back()?.to_ascii_lowercase();
    let (stem, extension) = match filename.strip_suffix(".gz") {
        Some(stem) => (stem, ".gz"),
        None => (filename.as_str(), ""),
    };
    let (_, ext) = stem.rsplit_once('.')?;
    Some(format!("{ext}{extension}"))
}

/// Inflate a gzip stream, refusing output larger than `limit` bytes.
pub fn gunzip(bytes: &[u8], limit: u64) -> Result<Vec<u8>> {
    let mut inflated = Vec::new();
    GzDecoder::new(bytes)
        .take(limit + 1)
        .read_to_end(&mut inflated)?;
    if inflated.len() as u64 > limit {
        return Err(DataGouvError::TooLarge { limit });
    }
    Ok(inflated)
}

/// Parse decoded file content into a preview table.
pub fn parse_table(format: FileFormat, bytes: &[u8], max_rows: usize) -> Result<ParsedTable> {
    let text = decode_text(bytes);
    let text = text.trim_start_matches('\u{feff}');
    match format {
        FileFormat::Csv => parse_csv(text, max_rows),
        FileFormat::Json => parse_json(text, max_rows),
        FileFormat::JsonLines => parse_json_lines(text, max_rows),
    }
}

/// UTF-8, falling back to Windows-1252 which many French exports still use.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Pick the candidate separator appearing most often in the header line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    let mut best = (b',', 0usize);
    for candidate in CSV_DELIMITERS {
        let mut in_quotes = false;
        let count = header
            .bytes()
            .filter(|&b| {
                if b == b'"' {
                    in_quotes = !in_quotes;
                }
                !in_quotes && b == candidate
            })
            .count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

fn parse_csv(text: &str, max_rows: usize) -> Result<ParsedTable> {
    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| DataGouvError::parse_error("csv", e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut total_rows = 0;
    for record in reader.records() {
        let record = record.map_err(|e| DataGouvError::parse_error("csv", e.to_string()))?;
        total_rows += 1;
        if rows.len() < max_rows {
            let row = columns
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.clone(), Value::String(value.to_string())))
                .collect();
            rows.push(row);
        }
    }

    Ok(ParsedTable {
        columns,
        rows,
        total_rows,
        delimiter: Some(delimiter as char),
    })
}

fn parse_json(text: &str, max_rows: usize) -> Result<ParsedTable> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DataGouvError::parse_error("json", e.to_string()))?;

    let records = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            match JSON_RECORD_KEYS
                .iter()
                .find(|key| object.get(**key).is_some_and(Value::is_array))
            {
                Some(key) => match object.remove(*key) {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                },
                None => vec![Value::Object(object)],
            }
        }
        scalar => vec![scalar],
    };

    Ok(into_table(records.into_iter().map(into_row), max_rows))
}

fn parse_json_lines(text: &str, max_rows: usize) -> Result<ParsedTable> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            DataGouvError::parse_error("jsonl", format!("line {}: {e}", index + 1))
        })?;
        records.push(into_row(value));
    }
    Ok(into_table(records.into_iter(), max_rows))
}

fn into_row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(object) => object,
        other => {
            let mut row = Map::new();
            row.insert("value".to_string(), other);
            row
        }
    }
}

fn into_table(records: impl Iterator<Item = Map<String, Value>>, max_rows: usize) -> ParsedTable {
    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let mut total_rows = 0;
    for record in records {
        total_rows += 1;
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        if rows.len() < max_rows {
            rows.push(record);
        }
    }
    ParsedTable {
        columns,
        rows,
        total_rows,
        delimiter: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn declared_format_wins_over_url() {
        let (format, gzipped) =
            detect_format(Some("CSV"), Some("https://x.fr/file.json"), b"a,b\n1,2").unwrap();
        assert_eq!(format, FileFormat::Csv);
        assert!(!gzipped);
    }

    #[test]
    fn url_extension_used_when_format_is_missing() {
        let (format, _) =
            detect_format(None, Some("https://x.fr/export/data.ndjson?v=2"), b"{}").unwrap();
        assert_eq!(format, FileFormat::JsonLines);

        let (format, gzipped) =
            detect_format(Some(""), Some("https://x.fr/data.csv.gz"), &gzip(b"a;b\n")).unwrap();
        assert_eq!(format, FileFormat::Csv);
        assert!(gzipped);
    }

    #[test]
    fn content_is_sniffed_as_last_resort() {
        let (format, _) = detect_format(None, None, b"  [{\"a\": 1}]").unwrap();
        assert_eq!(format, FileFormat::Json);

        let (format, _) = detect_format(None, None, b"{\"a\":1}\n{\"a\":2}\n").unwrap();
        assert_eq!(format, FileFormat::JsonLines);

        let (format, gzipped) = detect_format(None, None, &gzip(b"x|y\n1|2\n")).unwrap();
        assert_eq!(format, FileFormat::Csv);
        assert!(gzipped);
    }

    #[test]
    fn spreadsheets_and_archives_are_rejected() {
        let err = detect_format(Some("xlsx"), None, b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, DataGouvError::UnsupportedFormat { ref format } if format == "xlsx"));

        let err = detect_format(None, Some("https://x.fr/archive.zip"), b"PK").unwrap_err();
        assert!(matches!(err, DataGouvError::UnsupportedFormat { .. }));

        let err = detect_format(None, None, b"\x00\x01\x02binary").unwrap_err();
        assert!(
            matches!(err, DataGouvError::UnsupportedFormat { ref format } if format == "unknown")
        );
    }

    #[test]
    fn delimiter_sniffing_ignores_quoted_separators() {
        assert_eq!(sniff_delimiter("code;\"nom, complet\";population\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\tc\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b\n"), b'|');
        assert_eq!(sniff_delimiter("single\n"), b',');
    }

    #[test]
    fn csv_preview_keeps_total_count() {
        let text = "\u{feff}commune;dep;population\nBrest;29;139000\nQuimper;29;63000\nLorient;56;57000\n";
        let table = parse_table(FileFormat::Csv, text.as_bytes(), 2).unwrap();

        assert_eq!(table.columns, vec!["commune", "dep", "population"]);
        assert_eq!(table.total_rows, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1]["commune"], "Quimper");
        assert_eq!(table.delimiter, Some(';'));
    }

    #[test]
    fn latin1_csv_is_decoded() {
        let bytes = b"nom,ville\nJos\xe9,Orl\xe9ans\n";
        let table = parse_table(FileFormat::Csv, bytes, 10).unwrap();
        assert_eq!(table.rows[0]["nom"], "José");
        assert_eq!(table.rows[0]["ville"], "Orléans");
    }

    #[test]
    fn windows_1252_punctuation_is_decoded() {
        let bytes = b"prix;unit\xe9\n5\x80;l\x92\xe9t\xe9\n";
        let table = parse_table(FileFormat::Csv, bytes, 10).unwrap();
        assert_eq!(table.columns, vec!["prix", "unité"]);
        assert_eq!(table.rows[0]["prix"], "5€");
        assert_eq!(table.rows[0]["unité"], "l’été");
    }

    #[test]
    fn json_wrapped_records_and_heterogeneous_keys() {
        let text = r#"{"data": [{"a": 1}, {"a": 2, "b": true}, {"c": null}], "meta": {}}"#;
        let table = parse_table(FileFormat::Json, text.as_bytes(), 20).unwrap();
        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(table.total_rows, 3);
        assert_eq!(table.delimiter, None);

        let single = parse_table(FileFormat::Json, br#"{"name": "x"}"#, 20).unwrap();
        assert_eq!(single.total_rows, 1);
        assert_eq!(single.rows[0]["name"], "x");
    }

    #[test]
    fn json_lines_report_the_failing_line() {
        let err = parse_table(FileFormat::JsonLines, b"{\"a\":1}\n\nnot json\n", 5).unwrap_err();
        match err {
            DataGouvError::ParseError { format, message } => {
                assert_eq!(format, "jsonl");
                assert!(message.starts_with("line 3"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn gunzip_enforces_the_limit() {
        let compressed = gzip(&vec![b'a'; 10_000]);
        assert_eq!(gunzip(&compressed, 10_000).unwrap().len(), 10_000);
        assert!(matches!(
            gunzip(&compressed, 100),
            Err(DataGouvError::TooLarge { limit: 100 })
        ));
    }
}

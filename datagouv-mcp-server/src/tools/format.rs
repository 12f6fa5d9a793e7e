//! Text rendering helpers shared by the tools.

use serde_json::Value;

/// Longest description shown before truncation, in characters.
pub const DESCRIPTION_LIMIT: usize = 300;

/// Cut `text` to at most `max` characters, appending `...` when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

/// Cell value as shown in row listings; strings are not quoted.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `value`, or `fallback` when absent or blank.
pub fn or_unknown<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(fallback)
}

/// Append `Label: value` when a value is present.
pub fn push_field(out: &mut String, indent: &str, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        out.push_str(&format!("{indent}{label}: {value}\n"));
    }
}

/// Render one record as indented `column: value` lines.
pub fn push_row<'a>(
    out: &mut String,
    index: usize,
    columns: impl IntoIterator<Item = &'a String>,
    row: &serde_json::Map<String, Value>,
) {
    out.push_str(&format!("Row {index}:\n"));
    for column in columns {
        let value = row.get(column).map(format_value).unwrap_or_default();
        out.push_str(&format!("  {column}: {}\n", truncate(&value, DESCRIPTION_LIMIT)));
    }
}

//! CSV input with encoding and delimiter auto-detection.
//!
//! Turns raw bytes into [`Row`]s. Nothing here knows about operations.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Row;

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows
    pub rows: Vec<Row>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse already-decoded CSV text with an explicit delimiter.
///
/// # Example
/// ```
/// use reorg::parser::parse_str;
///
/// let parsed = parse_str("name;age\nAlice;30\nBob;25", ';').unwrap();
/// assert_eq!(parsed.rows.len(), 2);
/// assert_eq!(parsed.rows[0].get("name"), Some("Alice"));
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(CsvError::ParseError {
            line: 1,
            message: format!("delimiter '{}' is not an ASCII character", delimiter),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(&e))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(&e))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let values: Vec<&str> = record.iter().collect();
        rows.push(Row::from_record(&headers, &values));
    }

    Ok(ParseResult {
        rows,
        encoding: "utf-8".to_string(),
        delimiter,
        headers,
    })
}

/// Parse CSV bytes, detecting the encoding and, unless given, the delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    let mut result = parse_str(&content, delimiter)?;
    result.encoding = encoding;
    Ok(result)
}

/// Parse a CSV file, detecting the encoding and, unless given, the delimiter.
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}

fn parse_error(err: &csv::Error) -> CsvError {
    CsvError::ParseError {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let parsed = parse_str("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("name"), Some("Alice"));
        assert_eq!(parsed.rows[0].get("age"), Some("30"));
        assert_eq!(parsed.rows[1].get("name"), Some("Bob"));
        assert_eq!(parsed.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let csv = "name,value\n\"Lovelace, Ada\",\"Hello World\"";
        let parsed = parse_str(csv, ',').unwrap();

        assert_eq!(parsed.rows[0].get("name"), Some("Lovelace, Ada"));
        assert_eq!(parsed.rows[0].get("value"), Some("Hello World"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let parsed = parse_str("a;b\n1;2\n\n3;4\n", ';').unwrap();
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn test_missing_values() {
        let parsed = parse_str("a;b;c\n1", ';').unwrap();

        assert_eq!(parsed.rows[0].get("a"), Some("1"));
        assert_eq!(parsed.rows[0].get("b"), Some(""));
        assert_eq!(parsed.rows[0].get("c"), Some(""));
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ';'), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_auto_parse() {
        let parsed = parse_bytes("name;age\nAlice;30\nBob;25".as_bytes(), None).unwrap();

        assert_eq!(parsed.delimiter, ';');
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn test_bom_is_stripped() {
        let decoded = decode_content("\u{feff}town\nTurin".as_bytes(), "utf-8");
        let parsed = parse_str(&decoded, ',').unwrap();
        assert_eq!(parsed.headers, vec!["town"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }
}

//! Delimited text reader with encoding and delimiter auto-detection.
//!
//! Turns a CSV-like file into a [`Table`]. No join or schema logic here;
//! required columns are checked by the transform step.

use std::collections::HashSet;
use std::path::Path;

use encoding_rs::Encoding;
use tracing::{debug, info};

use crate::error::{MalformedSourceError, MissingSourceError, ReadError, ReadResult};
use crate::models::Table;

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Reader settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Explicit delimiter; auto-detected from the header line when `None`.
    pub delimiter: Option<char>,
}

/// Parsed table plus the settings detected while reading it.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: Table,
    pub encoding: String,
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// A byte-order mark wins, then valid UTF-8, then chardet's guess resolved
/// to an `encoding_rs` name. A guess with no known encoding is returned as
/// reported so [`decode_content`] can reject it.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.name().to_lowercase();
    }
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => encoding.name().to_lowercase(),
        None => charset,
    }
}

/// Decode bytes with the encoding named by `encoding` (any WHATWG label).
///
/// A byte-order mark matching the encoding is removed. Unknown labels and
/// byte sequences invalid in the encoding are malformed sources.
pub fn decode_content(bytes: &[u8], encoding: &str, path: &Path) -> Result<String, MalformedSourceError> {
    let resolved = Encoding::for_label(encoding.trim().as_bytes()).ok_or_else(|| {
        MalformedSourceError::new(path, format!("Unsupported encoding '{}'", encoding))
    })?;

    let (content, had_errors) = resolved.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(MalformedSourceError::new(
            path,
            format!("Invalid {} data", resolved.name()),
        ));
    }
    Ok(content.into_owned())
}

/// Detect the delimiter by counting occurrences in the first non-blank line.
///
/// Falls back to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let header = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");

    let mut best = ',';
    let mut best_count = 0;
    for &sep in &CANDIDATE_DELIMITERS {
        let count = header.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Parse decoded text into a [`Table`].
///
/// `path` is only used to label errors.
pub fn parse_table(content: &str, delimiter: char, path: &Path) -> Result<Table, MalformedSourceError> {
    if !delimiter.is_ascii() {
        return Err(MalformedSourceError::new(
            path,
            format!("Delimiter '{}' is not a single-byte character", delimiter),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(MalformedSourceError::new(path, "Empty file or missing header row").with_line(1));
    }
    if headers.iter().any(String::is_empty) {
        return Err(MalformedSourceError::new(path, "Header row has an unnamed column").with_line(1));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(
            MalformedSourceError::new(path, format!("Duplicate column '{}'", dup)).with_line(1),
        );
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| malformed(path, e))?;
        // csv already skips empty lines; this catches whitespace-only ones
        if record.iter().all(str::is_empty) && record.len() <= 1 {
            continue;
        }
        if record.len() != headers.len() {
            let line = record.position().map_or(0, |p| p.line() as usize);
            return Err(MalformedSourceError::new(
                path,
                format!("Expected {} fields, found {}", headers.len(), record.len()),
            )
            .with_line(line));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

fn malformed(path: &Path, err: csv::Error) -> MalformedSourceError {
    MalformedSourceError {
        path: path.to_path_buf(),
        line: err.position().map(|p| p.line() as usize),
        message: err.to_string(),
    }
}

/// Parse raw bytes with encoding detection and optional delimiter override.
pub fn parse_bytes(bytes: &[u8], options: ReadOptions, path: &Path) -> Result<ParseResult, MalformedSourceError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding, path)?;
    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = parse_table(&content, delimiter, path)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Read one delimited file.
pub fn read_table(path: &Path, options: ReadOptions) -> ReadResult<ParseResult> {
    let bytes = std::fs::read(path).map_err(|source| MissingSourceError {
        path: path.to_path_buf(),
        source,
    })?;

    let result = parse_bytes(&bytes, options, path)?;
    debug!(
        path = %path.display(),
        encoding = %result.encoding,
        delimiter = %format_delimiter(result.delimiter),
        columns = ?result.table.headers,
        "parsed source"
    );
    Ok(result)
}

/// Read the users and orders sources.
///
/// Both paths are checked for readability before either is parsed, so a
/// missing orders file is reported even if the users file is malformed.
pub fn read(users_path: &Path, orders_path: &Path, options: ReadOptions) -> ReadResult<(Table, Table)> {
    for path in [users_path, orders_path] {
        std::fs::metadata(path).map_err(|source| {
            ReadError::Missing(MissingSourceError {
                path: path.to_path_buf(),
                source,
            })
        })?;
    }

    let users = read_table(users_path, options)?.table;
    let orders = read_table(orders_path, options)?.table;

    info!(
        users = users.len(),
        orders = orders.len(),
        "loaded sources"
    );
    Ok((users, orders))
}

/// Printable form of a delimiter.
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(csv: &str) -> Result<Table, MalformedSourceError> {
        parse_table(csv, detect_delimiter(csv), Path::new("test.csv"))
    }

    #[test]
    fn test_simple_csv() {
        let table = parse("user_id,name\n1,Alice\n2,Bob").unwrap();

        assert_eq!(table.headers, vec!["user_id", "name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["1", "Alice"]);
        assert_eq!(table.rows[1], vec!["2", "Bob"]);
    }

    #[test]
    fn test_quoted_values() {
        let table = parse("user_id,name\n1,\"Doe, Jane\"\n").unwrap();
        assert_eq!(table.rows[0][1], "Doe, Jane");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let table = parse(" user_id , amount \n 1 , 150 ").unwrap();
        assert_eq!(table.headers, vec!["user_id", "amount"]);
        assert_eq!(table.rows[0], vec!["1", "150"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse("a,b\n1,2\n\n3,4\n").unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_missing_values_kept_empty() {
        let table = parse("a,b,c\n1,,3").unwrap();
        assert_eq!(table.rows[0], vec!["1", "", "3"]);
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let err = parse("a,b\n1,2\n3,4,5").unwrap_err();
        assert_eq!(err.line, Some(3));
        assert!(err.message.contains("Expected 2 fields, found 3"));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = parse("").unwrap_err();
        assert!(err.message.contains("Empty"));
    }

    #[test]
    fn test_duplicate_header_is_malformed() {
        let err = parse("id,name,name\n1,a,b").unwrap_err();
        assert!(err.message.contains("Duplicate column 'name'"));
    }

    #[test]
    fn test_unnamed_header_is_malformed() {
        let err = parse("id,,name\n1,a,b").unwrap_err();
        assert!(err.message.contains("unnamed"));
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = parse("user_id,amount\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
        assert_eq!(detect_delimiter("\n\na;b\n"), ';');
    }

    #[test]
    fn test_explicit_delimiter_overrides_detection() {
        // header has more commas than semicolons
        let csv = "user_id;note\n1;a,b,c";
        let result = parse_bytes(
            csv.as_bytes(),
            ReadOptions { delimiter: Some(';') },
            Path::new("x.csv"),
        )
        .unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.rows[0], vec!["1", "a,b,c"]);
    }

    #[test]
    fn test_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"user_id,name\n1,A\n");
        let result = parse_bytes(&bytes, ReadOptions::default(), Path::new("x.csv")).unwrap();
        assert_eq!(result.table.headers[0], "user_id");
        assert_eq!(result.encoding, "utf-8");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1", Path::new("x.csv")).unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_symbols_kept_verbatim() {
        // 0xBD and 0xA4 differ between Latin-1 and Latin-9
        let decoded = decode_content(b"\xBD\xA4", "iso-8859-1", Path::new("x.csv")).unwrap();
        assert_eq!(decoded, "½¤");

        let bytes = b"user_id,name\n1,Bob \xBD caf\xE9 \xA4\n";
        let result = parse_bytes(bytes, ReadOptions::default(), Path::new("x.csv")).unwrap();
        assert_eq!(result.table.rows[0][1], "Bob ½ café ¤");
    }

    #[test]
    fn test_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("user_id,name\n1,Zoë\n".encode_utf16().flat_map(u16::to_le_bytes));

        let result = parse_bytes(&bytes, ReadOptions::default(), Path::new("x.csv")).unwrap();
        assert_eq!(result.encoding, "utf-16le");
        assert_eq!(result.table.headers, vec!["user_id", "name"]);
        assert_eq!(result.table.rows, vec![vec!["1", "Zoë"]]);
    }

    #[test]
    fn test_unknown_encoding_is_malformed() {
        let err = decode_content(b"user_id\n1\n", "x-klingon", Path::new("x.csv")).unwrap_err();
        assert!(err.message.contains("Unsupported encoding 'x-klingon'"));
    }

    #[test]
    fn test_invalid_bytes_for_encoding_are_malformed() {
        let err = decode_content(b"user_id\n\xFF\n", "utf-8", Path::new("x.csv")).unwrap_err();
        assert!(err.message.contains("Invalid UTF-8 data"));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let users = dir.path().join("users.csv");
        fs::write(&users, "user_id\n1\n").unwrap();

        let err = read(&users, &dir.path().join("nope.csv"), ReadOptions::default()).unwrap_err();
        match err {
            ReadError::Missing(e) => assert!(e.path.ends_with("nope.csv")),
            other => panic!("expected missing source, got {other:?}"),
        }
    }

    #[test]
    fn test_read_directory_is_missing_source() {
        let dir = tempdir().unwrap();
        let orders = dir.path().join("orders.csv");
        fs::write(&orders, "user_id,amount\n1,5\n").unwrap();

        let err = read(dir.path(), &orders, ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ReadError::Missing(_)));
    }

    #[test]
    fn test_read_both_files() {
        let dir = tempdir().unwrap();
        let users = dir.path().join("users.csv");
        let orders = dir.path().join("orders.csv");
        fs::write(&users, "user_id,name\n1,A\n2,B\n").unwrap();
        fs::write(&orders, "user_id;amount\n1;150\n").unwrap();

        let (u, o) = read(&users, &orders, ReadOptions::default()).unwrap();
        assert_eq!(u.len(), 2);
        assert_eq!(o.headers, vec!["user_id", "amount"]);
    }
}

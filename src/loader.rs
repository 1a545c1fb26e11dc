//! CSV loading into an all-text table snapshot.
//!
//! Every field is kept verbatim as text: no numeric or date parsing, and an
//! empty field stays an empty string rather than becoming a null sentinel.
//! Files are decoded as UTF-8 first with a single Latin-1 retry, which covers
//! the export encodings the source systems actually produce.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::debug;

/// In-memory, all-text image of one CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableSnapshot {
    /// Reads and parses `path`. Header casing is preserved here; the writer
    /// normalizes column names when the snapshot reaches the database.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Reading input file {path:?}"))?;
        let text = decode_with_fallback(&bytes, path)?;
        Self::parse(&text)
    }

    fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b',')
            .double_quote(true)
            .flexible(false)
            .from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .context("Reading CSV header row")?
            .iter()
            .map(|header| header.to_string())
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Reading CSV record")?;
            rows.push(record.iter().map(|field| field.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

fn decode_with_fallback(bytes: &[u8], path: &Path) -> Result<String> {
    match decode_bytes(bytes, UTF_8) {
        Ok(text) => Ok(text),
        Err(_) => {
            debug!("UTF-8 decode failed for {path:?}; retrying as Latin-1");
            decode_bytes(bytes, WINDOWS_1252)
                .map_err(|_| anyhow!("Failed to decode {path:?} as UTF-8 or Latin-1"))
        }
    }
}

fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn load_preserves_header_casing_and_field_text() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("brand.csv");
        fs::write(&path, "ID,Name\n1,Acme\n2,Globex\n").expect("write csv");

        let snapshot = TableSnapshot::load(&path).expect("load csv");
        assert_eq!(snapshot.headers(), ["ID", "Name"]);
        assert_eq!(snapshot.row_count(), 2);
        assert_eq!(snapshot.rows()[0], ["1", "Acme"]);
        assert_eq!(snapshot.rows()[1], ["2", "Globex"]);
    }

    #[test]
    fn empty_fields_stay_empty_strings() {
        let snapshot = TableSnapshot::parse("a,b,c\n1,,3\n,,\n").expect("parse csv");
        assert_eq!(snapshot.rows()[0], ["1", "", "3"]);
        assert_eq!(snapshot.rows()[1], ["", "", ""]);
    }

    #[test]
    fn latin1_file_loads_through_the_fallback_encoding() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("latin1.csv");
        // "René,Zürich" encoded as Latin-1: 0xE9 and 0xFC are invalid UTF-8.
        fs::write(&path, b"name,city\nRen\xe9,Z\xfcrich\n").expect("write csv");

        let snapshot = TableSnapshot::load(&path).expect("load csv");
        assert_eq!(snapshot.row_count(), 1);
        assert_eq!(snapshot.rows()[0], ["René", "Zürich"]);
    }

    #[test]
    fn quoted_fields_may_contain_delimiters_and_quotes() {
        let snapshot =
            TableSnapshot::parse("id,note\n1,\"a, b\"\n2,\"say \"\"hi\"\"\"\n").expect("parse csv");
        assert_eq!(snapshot.rows()[0], ["1", "a, b"]);
        assert_eq!(snapshot.rows()[1], ["2", "say \"hi\""]);
    }

    #[test]
    fn header_only_file_yields_zero_rows() {
        let snapshot = TableSnapshot::parse("id,name\n").expect("parse csv");
        assert_eq!(snapshot.column_count(), 2);
        assert_eq!(snapshot.row_count(), 0);
    }

    #[test]
    fn ragged_record_is_an_error() {
        assert!(TableSnapshot::parse("a,b\n1,2,3\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        assert!(TableSnapshot::load(&dir.path().join("absent.csv")).is_err());
    }
}

use std::path::Path;

use encoding_rs::WINDOWS_1252;

use crate::error::Result;

/// Aggregate footer rows start with this marker in the personnel-number
/// column; they are totals, not employee records.
const SUMMARY_MARKER: &str = "summen";
const NATURAL_KEY_COLUMN: &str = "Pers.-Nr.";

/// In-memory snapshot of one uploaded file: named columns over string
/// cells. Lives only for the duration of a single import.
#[derive(Debug)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Load a payroll export: line 0 is a metadata banner (returned raw for
/// period extraction), line 1 is the header row, the rest is data.
/// Files come in the source system's single-byte encoding; undecodable
/// bytes are replaced, never rejected.
pub fn load_table(path: &Path) -> Result<(String, RawTable)> {
    let bytes = std::fs::read(path)?;
    let (text, _, _) = WINDOWS_1252.decode(&bytes);

    let (banner, body) = match text.split_once('\n') {
        Some((first, rest)) => (first.trim_end_matches('\r').to_string(), rest),
        None => (text.trim_end_matches('\r').to_string(), ""),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut found_header = false;
    for result in rdr.records() {
        let record = result?;
        if !found_header {
            headers = record.iter().map(|f| f.to_string()).collect();
            found_header = true;
            continue;
        }
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    if let Some(idx) = headers.iter().position(|h| h == NATURAL_KEY_COLUMN) {
        rows.retain(|r| {
            let key = r.get(idx).map(String::as_str).unwrap_or("");
            !key.trim().to_lowercase().starts_with(SUMMARY_MARKER)
        });
    }

    Ok((banner, RawTable { headers, rows }))
}

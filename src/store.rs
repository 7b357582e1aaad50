// 🗄️ Store - JSON in, CSV out
// The only module that touches the filesystem; errors carry the file path

use crate::parser::{Table, TableRow};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// A CSV row as served by the API: header → cell
pub type Row = Map<String, Value>;

/// Load a raw upstream response
pub fn load_json(path: &Path) -> Result<Value> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// Write records under a header row. Zero records still writes the header.
///
/// Returns the number of data rows written.
pub fn write_csv<R: TableRow>(records: &[R], path: &Path, fieldnames: &[&str]) -> Result<usize> {
    write_rows(records.iter().map(TableRow::values), path, fieldnames)
}

/// Write a type-erased extraction
pub fn write_table(table: &Table, path: &Path) -> Result<usize> {
    write_rows(table.rows.iter().cloned(), path, &table.fieldnames)
}

fn write_rows(
    rows: impl Iterator<Item = Vec<String>>,
    path: &Path,
    fieldnames: &[&str],
) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer
        .write_record(fieldnames)
        .with_context(|| format!("Failed to write header to {}", path.display()))?;

    let mut written = 0;
    for row in rows {
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write row {} to {}", written + 1, path.display()))?;
        written += 1;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(written)
}

/// Read a CSV back as row objects, every cell a JSON string
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{AccountBalanceRecord, BalanceExtractor};
    use crate::parser::Extractor;
    use serde_json::json;
    use tempfile::tempdir;

    fn create_test_account(name: &str, balance: &str) -> AccountBalanceRecord {
        AccountBalanceRecord {
            account_name: name.to_string(),
            balance: balance.to_string(),
            institution: "Chase".to_string(),
            account_number: "...0172".to_string(),
            last_updated: "4 hr ago".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_write_then_read_keeps_formatted_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cash_balances.csv");
        let extractor = BalanceExtractor::cash();

        let written = write_csv(
            &[create_test_account("Checking, Joint", "$1,234.56")],
            &path,
            &extractor.fieldnames(),
        )
        .unwrap();
        let rows = read_rows(&path).unwrap();

        assert_eq!(written, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["account_name"], json!("Checking, Joint"));
        assert_eq!(rows[0]["balance"], json!("$1,234.56"));
        assert_eq!(rows[0]["bank"], json!("Chase"));
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys[0], "account_name");
    }

    #[test]
    fn test_empty_records_write_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("empty.csv");

        let written = write_csv::<AccountBalanceRecord>(&[], &path, &["account_name", "balance"]).unwrap();

        assert_eq!(written, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "account_name,balance\n");
        assert!(read_rows(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_json_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("card_balances.json");

        let err = load_json(&path).unwrap_err();

        assert!(err.to_string().contains("card_balances.json"));
    }

    #[test]
    fn test_load_json_keeps_field_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.json");
        fs::write(&path, r#"{"zeta": 1, "alpha": 2}"#).unwrap();

        let value = load_json(&path).unwrap();

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}

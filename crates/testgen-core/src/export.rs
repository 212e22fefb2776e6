//! Tabular export of generated test cases (CSV)

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::record::{TestCaseRecord, COLUMN_ORDER};

/// File stem used when the design has no name
pub const DEFAULT_STEM: &str = "figma_test_cases";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `<design name>_test_cases.csv`, with characters illegal in file names
/// (`\ / : * ? " < > |`) replaced by `_`.
pub fn output_file_name(design_name: Option<&str>) -> String {
    let stem = design_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_STEM);

    let sanitized: String = stem
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();
    format!("{}_test_cases.csv", sanitized)
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    let row = fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Io { path, source }
}

/// Render records as CSV with the fixed header row.
pub fn to_csv(records: &[TestCaseRecord]) -> String {
    let mut out = String::new();
    write_row(&mut out, COLUMN_ORDER);
    for record in records {
        write_row(&mut out, record.values());
    }
    out
}

/// Write `records` to `dir/<output_file_name>`, creating `dir` if needed.
///
/// Atomic: the file is written to a temp file in `dir` and renamed.
pub fn write_csv(
    dir: &Path,
    design_name: Option<&str>,
    records: &[TestCaseRecord],
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    let path = dir.join(output_file_name(design_name));

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    // UTF-8 BOM so spreadsheet tools detect the encoding of non-ASCII text.
    tmp.write_all("\u{feff}".as_bytes()).map_err(io_error(&path))?;
    tmp.write_all(to_csv(records).as_bytes()).map_err(io_error(&path))?;
    tmp.persist(&path).map_err(|e| ExportError::Io {
        path: path.clone(),
        source: e.error,
    })?;

    info!(path = %path.display(), records = records.len(), "Test cases exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, step: &str) -> TestCaseRecord {
        TestCaseRecord {
            test_case_id: id.into(),
            test_suite: "Login".into(),
            test_section: "Valid login".into(),
            priority: "P1".into(),
            test_category: "Functional".into(),
            precondition: "On login page".into(),
            test_step: step.into(),
            expect_result: "Home page shown".into(),
        }
    }

    #[test]
    fn test_output_file_name_sanitizes() {
        assert_eq!(
            output_file_name(Some("Shop: App/v2 <draft>?")),
            "Shop_ App_v2 _draft___test_cases.csv"
        );
        assert_eq!(output_file_name(None), "figma_test_cases_test_cases.csv");
        assert_eq!(output_file_name(Some("  ")), "figma_test_cases_test_cases.csv");
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let csv = to_csv(&[record("TC-001", "1. Type \"admin\", then\n2. Click Login")]);
        let mut lines = csv.split("\r\n");

        assert_eq!(
            lines.next().unwrap(),
            "Test Case ID,Test Suite,Test Section,Priority,Test Category,Precondition,Test Step,Expect Result"
        );
        assert!(csv.contains("\"1. Type \"\"admin\"\", then\n2. Click Login\""));
        assert!(csv.ends_with("Home page shown\r\n"));
    }

    #[test]
    fn test_write_csv_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");

        let path = write_csv(&out_dir, Some("Shop App"), &[record("TC-001", "Click")]).unwrap();

        assert_eq!(path, out_dir.join("Shop App_test_cases.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with('\u{feff}'));
        assert_eq!(content.matches("\r\n").count(), 2);
    }

    #[test]
    fn test_write_csv_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), Some("App"), &[record("TC-001", "a"), record("TC-002", "b")]).unwrap();
        let path = write_csv(dir.path(), Some("App"), &[]).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(!content.contains("TC-001"));
    }
}

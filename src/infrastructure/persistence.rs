use crate::domain::Analysis;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Writes exported tables and analyses to disk.
pub struct FileRepository;

impl FileRepository {
    /// Writes `rows` under `headers` as CSV. Returns the path written.
    pub fn export_csv(
        headers: &[String],
        rows: &[Vec<String>],
        path: &Path,
    ) -> Result<PathBuf, ExportError> {
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(ExportError::RaggedRow {
                row,
                found: cells.len(),
                expected: headers.len(),
            });
        }

        let io_err = |message: String| ExportError::Io {
            path: path.to_path_buf(),
            message,
        };

        ensure_parent(path).map_err(|e| io_err(e.to_string()))?;
        let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(e.to_string()))?;
        writer
            .write_record(headers)
            .map_err(|e| io_err(e.to_string()))?;
        for row in rows {
            writer.write_record(row).map_err(|e| io_err(e.to_string()))?;
        }
        writer.flush().map_err(|e| io_err(e.to_string()))?;

        Ok(path.to_path_buf())
    }

    /// Saves an analysis as pretty-printed JSON.
    pub fn save_analysis(analysis: &Analysis, path: &Path) -> Result<PathBuf, ExportError> {
        let json = serde_json::to_string_pretty(analysis)
            .map_err(|e| ExportError::Serialize(e.to_string()))?;
        ensure_parent(path)
            .and_then(|_| fs::write(path, json))
            .map_err(|e| ExportError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(path.to_path_buf())
    }

    pub fn load_analysis(path: &Path) -> Result<Analysis, ExportError> {
        let content = fs::read_to_string(path).map_err(|e| ExportError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ExportError::Serialize(format!("Invalid file format - {e}")))
    }

    /// `<dir>/<stem>-YYYYMMDD-HHMMSS.<ext>`
    pub fn timestamped_path(dir: &Path, stem: &str, ext: &str, now: DateTime<Utc>) -> PathBuf {
        dir.join(format!("{stem}-{}.{ext}", now.format("%Y%m%d-%H%M%S")))
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fixtures;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_export_csv_quotes_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.csv");
        let headers = vec!["Ticket".to_string(), "Customer".to_string()];
        let rows = vec![
            vec!["ZD-1".to_string(), "Contoso, Ltd".to_string()],
            vec!["ZD-2".to_string(), "Fabrikam".to_string()],
        ];

        FileRepository::export_csv(&headers, &rows, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Ticket,Customer\nZD-1,\"Contoso, Ltd\"\nZD-2,Fabrikam\n"
        );
    }

    #[test]
    fn test_export_csv_rejects_ragged_rows() {
        let dir = TempDir::new().unwrap();
        let headers = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec!["only one".to_string()]];
        let result = FileRepository::export_csv(&headers, &rows, &dir.path().join("x.csv"));
        assert!(matches!(
            result,
            Err(ExportError::RaggedRow { row: 0, found: 1, expected: 2 })
        ));
    }

    #[test]
    fn test_save_and_load_analysis() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exports").join("analysis.json");
        let analysis = fixtures::analysis();

        FileRepository::save_analysis(&analysis, &path).unwrap();
        assert_eq!(FileRepository::load_analysis(&path).unwrap(), analysis);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileRepository::load_analysis(&path),
            Err(ExportError::Serialize(_))
        ));
    }

    #[test]
    fn test_timestamped_path() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 9, 5, 7).unwrap();
        let path = FileRepository::timestamped_path(Path::new("out"), "queue", "csv", now);
        assert_eq!(path, PathBuf::from("out/queue-20240302-090507.csv"));
    }
}

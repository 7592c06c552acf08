//! Where the fleet roster comes from.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::FleetError;

/// Produces raw device identifiers. Entries may be padded, blank or repeated;
/// the reconciler cleans them up.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    async fn device_ids(&self) -> Result<Vec<String>, FleetError>;
}

/// Device list kept as a CSV file with a header row and the device id in the
/// first column.
#[derive(Debug, Clone)]
pub struct CsvDeviceSource {
    path: PathBuf,
}

impl CsvDeviceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeviceSource for CsvDeviceSource {
    async fn device_ids(&self) -> Result<Vec<String>, FleetError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FleetError::SourceUnavailable {
                path: self.path.clone(),
                source,
            })?;

        let ids: Vec<String> = content.lines().skip(1).map(first_column).collect();

        debug!(path = ?self.path, rows = ids.len(), "read device list");

        Ok(ids)
    }
}

#[async_trait]
impl DeviceSource for Vec<String> {
    async fn device_ids(&self) -> Result<Vec<String>, FleetError> {
        Ok(self.clone())
    }
}

/// First field of a CSV row. A quoted field may contain commas and `""`
/// escapes; an unterminated quote runs to the end of the row.
fn first_column(row: &str) -> String {
    let row = row.trim_start();
    let Some(quoted) = row.strip_prefix('"') else {
        return row.split(',').next().unwrap_or_default().trim().to_owned();
    };

    let mut field = String::new();
    let mut chars = quoted.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => break,
            c => field.push(c),
        }
    }

    field
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::FleetError;

    use super::{CsvDeviceSource, DeviceSource, first_column};

    #[test]
    fn test_first_column() {
        assert_eq!(first_column("60-6b-44-84-dc-64,extra"), "60-6b-44-84-dc-64");
        assert_eq!(first_column("\"b4-45-52-a2-f1-3c\",x"), "b4-45-52-a2-f1-3c");
        assert_eq!(first_column("  spaced  "), "spaced");
        assert_eq!(first_column(""), "");
    }

    #[test]
    fn test_first_column_quoted_commas_and_escapes() {
        assert_eq!(first_column("\"a,b\",x"), "a,b");
        assert_eq!(first_column("  \"rack \"\"7\"\"\",x"), "rack \"7\"");
        assert_eq!(first_column("\"open,ended"), "open,ended");
    }

    #[tokio::test]
    async fn test_reads_rows_after_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "device_id").unwrap();
        writeln!(file, "60-6b-44-84-dc-64").unwrap();
        writeln!(file, " b4-45-52-a2-f1-3c ").unwrap();
        writeln!(file).unwrap();

        let ids = CsvDeviceSource::new(file.path()).device_ids().await.unwrap();

        assert_eq!(ids, vec!["60-6b-44-84-dc-64", "b4-45-52-a2-f1-3c", ""]);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.csv");

        let result = CsvDeviceSource::new(&path).device_ids().await;

        assert!(matches!(
            result,
            Err(FleetError::SourceUnavailable { path: p, .. }) if p == path
        ));
    }
}

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::csv::write_csv;
use super::json::write_json_pretty;
use crate::engine::types::SpeedTestResult;

/// Write `result` to `path`, creating parent directories as needed.
/// The format follows the extension: `.csv` gives CSV, anything else JSON.
pub fn write_report(path: &Path, result: &SpeedTestResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_csv(&mut writer, result)?;
    } else {
        write_json_pretty(&mut writer, result)?;
    }
    writer.flush()?;

    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{ServerReport, TestType, TransferReport};
    use std::time::Duration;

    fn sample() -> SpeedTestResult {
        SpeedTestResult {
            reports: vec![ServerReport {
                server: "Alpha".to_string(),
                latency: None,
                download: Some(TransferReport::new(
                    TestType::Download,
                    1_000_000,
                    Duration::from_secs(1),
                )),
                upload: None,
            }],
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_write_json_report_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.json");
        write_report(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["reports"][0]["server"], "Alpha");
    }

    #[test]
    fn test_write_csv_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.CSV");
        write_report(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("server,test_type,bytes"));
        assert!(text.contains("Alpha,download,1000000"));
    }
}

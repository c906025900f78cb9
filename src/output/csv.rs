use std::io::Write;

use crate::engine::types::SpeedTestResult;

const HEADER: [&str; 7] = [
    "server",
    "test_type",
    "bytes",
    "elapsed_ms",
    "mbps",
    "megabytes_per_sec",
    "rating",
];

pub fn write_csv(out: impl Write, result: &SpeedTestResult) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;

    for report in &result.reports {
        if let Some(ref lat) = report.latency {
            wtr.write_record([
                report.server.as_str(),
                "latency",
                "", // no payload for latency
                &format!("{:.2}", lat.avg_ms),
                "",
                "",
                "",
            ])?;
        }

        for transfer in [&report.download, &report.upload].into_iter().flatten() {
            wtr.write_record([
                report.server.as_str(),
                &transfer.test_type.to_string().to_lowercase(),
                &transfer.bytes.to_string(),
                &format!("{:.2}", transfer.elapsed_ms),
                &format!("{:.2}", transfer.mbps),
                &format!("{:.2}", transfer.megabytes_per_second()),
                &transfer.rating.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{LatencyResult, ServerReport, TestType, TransferReport};
    use std::time::Duration;

    #[test]
    fn test_csv_rows() {
        let result = SpeedTestResult {
            reports: vec![ServerReport {
                server: "Alpha".to_string(),
                latency: Some(LatencyResult::from_samples(vec![10.0, 20.0])),
                download: Some(TransferReport::new(
                    TestType::Download,
                    50_000_000,
                    Duration::from_secs(2),
                )),
                upload: Some(TransferReport::new(
                    TestType::Upload,
                    1_000_000,
                    Duration::from_secs(1),
                )),
            }],
            failures: Vec::new(),
        };

        let mut buf = Vec::new();
        write_csv(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "server,test_type,bytes,elapsed_ms,mbps,megabytes_per_sec,rating",
                "Alpha,latency,,15.00,,,",
                "Alpha,download,50000000,2000.00,200.00,25.00,Excellent",
                "Alpha,upload,1000000,1000.00,8.00,1.00,Fair",
            ]
        );
    }
}

use std::io::{self, Write};

use crate::engine::ping::PingResult;
use crate::engine::types::{ServerReport, SpeedTestResult, SpeedUnit};

/// Print one line per server, e.g.
/// "Cloudflare: ↓ 450.00 Mbps (Excellent)  ↑ 120.00 Mbps (Excellent)  ⏱ 12.0ms"
pub fn write_simple(
    out: &mut impl Write,
    result: &SpeedTestResult,
    unit: SpeedUnit,
) -> io::Result<()> {
    for report in &result.reports {
        writeln!(out, "{}", summary_line(report, unit))?;
    }
    for failure in &result.failures {
        writeln!(
            out,
            "✗ {}: {} failed ({})",
            failure.server, failure.stage, failure.reason
        )?;
    }
    Ok(())
}

fn summary_line(report: &ServerReport, unit: SpeedUnit) -> String {
    let mut parts = Vec::new();

    if let Some(ref dl) = report.download {
        parts.push(format!("↓ {} ({})", unit.format(dl.bits_per_second), dl.rating));
    }
    if let Some(ref ul) = report.upload {
        parts.push(format!("↑ {} ({})", unit.format(ul.bits_per_second), ul.rating));
    }
    if let Some(ref lat) = report.latency {
        if !lat.samples.is_empty() {
            parts.push(format!("⏱ {:.1}ms", lat.avg_ms));
        }
    }

    format!("{}: {}", report.server, parts.join("  "))
}

pub fn write_ping(out: &mut impl Write, result: &PingResult) -> io::Result<()> {
    writeln!(out, "{result}")
}

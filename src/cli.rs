use clap::{ArgAction, Parser, ValueEnum};
use clap_complete::Shell;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::types::{parse_size, SpeedTestConfig, SpeedUnit, DEFAULT_UPLOAD_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    /// Megabits per second
    Mbps,
    /// Megabytes per second
    #[value(name = "mb")]
    MegabytesPerSec,
    /// Megabits and megabytes per second side by side
    Both,
}

impl From<UnitArg> for SpeedUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Mbps => SpeedUnit::Mbps,
            UnitArg::MegabytesPerSec => SpeedUnit::MegabytesPerSec,
            UnitArg::Both => SpeedUnit::Both,
        }
    }
}

/// Which output mode was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Tui,
    Simple,
    Json,
    JsonPretty,
    Csv,
}

/// Simple HTTP speed test client
#[derive(Parser, Debug)]
#[command(name = "speedtest-client", version, about)]
pub struct Cli {
    /// Number of latency probes per server
    #[arg(short = 'l', long = "nr-latency-tests", default_value_t = 10, value_parser = clap::value_parser!(u32).range(0..=999))]
    pub nr_latency_tests: u32,

    /// Upload payload size [e.g. 100k, 10m, 25m]
    #[arg(short = 'u', long = "upload-size", value_parser = parse_size, default_value_t = DEFAULT_UPLOAD_SIZE)]
    pub upload_size: usize,

    /// Timeout in seconds for each test phase
    #[arg(short = 't', long = "timeout", default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,

    /// JSON file with the servers to test (built-in list otherwise)
    #[arg(long = "servers", value_name = "FILE")]
    pub servers: Option<PathBuf>,

    /// Only test servers whose name contains NAME
    #[arg(long = "server", value_name = "NAME")]
    pub server: Option<String>,

    /// Stop after this many servers completed successfully
    #[arg(long = "max-servers", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_servers: Option<u32>,

    /// Unit used to display speeds
    #[arg(long, value_enum, default_value = "mbps")]
    pub units: UnitArg,

    /// One line per server (no TUI)
    #[arg(long)]
    pub simple: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,

    /// Pretty JSON output
    #[arg(long = "json-pretty")]
    pub json_pretty: bool,

    /// CSV output
    #[arg(long)]
    pub csv: bool,

    /// Also write the report to FILE (CSV for .csv, JSON otherwise)
    #[arg(short = 'o', long = "output-file", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Skip upload tests
    #[arg(long = "download-only", conflicts_with = "upload_only")]
    pub download_only: bool,

    /// Skip download tests
    #[arg(long = "upload-only", conflicts_with = "download_only")]
    pub upload_only: bool,

    /// Force IPv4 with optional source address
    #[arg(long, value_name = "IPv4", num_args = 0..=1, default_missing_value = "0.0.0.0", conflicts_with = "ipv6")]
    pub ipv4: Option<String>,

    /// Force IPv6 with optional source address
    #[arg(long, value_name = "IPv6", num_args = 0..=1, default_missing_value = "::", conflicts_with = "ipv4")]
    pub ipv6: Option<String>,

    /// Check whether HOST[:PORT] is reachable and exit
    #[arg(long, value_name = "HOST")]
    pub ping: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to FILE instead of stderr
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Generate shell completions
    #[arg(long = "generate-completion", value_name = "SHELL")]
    pub completion: Option<Shell>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.simple {
            OutputMode::Simple
        } else if self.json {
            OutputMode::Json
        } else if self.json_pretty {
            OutputMode::JsonPretty
        } else if self.csv {
            OutputMode::Csv
        } else {
            OutputMode::Tui
        }
    }

    pub fn to_config(&self) -> SpeedTestConfig {
        SpeedTestConfig {
            nr_latency_tests: self.nr_latency_tests,
            upload_size: self.upload_size,
            phase_timeout: Duration::from_secs(self.timeout_secs),
            download: !self.upload_only,
            upload: !self.download_only,
            max_servers: self.max_servers.map(|n| n as usize),
        }
    }

    /// Local address to bind outgoing connections to, if IPv4/IPv6 was forced.
    pub fn local_address(&self) -> Result<Option<IpAddr>, String> {
        if let Some(ref v4) = self.ipv4 {
            let addr: IpAddr = v4
                .parse()
                .map_err(|_| format!("Invalid IPv4 address '{v4}'"))?;
            if !addr.is_ipv4() {
                return Err(format!("'{v4}' is not an IPv4 address"));
            }
            return Ok(Some(addr));
        }
        if let Some(ref v6) = self.ipv6 {
            let addr: IpAddr = v6
                .parse()
                .map_err(|_| format!("Invalid IPv6 address '{v6}'"))?;
            if !addr.is_ipv6() {
                return Err(format!("'{v6}' is not an IPv6 address"));
            }
            return Ok(Some(addr));
        }
        Ok(None)
    }

    /// Default log filter directive for the given verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("speedtest-client").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.output_mode(), OutputMode::Tui);
        let config = cli.to_config();
        assert_eq!(config.nr_latency_tests, 10);
        assert_eq!(config.upload_size, 25_000_000);
        assert_eq!(config.phase_timeout, Duration::from_secs(20));
        assert!(config.download);
        assert!(config.upload);
        assert_eq!(config.max_servers, None);
        assert_eq!(cli.local_address(), Ok(None));
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_output_modes() {
        assert_eq!(parse(&["--simple"]).output_mode(), OutputMode::Simple);
        assert_eq!(parse(&["--json"]).output_mode(), OutputMode::Json);
        assert_eq!(parse(&["--json-pretty"]).output_mode(), OutputMode::JsonPretty);
        assert_eq!(parse(&["--csv"]).output_mode(), OutputMode::Csv);
    }

    #[test]
    fn test_direction_flags() {
        let config = parse(&["--download-only"]).to_config();
        assert!(config.download);
        assert!(!config.upload);

        let config = parse(&["--upload-only"]).to_config();
        assert!(!config.download);
        assert!(config.upload);

        assert!(Cli::try_parse_from(["speedtest-client", "--download-only", "--upload-only"]).is_err());
    }

    #[test]
    fn test_sizes_and_timeouts() {
        let cli = parse(&["-u", "10m", "-t", "5", "--max-servers", "2", "-vv"]);
        let config = cli.to_config();
        assert_eq!(config.upload_size, 10_000_000);
        assert_eq!(config.phase_timeout, Duration::from_secs(5));
        assert_eq!(config.max_servers, Some(2));
        assert_eq!(cli.log_level(), "debug");

        assert!(Cli::try_parse_from(["speedtest-client", "-u", "huge"]).is_err());
        assert!(Cli::try_parse_from(["speedtest-client", "-t", "0"]).is_err());
    }

    #[test]
    fn test_local_address() {
        assert_eq!(
            parse(&["--ipv4"]).local_address(),
            Ok(Some("0.0.0.0".parse().unwrap()))
        );
        assert_eq!(
            parse(&["--ipv6"]).local_address(),
            Ok(Some("::".parse().unwrap()))
        );
        assert!(parse(&["--ipv4", "::1"]).local_address().is_err());
        assert!(parse(&["--ipv6", "10.0.0.1"]).local_address().is_err());
        assert!(Cli::try_parse_from(["speedtest-client", "--ipv4", "--ipv6"]).is_err());
    }

    #[test]
    fn test_units() {
        assert_eq!(SpeedUnit::from(parse(&[]).units), SpeedUnit::Mbps);
        assert_eq!(
            SpeedUnit::from(parse(&["--units", "mb"]).units),
            SpeedUnit::MegabytesPerSec
        );
        assert_eq!(
            SpeedUnit::from(parse(&["--units", "both"]).units),
            SpeedUnit::Both
        );
    }
}

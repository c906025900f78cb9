use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use speedtest_client::engine::cancel::cancel_signal;
use speedtest_client::engine::error::SpeedTestError;
use speedtest_client::engine::runner::run_speed_test;
use speedtest_client::engine::servers::ServerList;
use speedtest_client::engine::types::{
    SpeedTestConfig, SpeedTestEvent, SpeedTestResult, Stage, TestType,
};

const DOWNLOAD_SIZE: usize = 256 * 1024;
const UPLOAD_SIZE: usize = 200_000;

/// Minimal HTTP/1.1 server with one connection per request.
///
/// Routes: `/down` serves `DOWNLOAD_SIZE` bytes, `/up` swallows the request
/// body, `/fail` answers 500 and `/hang` never answers.
async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream));
        }
    });
    addr
}

async fn handle(mut stream: TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 16 * 1024];

    let header_end = loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse::<usize>().ok()
        } else {
            None
        }
    });
    let chunked = head
        .to_ascii_lowercase()
        .contains("transfer-encoding: chunked");

    let mut body = buf[header_end..].to_vec();
    loop {
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    let (status, payload) = match path.as_str() {
        "/hang" => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return;
        }
        "/fail" => ("500 Internal Server Error", Vec::new()),
        "/down" => ("200 OK", vec![0u8; DOWNLOAD_SIZE]),
        "/up" => ("200 OK", b"ok".to_vec()),
        _ => ("404 Not Found", Vec::new()),
    };

    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        payload.len()
    );
    let _ = stream.write_all(header.as_bytes()).await;
    if method != "HEAD" {
        let _ = stream.write_all(&payload).await;
    }
    let _ = stream.shutdown().await;
}

fn server_json(addr: SocketAddr, name: &str, download: &str, upload: &str) -> String {
    server_json_with_latency(addr, name, download, upload, "/down")
}

fn server_json_with_latency(
    addr: SocketAddr,
    name: &str,
    download: &str,
    upload: &str,
    latency: &str,
) -> String {
    format!(
        r#"{{"name":"{name}","downloadUrl":"http://{addr}{download}","uploadUrl":"http://{addr}{upload}","latencyUrl":"http://{addr}{latency}"}}"#
    )
}

fn server_list(entries: &[String]) -> ServerList {
    ServerList::from_json(&format!("[{}]", entries.join(","))).unwrap()
}

fn test_config() -> SpeedTestConfig {
    SpeedTestConfig {
        nr_latency_tests: 2,
        upload_size: UPLOAD_SIZE,
        phase_timeout: Duration::from_secs(5),
        ..SpeedTestConfig::default()
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn collect_events() -> (
    mpsc::Sender<SpeedTestEvent>,
    JoinHandle<Vec<SpeedTestEvent>>,
) {
    let (tx, mut rx) = mpsc::channel(256);
    let handle = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });
    (tx, handle)
}

async fn run(
    servers: &ServerList,
    config: &SpeedTestConfig,
) -> (Result<SpeedTestResult, SpeedTestError>, Vec<SpeedTestEvent>) {
    let (_canceller, cancel) = cancel_signal();
    let (tx, events) = collect_events();
    let result = run_speed_test(&client(), servers, config, tx, cancel).await;
    (result, events.await.unwrap())
}

#[tokio::test]
async fn test_single_server_completes_all_phases() {
    let addr = spawn_server().await;
    let servers = server_list(&[server_json(addr, "Local", "/down", "/up")]);

    let (result, events) = run(&servers, &test_config()).await;
    let result = result.unwrap();

    assert_eq!(result.reports.len(), 1);
    assert!(result.failures.is_empty());
    let report = &result.reports[0];
    assert_eq!(report.server, "Local");
    assert_eq!(report.latency.as_ref().unwrap().samples.len(), 2);
    assert_eq!(report.download.as_ref().unwrap().bytes, DOWNLOAD_SIZE as u64);
    assert_eq!(report.upload.as_ref().unwrap().bytes, UPLOAD_SIZE as u64);

    assert!(matches!(events.first(), Some(SpeedTestEvent::ServerStart { index: 1, total: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, SpeedTestEvent::PhaseStart(TestType::Upload))));
    assert!(matches!(events.last(), Some(SpeedTestEvent::Complete(_))));
}

#[tokio::test]
async fn test_failing_server_falls_back_to_next() {
    let addr = spawn_server().await;
    let servers = server_list(&[
        server_json(addr, "Broken", "/fail", "/up"),
        server_json(addr, "Healthy", "/down", "/up"),
    ]);

    let (result, events) = run(&servers, &test_config()).await;
    let result = result.unwrap();

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].server, "Healthy");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].server, "Broken");
    assert_eq!(result.failures[0].stage, Stage::Download);
    assert!(events
        .iter()
        .any(|e| matches!(e, SpeedTestEvent::ServerFailed(f) if f.server == "Broken")));
}

#[tokio::test]
async fn test_hanging_upload_times_out() {
    let addr = spawn_server().await;
    let servers = server_list(&[
        server_json(addr, "Stalled", "/down", "/hang"),
        server_json(addr, "Healthy", "/down", "/up"),
    ]);
    let config = SpeedTestConfig {
        phase_timeout: Duration::from_millis(500),
        ..test_config()
    };

    let (result, _) = run(&servers, &config).await;
    let result = result.unwrap();

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].stage, Stage::Upload);
    assert!(result.failures[0].reason.contains("timed out"));
}

#[tokio::test]
async fn test_hanging_download_times_out() {
    let addr = spawn_server().await;
    let servers = server_list(&[
        server_json(addr, "Stalled", "/hang", "/up"),
        server_json(addr, "Healthy", "/down", "/up"),
    ]);
    let config = SpeedTestConfig {
        phase_timeout: Duration::from_millis(500),
        ..test_config()
    };

    let (result, _) = run(&servers, &config).await;
    let result = result.unwrap();

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].server, "Healthy");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].server, "Stalled");
    assert_eq!(result.failures[0].stage, Stage::Download);
    assert!(result.failures[0].reason.contains("timed out"));
}

#[tokio::test]
async fn test_latency_failures_do_not_fail_server() {
    let addr = spawn_server().await;
    let servers = server_list(&[server_json_with_latency(
        addr, "NoLatency", "/down", "/up", "/hang",
    )]);
    let config = SpeedTestConfig {
        nr_latency_tests: 10,
        phase_timeout: Duration::from_millis(300),
        ..test_config()
    };

    let (result, events) = run(&servers, &config).await;
    let result = result.unwrap();

    assert!(result.failures.is_empty());
    let report = &result.reports[0];
    assert!(report.latency.as_ref().unwrap().samples.is_empty());
    assert!(report.download.is_some());
    assert!(report.upload.is_some());

    // Probing gives up after three consecutive failures.
    let errors = events
        .iter()
        .filter(|e| matches!(e, SpeedTestEvent::Error(_)))
        .count();
    assert_eq!(errors, 3);
    assert!(!events
        .iter()
        .any(|e| matches!(e, SpeedTestEvent::LatencySample { .. })));
}

#[tokio::test]
async fn test_all_servers_failing() {
    let addr = spawn_server().await;
    let servers = server_list(&[
        server_json(addr, "A", "/fail", "/up"),
        server_json(addr, "B", "/fail", "/up"),
    ]);

    let (result, events) = run(&servers, &test_config()).await;

    assert!(matches!(result, Err(SpeedTestError::AllServersFailed)));
    assert!(matches!(events.last(), Some(SpeedTestEvent::AllServersFailed)));
    let failed = events
        .iter()
        .filter(|e| matches!(e, SpeedTestEvent::ServerFailed(_)))
        .count();
    assert_eq!(failed, 2);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let addr = spawn_server().await;
    let servers = server_list(&[server_json(addr, "Local", "/down", "/up")]);
    let (canceller, cancel) = cancel_signal();
    canceller.cancel();

    let (tx, events) = collect_events();
    let result = run_speed_test(&client(), &servers, &test_config(), tx, cancel).await;
    let events = events.await.unwrap();

    assert!(matches!(result, Err(SpeedTestError::Cancelled)));
    assert!(matches!(events.last(), Some(SpeedTestEvent::Cancelled)));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SpeedTestEvent::ServerFailed(_))));
}

#[tokio::test]
async fn test_cancel_during_hanging_download() {
    let addr = spawn_server().await;
    let servers = server_list(&[server_json(addr, "Stalled", "/hang", "/up")]);
    let (canceller, cancel) = cancel_signal();

    let (tx, events) = collect_events();
    let client = client();
    let config = test_config();
    let run = run_speed_test(&client, &servers, &config, tx, cancel);
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    };
    let (result, ()) = tokio::join!(run, trigger);

    assert!(matches!(result, Err(SpeedTestError::Cancelled)));
    assert!(matches!(events.await.unwrap().last(), Some(SpeedTestEvent::Cancelled)));
}

#[tokio::test]
async fn test_max_servers_stops_early() {
    let addr = spawn_server().await;
    let servers = server_list(&[
        server_json(addr, "First", "/down", "/up"),
        server_json(addr, "Second", "/down", "/up"),
        server_json(addr, "Third", "/down", "/up"),
    ]);
    let config = SpeedTestConfig {
        nr_latency_tests: 0,
        max_servers: Some(1),
        ..test_config()
    };

    let (result, events) = run(&servers, &config).await;
    let result = result.unwrap();

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].server, "First");
    assert!(result.reports[0].latency.is_none());
    let started = events
        .iter()
        .filter(|e| matches!(e, SpeedTestEvent::ServerStart { .. }))
        .count();
    assert_eq!(started, 1);
}

#[tokio::test]
async fn test_download_only_skips_upload() {
    let addr = spawn_server().await;
    let servers = server_list(&[server_json(addr, "Local", "/down", "/fail")]);
    let config = SpeedTestConfig {
        upload: false,
        ..test_config()
    };

    let (result, _) = run(&servers, &config).await;
    let report = &result.unwrap().reports[0];

    assert!(report.download.is_some());
    assert!(report.upload.is_none());
}

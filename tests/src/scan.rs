//! End-to-end tests for the scan engine against a loopback harness.
//!
//! The liveness port list is overridden to an ephemeral port so the
//! harness does not need privileged bind rights. 127.0.0.0/30 expands to
//! the two hosts .1 and .2; only .1 carries the listener.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lansweep_common::model::{PortState, Transport};
use lansweep_core::ScanJob;
use tokio::net::TcpListener;

async fn harness_listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind harness listener");
    let port = listener.local_addr().expect("listener address").port();
    (listener, port)
}

fn harness_job(port: u16, threads: usize, show_closed: bool) -> ScanJob {
    let mut job = ScanJob::new(
        "127.0.0.0/30",
        Duration::from_millis(500),
        &port.to_string(),
        threads,
        show_closed,
    )
    .expect("valid job parameters");
    job.set_liveness_ports(vec![port]);
    job
}

#[tokio::test]
async fn scan_reports_only_the_listening_host() {
    let (_listener, port) = harness_listener().await;
    let job = harness_job(port, 8, false);
    job.scan().await;

    let results = job.get_results();
    assert_eq!(results.len(), 1, "only .1 should pass liveness");

    let host = &results[0];
    assert_eq!(host.ip, Ipv4Addr::new(127, 0, 0, 1));
    assert!(host.is_alive);
    assert_eq!(host.ports.len(), 1);
    assert_eq!(host.ports[0].port, port);
    assert_eq!(host.ports[0].transport, Transport::Tcp);
    assert_eq!(host.ports[0].state, PortState::Open);
}

#[tokio::test]
async fn show_closed_records_refused_ports_too() {
    let (_listener, port) = harness_listener().await;
    // probe the listening port and one that refuses
    let closed_port = {
        let (spare, spare_port) = harness_listener().await;
        drop(spare);
        spare_port
    };
    let mut job = ScanJob::new(
        "127.0.0.0/30",
        Duration::from_millis(500),
        &format!("{port},{closed_port}"),
        8,
        true,
    )
    .expect("valid job parameters");
    job.set_liveness_ports(vec![port]);
    job.scan().await;

    let results = job.get_results();
    assert_eq!(results.len(), 1);
    let host = &results[0];
    assert_eq!(host.ports.len(), 2, "closed probe must be recorded");
    assert!(host.has_open(port));
    let closed = host
        .ports
        .iter()
        .find(|probe| probe.port == closed_port)
        .expect("closed port present");
    assert_eq!(closed.state, PortState::Closed);
}

#[tokio::test]
async fn progress_walks_ping_ports_complete() {
    let (_listener, port) = harness_listener().await;
    let mut job = harness_job(port, 4, false);

    let stages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let observer = stages.clone();
    job.set_progress_callback(move |stage, current, total, _message| {
        assert!(current <= total);
        observer.lock().unwrap().push(stage.to_string());
    });
    job.scan().await;

    let seen = stages.lock().unwrap();
    assert!(seen.iter().any(|stage| stage == "ping"));
    assert!(seen.iter().any(|stage| stage == "ports"));
    assert_eq!(seen.last().map(String::as_str), Some("complete"));
}

#[tokio::test]
async fn get_results_snapshots_are_idempotent() {
    let (_listener, port) = harness_listener().await;
    let job = harness_job(port, 4, false);
    job.scan().await;

    let first = job.get_results();
    let second = job.get_results();
    assert_eq!(first, second);
}

#[tokio::test]
async fn second_scan_call_is_a_no_op() {
    let (_listener, port) = harness_listener().await;
    let job = harness_job(port, 4, false);
    job.scan().await;
    let before = job.get_results();

    job.scan().await;
    assert_eq!(job.get_results(), before);
}

#[tokio::test]
async fn stop_interrupts_a_scan_of_silent_space() {
    // 10.255.255.0/28 is assumed unrouted here; every dial runs into the
    // per-probe timeout, so an uninterrupted sweep would take seconds.
    let mut job = ScanJob::new(
        "10.255.255.0/28",
        Duration::from_millis(400),
        "80",
        2,
        false,
    )
    .expect("valid job parameters");
    job.set_liveness_ports(vec![9]);

    let job = Arc::new(job);
    let runner = job.clone();
    let scan = tokio::spawn(async move { runner.scan().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stopping = Instant::now();
    job.stop().await;
    assert!(
        stopping.elapsed() < Duration::from_secs(2),
        "stop must return within a small multiple of the probe timeout"
    );
    scan.await.expect("scan task completed");

    // cancellation never leaves a torn entry behind
    for host in job.get_results() {
        assert!(host.is_alive);
        assert!(!host.device_type.is_empty());
    }
}

#[tokio::test]
async fn udp_pass_merges_into_the_same_host() {
    let (_listener, port) = harness_listener().await;
    let mut job = harness_job(port, 4, false);
    job.set_udp_enabled(true);
    job.scan().await;

    let results = job.get_results();
    assert_eq!(results.len(), 1, "UDP pass must not add extra hosts");
    let host = &results[0];
    assert!(host.has_open(port));
    // the curated UDP list is probed optimistically; whatever it reports
    // lands on the same host entry with the UDP transport tag
    assert!(
        host.ports
            .iter()
            .filter(|probe| probe.transport == Transport::Udp)
            .all(|probe| probe.state != PortState::Filtered)
    );
}

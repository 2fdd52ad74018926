//! The two-phase concurrent scan orchestrator.
//!
//! A [`ScanJob`] walks `Idle -> LivenessSweep -> PortSweep -> Done`,
//! with cancellation reachable from either sweep. Concurrency is bounded
//! on two levels: an outer pool caps how many hosts are under
//! examination at once, and a fresh inner pool per host caps concurrent
//! port probes, so a large subnet times a large port list never fans out
//! unbounded against the local network stack.

pub mod interface;
pub mod probe;
pub mod resolver;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lansweep_common::error::ParseError;
use lansweep_common::model::{HostResult, PortProbeResult, Transport};
use lansweep_common::network::{ports, range};
use lansweep_common::service;

use crate::classify;
use self::resolver::HardwareResolver;

/// Inner concurrency ceiling for TCP port probes on one host.
const INNER_PORT_WORKERS: usize = 100;
/// Inner concurrency ceiling for the optional UDP pass.
const UDP_PORT_WORKERS: usize = 50;
/// Grace window for attaching the best-effort MAC/hostname lookups.
const LOOKUP_GRACE: Duration = Duration::from_millis(100);

/// Curated UDP ports probed when UDP scanning is enabled.
pub const UDP_PROBE_PORTS: [u16; 10] = [53, 67, 69, 123, 137, 161, 500, 514, 1900, 5353];

/// Progress observer. Stages are exactly `"ping"`, `"ports"` and
/// `"complete"`; the callback may be invoked from multiple workers and
/// must not block the scan.
pub type ProgressFn = dyn Fn(&str, usize, usize, &str) + Send + Sync;

/// One scan of one network. Construct, configure, `scan()` once; a job
/// is not reusable, callers build a fresh one per scan.
pub struct ScanJob {
    targets: Vec<Ipv4Addr>,
    ports: Vec<u16>,
    timeout: Duration,
    outer_workers: usize,
    show_closed: bool,
    udp_enabled: bool,
    liveness_ports: Vec<u16>,
    progress: Option<Arc<ProgressFn>>,
    results: Arc<RwLock<Vec<HostResult>>>,
    resolver: Arc<HardwareResolver>,
    cancel: CancellationToken,
    started: AtomicBool,
    finished_tx: watch::Sender<bool>,
    finished_rx: watch::Receiver<bool>,
}

/// Everything a per-host worker needs, shared across the port sweep.
struct HostScanContext {
    timeout: Duration,
    show_closed: bool,
    udp_enabled: bool,
    ports: Arc<Vec<u16>>,
    results: Arc<RwLock<Vec<HostResult>>>,
    resolver: Arc<HardwareResolver>,
    cancel: CancellationToken,
}

impl ScanJob {
    /// Parses the target network and port specification up front;
    /// malformed input is fatal here and the scan never starts.
    pub fn new(
        network: &str,
        timeout: Duration,
        port_spec: &str,
        outer_workers: usize,
        show_closed: bool,
    ) -> Result<Self, ParseError> {
        let targets = range::expand_network(network)?;
        let ports = ports::expand_ports(port_spec)?;
        let (finished_tx, finished_rx) = watch::channel(false);
        Ok(Self {
            targets,
            ports,
            timeout,
            outer_workers: outer_workers.max(1),
            show_closed,
            udp_enabled: false,
            liveness_ports: probe::DEFAULT_LIVENESS_PORTS.to_vec(),
            progress: None,
            results: Arc::new(RwLock::new(Vec::new())),
            resolver: Arc::new(HardwareResolver::new()),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            finished_tx,
            finished_rx,
        })
    }

    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(&str, usize, usize, &str) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    pub fn set_udp_enabled(&mut self, enabled: bool) {
        self.udp_enabled = enabled;
    }

    /// Overrides the ports tried during the liveness sweep. Intended for
    /// test harnesses and unusual networks; the default list covers the
    /// commonly-open TCP ports.
    pub fn set_liveness_ports(&mut self, ports: Vec<u16>) {
        self.liveness_ports = ports;
    }

    /// Runs the scan to completion or cancellation. Invoking it a second
    /// time on the same job is a no-op.
    pub async fn scan(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("scan() called twice on the same job; ignoring");
            return;
        }
        self.run().await;
        let _ = self.finished_tx.send(true);
    }

    /// Requests cancellation and waits until every in-flight worker has
    /// exited and `scan()` has returned.
    pub async fn stop(&self) {
        self.cancel.cancel();
        if self.started.load(Ordering::SeqCst) {
            let mut finished = self.finished_rx.clone();
            let _ = finished.wait_for(|done| *done).await;
        }
    }

    /// Snapshot of the results so far. Safe to call concurrently with an
    /// in-progress scan; append order reflects completion order.
    pub fn get_results(&self) -> Vec<HostResult> {
        self.results.read().unwrap().clone()
    }

    async fn run(&self) {
        let total = self.targets.len();
        info!(
            targets = total,
            ports = self.ports.len(),
            timeout_ms = self.timeout.as_millis() as u64,
            "starting network scan"
        );
        self.emit("ping", 0, total, "checking host availability");

        let alive = self.liveness_sweep().await;
        if self.cancel.is_cancelled() {
            debug!("scan cancelled during liveness sweep");
            return;
        }
        info!(alive = alive.len(), checked = total, "liveness sweep finished");
        self.emit(
            "ping",
            total,
            total,
            &format!("found {} active hosts", alive.len()),
        );

        if !alive.is_empty() {
            self.emit("ports", 0, alive.len(), "scanning ports");
            self.port_sweep(&alive).await;
            if self.cancel.is_cancelled() {
                debug!("scan cancelled during port sweep");
                return;
            }
        }

        let found = self.results.read().unwrap().len();
        info!(devices = found, "scan complete");
        self.emit(
            "complete",
            found,
            found,
            &format!("scan complete, {found} devices found"),
        );
    }

    async fn liveness_sweep(&self) -> Vec<Ipv4Addr> {
        let total = self.targets.len();
        let outer = Arc::new(Semaphore::new(self.outer_workers));
        let alive = Arc::new(Mutex::new(Vec::new()));
        let checked = Arc::new(AtomicUsize::new(0));
        let liveness_ports = Arc::new(self.liveness_ports.clone());
        let mut sweep = JoinSet::new();

        for &ip in &self.targets {
            let permit = tokio::select! {
                _ = self.cancel.cancelled() => break,
                acquired = outer.clone().acquire_owned() => match acquired {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let cancel = self.cancel.clone();
            let alive = alive.clone();
            let checked = checked.clone();
            let progress = self.progress.clone();
            let liveness_ports = liveness_ports.clone();
            let per_probe = self.timeout;
            sweep.spawn(async move {
                let _permit = permit;
                if probe::is_host_alive(ip, &liveness_ports, per_probe, &cancel).await {
                    debug!(%ip, "host is alive");
                    alive.lock().unwrap().push(ip);
                }

                let done = checked.fetch_add(1, Ordering::SeqCst) + 1;
                if done % 10 == 0 || done == total {
                    let found = alive.lock().unwrap().len();
                    if let Some(callback) = progress {
                        callback(
                            "ping",
                            done,
                            total,
                            &format!("checked {done}/{total} hosts, {found} active"),
                        );
                    }
                }
            });
        }
        while sweep.join_next().await.is_some() {}

        alive.lock().unwrap().clone()
    }

    async fn port_sweep(&self, alive: &[Ipv4Addr]) {
        let total = alive.len();
        let outer = Arc::new(Semaphore::new(self.outer_workers));
        let scanned = Arc::new(AtomicUsize::new(0));
        let context = Arc::new(HostScanContext {
            timeout: self.timeout,
            show_closed: self.show_closed,
            udp_enabled: self.udp_enabled,
            ports: Arc::new(self.ports.clone()),
            results: self.results.clone(),
            resolver: self.resolver.clone(),
            cancel: self.cancel.clone(),
        });
        let mut sweep = JoinSet::new();

        for &ip in alive {
            let permit = tokio::select! {
                _ = self.cancel.cancelled() => break,
                acquired = outer.clone().acquire_owned() => match acquired {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let context = context.clone();
            let scanned = scanned.clone();
            let progress = self.progress.clone();
            sweep.spawn(async move {
                let _permit = permit;
                scan_host(ip, &context).await;

                let done = scanned.fetch_add(1, Ordering::SeqCst) + 1;
                if done % 5 == 0 || done == total {
                    if let Some(callback) = progress {
                        callback(
                            "ports",
                            done,
                            total,
                            &format!("scanned {done}/{total} hosts"),
                        );
                    }
                }
            });
        }
        while sweep.join_next().await.is_some() {}
    }

    fn emit(&self, stage: &str, current: usize, total: usize, message: &str) {
        if let Some(callback) = &self.progress {
            callback(stage, current, total, message);
        }
    }
}

/// Profiles one live host: a bounded fan-out over the port list, with
/// the MAC and hostname lookups running in the background and joined
/// against a short grace window afterwards. The finished `HostResult` is
/// appended to the shared collection in one atomic step.
async fn scan_host(ip: Ipv4Addr, context: &HostScanContext) {
    debug!(%ip, "scanning host");
    let mut host = HostResult::new(ip);

    let mac_lookup = {
        let resolver = context.resolver.clone();
        let cancel = context.cancel.clone();
        tokio::spawn(async move { resolver.resolve(ip, &cancel).await })
    };
    let hostname_lookup =
        tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&IpAddr::V4(ip)).ok());

    fan_out(ip, Transport::Tcp, &context.ports, INNER_PORT_WORKERS, context, &mut host).await;
    if context.udp_enabled && !context.cancel.is_cancelled() {
        fan_out(ip, Transport::Udp, &UDP_PROBE_PORTS, UDP_PORT_WORKERS, context, &mut host).await;
    }

    // Neither lookup may hold up port-scan completion; whatever resolved
    // within the grace window is attached, absence is not an error.
    if let Some(mac) = join_within(LOOKUP_GRACE, mac_lookup).await {
        host.vendor = classify::vendor_of(&mac.to_string()).to_string();
        host.mac = Some(mac);
    }
    if let Some(name) = join_within(LOOKUP_GRACE, hostname_lookup).await {
        host.hostname = Some(name);
    }

    host.device_type = classify::classify_device(&host).to_string();
    debug!(
        %ip,
        open = host.open_ports().count(),
        device_type = %host.device_type,
        "host scan finished"
    );

    context.results.write().unwrap().push(host);
}

/// Bounded fan-out over one port list. Probe outcomes flow through a
/// channel buffered to the full port count, so a probe can never block
/// on reporting; after the probes are joined the channel is drained even
/// when the scan was cancelled, preserving completed work.
async fn fan_out(
    ip: Ipv4Addr,
    transport: Transport,
    port_list: &[u16],
    worker_cap: usize,
    context: &HostScanContext,
    host: &mut HostResult,
) {
    if port_list.is_empty() {
        return;
    }
    let inner = Arc::new(Semaphore::new(worker_cap.min(port_list.len())));
    let (tx, mut rx) = mpsc::channel::<PortProbeResult>(port_list.len());
    let mut probes = JoinSet::new();

    for &port in port_list {
        let permit = tokio::select! {
            _ = context.cancel.cancelled() => break,
            acquired = inner.clone().acquire_owned() => match acquired {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let tx = tx.clone();
        let cancel = context.cancel.clone();
        let per_probe = context.timeout;
        let show_closed = context.show_closed;
        probes.spawn(async move {
            let _permit = permit;
            let state = tokio::select! {
                _ = cancel.cancelled() => return,
                state = probe::probe(ip, port, transport, per_probe) => state,
            };
            if state.is_open() || show_closed {
                let outcome = PortProbeResult {
                    port,
                    transport,
                    state,
                    service: service::service_name(port),
                };
                let _ = tx.send(outcome).await;
            }
        });
    }
    drop(tx);
    while probes.join_next().await.is_some() {}

    while let Some(outcome) = rx.recv().await {
        host.record_port(outcome);
    }
}

/// Joins a background lookup against a grace window; the task is aborted
/// once the window elapses.
async fn join_within<T>(grace: Duration, mut task: tokio::task::JoinHandle<Option<T>>) -> Option<T> {
    tokio::select! {
        joined = &mut task => joined.ok().flatten(),
        _ = tokio::time::sleep(grace) => {
            task.abort();
            None
        }
    }
}

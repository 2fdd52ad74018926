//! Single-shot port and liveness probes.
//!
//! Every probe is one attempt with one timeout; a failed probe is
//! definitive for that attempt and nothing here retries.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use lansweep_common::model::{PortState, Transport};

/// Commonly-open ports tried, in order, during the liveness sweep.
pub const DEFAULT_LIVENESS_PORTS: [u16; 6] = [80, 443, 22, 135, 139, 445];

/// Probes a single port over the given transport.
pub async fn probe(ip: Ipv4Addr, port: u16, transport: Transport, per_probe: Duration) -> PortState {
    match transport {
        Transport::Tcp => probe_tcp(ip, port, per_probe).await,
        Transport::Udp => probe_udp(ip, port, per_probe).await,
    }
}

/// Bare connect-and-drop. Refused, timed out and unreachable are not
/// distinguished; anything but a completed handshake is `Closed`.
async fn probe_tcp(ip: Ipv4Addr, port: u16, per_probe: Duration) -> PortState {
    let addr = SocketAddr::new(IpAddr::V4(ip), port);
    match timeout(per_probe, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => PortState::Open,
        Ok(Err(_)) | Err(_) => PortState::Closed,
    }
}

/// Sends a zero-length datagram and waits for one read.
///
/// Without ICMP visibility a silent UDP port is indistinguishable from a
/// service that ignores empty probes, so a read timeout is reported as
/// `Open`. This optimistic approximation is inherited from the reference
/// tool and deliberately kept.
async fn probe_udp(ip: Ipv4Addr, port: u16, per_probe: Duration) -> PortState {
    let addr = SocketAddr::new(IpAddr::V4(ip), port);
    let socket = match UdpSocket::bind(("0.0.0.0", 0)).await {
        Ok(socket) => socket,
        Err(_) => return PortState::Closed,
    };
    if socket.connect(addr).await.is_err() {
        return PortState::Closed;
    }
    if socket.send(&[]).await.is_err() {
        return PortState::Closed;
    }

    let mut buf = [0u8; 1024];
    match timeout(per_probe, socket.recv(&mut buf)).await {
        Ok(Ok(_)) => PortState::Open,
        Err(_) => PortState::Open,
        Ok(Err(_)) => PortState::Closed,
    }
}

/// Heuristic liveness check: sequential TCP connects against a short
/// port list, true on the first success. Not an ICMP ping; hosts that
/// only expose uncommon ports will be missed.
pub async fn is_host_alive(
    ip: Ipv4Addr,
    liveness_ports: &[u16],
    per_probe: Duration,
    cancel: &CancellationToken,
) -> bool {
    for &port in liveness_ports {
        if cancel.is_cancelled() {
            return false;
        }
        let addr = SocketAddr::new(IpAddr::V4(ip), port);
        let attempt = timeout(per_probe, TcpStream::connect(addr));
        tokio::select! {
            _ = cancel.cancelled() => return false,
            outcome = attempt => {
                if matches!(outcome, Ok(Ok(_))) {
                    trace!(%ip, port, "liveness probe connected");
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn local_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn tcp_probe_reports_a_listener_as_open() {
        let (_listener, port) = local_listener().await;
        let state = probe(
            Ipv4Addr::LOCALHOST,
            port,
            Transport::Tcp,
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(state, PortState::Open);
    }

    #[tokio::test]
    async fn tcp_probe_reports_a_refused_port_as_closed() {
        let (listener, port) = local_listener().await;
        drop(listener);
        let state = probe(
            Ipv4Addr::LOCALHOST,
            port,
            Transport::Tcp,
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(state, PortState::Closed);
    }

    #[tokio::test]
    async fn udp_probe_reports_a_replying_service_as_open() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 16];
            if let Ok((_, peer)) = server.recv_from(&mut buf).await {
                let _ = server.send_to(b"pong", peer).await;
            }
        });

        let state = probe(
            Ipv4Addr::LOCALHOST,
            port,
            Transport::Udp,
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(state, PortState::Open);
    }

    #[tokio::test]
    async fn liveness_succeeds_on_the_first_answering_port() {
        let (_listener, port) = local_listener().await;
        let cancel = CancellationToken::new();
        let alive = is_host_alive(
            Ipv4Addr::LOCALHOST,
            &[port],
            Duration::from_millis(500),
            &cancel,
        )
        .await;
        assert!(alive);
    }

    #[tokio::test]
    async fn liveness_fails_when_every_port_refuses() {
        let (listener, port) = local_listener().await;
        drop(listener);
        let cancel = CancellationToken::new();
        let alive = is_host_alive(
            Ipv4Addr::LOCALHOST,
            &[port],
            Duration::from_millis(500),
            &cancel,
        )
        .await;
        assert!(!alive);
    }

    #[tokio::test]
    async fn cancelled_liveness_check_returns_false() {
        let (_listener, port) = local_listener().await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let alive = is_host_alive(
            Ipv4Addr::LOCALHOST,
            &[port],
            Duration::from_millis(500),
            &cancel,
        )
        .await;
        assert!(!alive);
    }
}

use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

/// One-shot probe timeout shared by both probe families.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Which transport family produced a [`ProbeResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFamily {
    Icmp,
    Tcp,
}

/// The outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success { latency_ms: u16 },
    Failure,
}

/// One probe result, emitted exactly once per launched probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub ip: IpAddr,
    pub response_index: usize,
    pub family: ProbeFamily,
    pub outcome: ProbeOutcome,
}

fn clamp_latency(elapsed: Duration) -> u16 {
    elapsed.as_millis().min(u16::MAX as u128) as u16
}

/// Send a single privileged ICMP echo with a bounded timeout.
///
/// Construction errors (e.g. insufficient privilege to open a raw socket) and
/// timeouts both collapse to `ProbeOutcome::Failure` so the race coordinator's
/// per-probe count invariant holds regardless of cause.
pub async fn icmp_probe(ip: IpAddr) -> ProbeOutcome {
    let start = Instant::now();
    match tokio::time::timeout(PROBE_TIMEOUT, surge_ping::ping(ip, &[])).await {
        Ok(Ok(_reply)) => ProbeOutcome::Success {
            latency_ms: clamp_latency(start.elapsed()),
        },
        Ok(Err(err)) => {
            debug!(%ip, error = %err, "icmp probe failed");
            ProbeOutcome::Failure
        }
        Err(_) => {
            debug!(%ip, "icmp probe timed out");
            ProbeOutcome::Failure
        }
    }
}

/// Open a TCP connection to `(ip, port)` with a bounded deadline; close immediately
/// on success without exchanging any data.
pub async fn tcp_probe(ip: IpAddr, port: u16) -> ProbeOutcome {
    let start = Instant::now();
    match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((ip, port))).await {
        Ok(Ok(stream)) => {
            let latency_ms = clamp_latency(start.elapsed());
            drop(stream);
            ProbeOutcome::Success { latency_ms }
        }
        Ok(Err(err)) => {
            debug!(%ip, port, error = %err, "tcp connect probe failed");
            ProbeOutcome::Failure
        }
        Err(_) => {
            debug!(%ip, port, "tcp connect probe timed out");
            ProbeOutcome::Failure
        }
    }
}

/// Abstraction over "run one probe of a given family against a candidate".
///
/// The race coordinator (`crate::race`) depends on this trait rather than calling
/// `icmp_probe`/`tcp_probe` directly so that tests can substitute a deterministic
/// fake prober instead of touching real sockets.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ip: IpAddr, family: ProbeFamily) -> ProbeOutcome;
}

/// The real prober: ICMP via `surge-ping`, TCP connect via `tokio::net::TcpStream`.
pub struct DefaultProber {
    pub tcp_port: u16,
}

#[async_trait]
impl Prober for DefaultProber {
    async fn probe(&self, ip: IpAddr, family: ProbeFamily) -> ProbeOutcome {
        match family {
            ProbeFamily::Icmp => icmp_probe(ip).await,
            ProbeFamily::Tcp => tcp_probe(ip, self.tcp_port).await,
        }
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use hickory_proto::op::Message;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::dns::parse_response;
use crate::error::EngineError;

/// The external collaborator contract for a single upstream resolver: send a
/// request, get a response. Concrete transports (plaintext UDP, DoT, DoH) all
/// implement this; the engine only ever depends on the trait.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn exchange(&self, request: &Message) -> Result<Message, EngineError>;
    fn address(&self) -> &str;
}

/// The external collaborator contract for fanning a request out across many
/// upstreams in parallel and collecting every successful response.
#[async_trait]
pub trait ExchangeAll: Send + Sync {
    async fn exchange_all(
        &self,
        upstreams: &[Arc<dyn Upstream>],
        request: &Message,
    ) -> Result<Vec<(Message, Arc<dyn Upstream>)>, EngineError>;
}

/// A minimal, concrete plaintext-UDP `Upstream`. Binds a fresh socket per
/// exchange (avoiding response stealing between concurrent queries sharing a
/// socket), sends once, and retries the receive on txid mismatch until the
/// deadline elapses.
pub struct UdpUpstream {
    label: String,
    addr: SocketAddr,
    timeout: Duration,
}

impl UdpUpstream {
    pub fn new(label: impl Into<String>, addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            addr,
            timeout,
        }
    }
}

#[async_trait]
impl Upstream for UdpUpstream {
    async fn exchange(&self, request: &Message) -> Result<Message, EngineError> {
        let txid = request.id();
        let query_bytes = request.to_vec().map_err(|e| EngineError::Upstream {
            label: self.label.clone(),
            source: anyhow!("failed to serialize query: {e}"),
        })?;

        let bind_addr = if self.addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| EngineError::Upstream {
            label: self.label.clone(),
            source: e.into(),
        })?;

        socket
            .send_to(&query_bytes, self.addr)
            .await
            .map_err(|e| EngineError::Upstream {
                label: self.label.clone(),
                source: e.into(),
            })?;

        let start = Instant::now();
        let mut buf = vec![0u8; 4096];
        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(EngineError::Upstream {
                    label: self.label.clone(),
                    source: anyhow!("timed out waiting for a response"),
                });
            }
            let remaining = self.timeout - elapsed;
            let (len, _src) = tokio::time::timeout(remaining, socket.recv_from(&mut buf))
                .await
                .map_err(|_| EngineError::Upstream {
                    label: self.label.clone(),
                    source: anyhow!("timed out waiting for a response"),
                })?
                .map_err(|e| EngineError::Upstream {
                    label: self.label.clone(),
                    source: e.into(),
                })?;

            match parse_response(&buf[..len], txid) {
                Ok(message) => return Ok(message),
                Err(_) => {
                    // Stray packet or txid mismatch: keep waiting for the real reply.
                    debug!(upstream = %self.label, "ignoring unmatched UDP reply");
                    continue;
                }
            }
        }
    }

    fn address(&self) -> &str {
        &self.label
    }
}

/// The reference `ExchangeAll`: one `tokio::spawn` per upstream, collected as
/// they complete. Succeeds as long as at least one upstream answers.
pub struct ParallelExchangeAll;

#[async_trait]
impl ExchangeAll for ParallelExchangeAll {
    async fn exchange_all(
        &self,
        upstreams: &[Arc<dyn Upstream>],
        request: &Message,
    ) -> Result<Vec<(Message, Arc<dyn Upstream>)>, EngineError> {
        if upstreams.is_empty() {
            return Err(EngineError::NoUpstreams);
        }

        let mut handles = Vec::with_capacity(upstreams.len());
        for upstream in upstreams {
            let upstream = upstream.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                let result = upstream.exchange(&request).await;
                (result, upstream)
            }));
        }

        let mut responses = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((Ok(message), upstream)) => responses.push((message, upstream)),
                Ok((Err(err), upstream)) => {
                    warn!(upstream = upstream.address(), error = %err, "upstream exchange failed")
                }
                Err(join_err) => warn!(error = %join_err, "upstream task panicked"),
            }
        }

        if responses.is_empty() {
            return Err(EngineError::AllUpstreamsFailed);
        }
        Ok(responses)
    }
}

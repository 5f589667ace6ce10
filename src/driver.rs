use std::sync::Arc;

use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use tracing::{info, instrument, Span};

use crate::cache::{ReachabilityCache, Status};
use crate::candidates::extract_candidates;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::probe::{DefaultProber, Prober};
use crate::race::race;
use crate::upstream::{ExchangeAll, Upstream};

/// A cached reachability observation carried forward from the cache-only pass into
/// the comparison step.
struct CachedWinner {
    ip: std::net::IpAddr,
    response_index: usize,
    latency_ms: u16,
}

/// The top-level orchestrator tying `ExchangeAll`, the reachability cache, the
/// probe race, and response rewriting together (SPEC_FULL.md §4.5).
pub struct Engine {
    config: EngineConfig,
    cache: Arc<ReachabilityCache>,
    exchange_all: Arc<dyn ExchangeAll>,
    prober: Arc<dyn Prober>,
}

impl Engine {
    pub fn new(config: EngineConfig, exchange_all: Arc<dyn ExchangeAll>) -> Self {
        let cache = Arc::new(ReachabilityCache::new(
            config.cache_size_bytes,
            config.ttl_seconds,
        ));
        let prober = Arc::new(DefaultProber {
            tcp_port: config.tcp_port,
        });
        Self {
            config,
            cache,
            exchange_all,
            prober,
        }
    }

    /// Construct an engine with an injected prober, for tests that need to control
    /// probe outcomes without touching real sockets.
    pub fn with_prober(
        config: EngineConfig,
        exchange_all: Arc<dyn ExchangeAll>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        let cache = Arc::new(ReachabilityCache::new(
            config.cache_size_bytes,
            config.ttl_seconds,
        ));
        Self {
            config,
            cache,
            exchange_all,
            prober,
        }
    }

    #[instrument(skip_all, fields(query = tracing::field::Empty, record_type = tracing::field::Empty))]
    pub async fn exchange_fastest(
        &self,
        request: &Message,
        upstreams: &[Arc<dyn Upstream>],
    ) -> Result<(Message, Arc<dyn Upstream>), EngineError> {
        // Step 1: fan the query out. Whole-query failure is the only error surfaced
        // to the caller; everything below this line is absorbed.
        let responses = self.exchange_all.exchange_all(upstreams, request).await?;

        // Step 2: the query name is normalized only for diagnostics, never used as
        // a cache key. Recorded onto the span (not just the event below) so a
        // subscriber that keys off span fields can still correlate by query.
        if let Some(query) = request.queries().first() {
            let name = query.name().to_string().to_lowercase();
            Span::current().record("query", tracing::field::display(&name));
            Span::current().record("record_type", tracing::field::debug(query.query_type()));
            info!(query = %name, upstreams = upstreams.len(), "selecting fastest address");
        }

        // Step 3: short-circuit on ≤ 1 candidate.
        let candidates = extract_candidates(&responses);
        if candidates.len() <= 1 {
            let (first, upstream) = responses.into_iter().next().expect("exchange_all guarantees >=1 response");
            return Ok((first, upstream));
        }

        // Step 4: cache-only pass.
        let mut cached_winner: Option<CachedWinner> = None;
        let mut n_cached = 0usize;
        let mut uncached = Vec::new();
        for candidate in &candidates {
            match self.cache.get(candidate.ip) {
                Some(entry) => {
                    n_cached += 1;
                    if entry.status == Status::Reachable {
                        let better = cached_winner
                            .as_ref()
                            .map(|w| entry.latency_ms < w.latency_ms)
                            .unwrap_or(true);
                        if better {
                            cached_winner = Some(CachedWinner {
                                ip: candidate.ip,
                                response_index: candidate.response_index,
                                latency_ms: entry.latency_ms,
                            });
                        }
                    }
                }
                None => uncached.push(candidate.clone()),
            }
        }

        // Step 5: all-hit fast path.
        if n_cached == candidates.len() {
            if let Some(winner) = cached_winner {
                return Ok(rewrite(responses, winner.response_index, winner.ip));
            }
        }

        // Step 6/7: race pass over every uncached candidate.
        let probe_winner = if uncached.is_empty() {
            None
        } else {
            race(
                &uncached,
                self.config.allow_icmp,
                self.config.allow_tcp,
                self.prober.clone(),
                self.cache.clone(),
            )
            .await
        };

        // Step 8: comparison.
        let winner = match (cached_winner, probe_winner) {
            (Some(cached), Some(probe)) => {
                if probe.latency_ms <= cached.latency_ms {
                    Some((probe.response_index, probe.ip))
                } else {
                    Some((cached.response_index, cached.ip))
                }
            }
            (Some(cached), None) => Some((cached.response_index, cached.ip)),
            (None, Some(probe)) => Some((probe.response_index, probe.ip)),
            (None, None) => None,
        };

        match winner {
            Some((response_index, ip)) => Ok(rewrite(responses, response_index, ip)),
            None => {
                let (first, upstream) = responses.into_iter().next().expect("exchange_all guarantees >=1 response");
                Ok((first, upstream))
            }
        }
    }
}

/// Mutate the winner's response so its Answer section retains only A/AAAA records
/// matching `ip`, leaving non-address records and the header untouched.
fn rewrite(
    mut responses: Vec<(Message, Arc<dyn Upstream>)>,
    response_index: usize,
    ip: std::net::IpAddr,
) -> (Message, Arc<dyn Upstream>) {
    let (mut message, upstream) = responses.swap_remove(response_index);
    let kept: Vec<_> = message
        .take_answers()
        .into_iter()
        .filter(|record| match record.data() {
            Some(RData::A(v4)) => std::net::IpAddr::V4((*v4).into()).to_canonical() == ip,
            Some(RData::AAAA(v6)) => std::net::IpAddr::V6((*v6).into()).to_canonical() == ip,
            _ => true,
        })
        .collect();
    message.insert_answers(kept);
    (message, upstream)
}

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cache::{ReachabilityCache, Status};
use crate::candidates::Candidate;
use crate::probe::{ProbeFamily, ProbeOutcome, Prober};

/// The winning candidate from a probe race.
pub struct RaceWinner {
    pub ip: IpAddr,
    pub response_index: usize,
    pub latency_ms: u16,
}

struct Launch {
    ip: IpAddr,
    response_index: usize,
    family: ProbeFamily,
}

struct Delivered {
    ip: IpAddr,
    response_index: usize,
    outcome: ProbeOutcome,
}

/// Launch one probe per (uncached candidate × enabled family), race them to the
/// first success, and record every observed result into `cache` as it arrives.
///
/// Once a winner is found, this function returns immediately without waiting for
/// the remaining in-flight probes; those probes are not cancelled and keep running
/// in the background, still writing their results into `cache` when they land
/// (see SPEC_FULL.md §9 — no cancellation, late results only warm the cache).
pub async fn race(
    candidates: &[Candidate],
    allow_icmp: bool,
    allow_tcp: bool,
    prober: Arc<dyn Prober>,
    cache: Arc<ReachabilityCache>,
) -> Option<RaceWinner> {
    let mut launches = Vec::new();
    for candidate in candidates {
        if allow_icmp {
            launches.push(Launch {
                ip: candidate.ip,
                response_index: candidate.response_index,
                family: ProbeFamily::Icmp,
            });
        }
        if allow_tcp {
            launches.push(Launch {
                ip: candidate.ip,
                response_index: candidate.response_index,
                family: ProbeFamily::Tcp,
            });
        }
    }
    let launched = launches.len();
    if launched == 0 {
        return None;
    }

    let (tx, mut rx) = mpsc::channel::<Delivered>(launched);
    for launch in launches {
        let tx = tx.clone();
        let prober = prober.clone();
        tokio::spawn(async move {
            let outcome = prober.probe(launch.ip, launch.family).await;
            let _ = tx
                .send(Delivered {
                    ip: launch.ip,
                    response_index: launch.response_index,
                    outcome,
                })
                .await;
        });
    }
    drop(tx);

    let mut received = 0usize;
    // The exit condition is checked at the top of every iteration (`received <
    // launched`), not derived from the receive call itself, so "all probes
    // accounted for, none succeeded" is always reachable.
    while received < launched {
        let Some(delivered) = rx.recv().await else {
            break;
        };
        received += 1;
        record(&cache, &delivered);

        if let ProbeOutcome::Success { latency_ms } = delivered.outcome {
            debug!(ip = %delivered.ip, latency_ms, "probe won the race");
            let winner = RaceWinner {
                ip: delivered.ip,
                response_index: delivered.response_index,
                latency_ms,
            };
            if received < launched {
                // Drain the rest in the background so late results still warm the
                // cache, without delaying this return.
                let cache = cache.clone();
                let still_expected = launched - received;
                tokio::spawn(async move {
                    let mut seen = 0usize;
                    while seen < still_expected {
                        match rx.recv().await {
                            Some(d) => {
                                seen += 1;
                                record(&cache, &d);
                            }
                            None => break,
                        }
                    }
                });
            }
            return Some(winner);
        }
    }

    info!(launched, "probe race had no winner");
    None
}

fn record(cache: &ReachabilityCache, delivered: &Delivered) {
    match delivered.outcome {
        ProbeOutcome::Success { latency_ms } => {
            cache.put(delivered.ip, Status::Reachable, latency_ms)
        }
        ProbeOutcome::Failure => cache.put(delivered.ip, Status::Unreachable, 0),
    }
}

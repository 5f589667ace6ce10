use std::net::IpAddr;
use std::sync::Arc;

use hickory_proto::op::Message;
use hickory_proto::rr::RData;

use crate::upstream::Upstream;

/// One candidate address extracted from an upstream response.
///
/// `response_index` points back into the `[(Message, Arc<dyn Upstream>)]` slice the
/// candidate was extracted from; the rewriter and the race coordinator both need to
/// get back to the originating response without borrowing it for the probe race.
#[derive(Clone)]
pub struct Candidate {
    pub ip: IpAddr,
    pub response_index: usize,
    pub upstream: Arc<dyn Upstream>,
}

/// Extract every A/AAAA answer from a set of exchange results.
///
/// Non-address records (CNAME, NS, SOA, ...) are ignored. Candidates are returned in
/// response-iteration order, then answer-iteration order within each response.
pub fn extract_candidates(responses: &[(Message, Arc<dyn Upstream>)]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (response_index, (message, upstream)) in responses.iter().enumerate() {
        for record in message.answers() {
            let ip = match record.data() {
                Some(RData::A(v4)) => IpAddr::V4((*v4).into()),
                Some(RData::AAAA(v6)) => IpAddr::V6((*v6).into()),
                _ => continue,
            };
            candidates.push(Candidate {
                // `to_canonical` collapses a v4-mapped v6 answer to its 4-byte form so
                // it lines up with the cache's canonical key.
                ip: ip.to_canonical(),
                response_index,
                upstream: upstream.clone(),
            });
        }
    }
    candidates
}

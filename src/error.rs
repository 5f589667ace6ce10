use thiserror::Error;

/// Whole-query failures surfaced by [`crate::Engine::exchange_fastest`].
///
/// Everything below query granularity (a single upstream erroring, a probe
/// failing, a corrupt cache record) is absorbed into the selection algorithm and
/// never reaches the caller as an `Err` — see SPEC_FULL.md §7.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no upstreams were configured for this query")]
    NoUpstreams,

    #[error("all upstreams failed to answer the query")]
    AllUpstreamsFailed,

    #[error("upstream {label} failed: {source}")]
    Upstream {
        label: String,
        #[source]
        source: anyhow::Error,
    },
}

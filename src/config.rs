use crate::cache::{DEFAULT_CACHE_SIZE_BYTES, DEFAULT_TTL_SECONDS};

/// Engine configuration (§6 of SPEC_FULL.md). All fields have sane defaults so
/// `EngineConfig::default()` is a reasonable starting point.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Launch ICMP echo probes against candidates.
    pub allow_icmp: bool,
    /// Launch TCP connect probes against candidates.
    pub allow_tcp: bool,
    /// Destination port used by TCP connect probes.
    pub tcp_port: u16,
    /// Approximate byte budget for the reachability cache.
    pub cache_size_bytes: u32,
    /// Time-to-live for cache entries, in seconds. Applies equally to reachable
    /// and unreachable entries (see SPEC_FULL.md §9).
    pub ttl_seconds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_icmp: true,
            allow_tcp: true,
            tcp_port: 80,
            cache_size_bytes: DEFAULT_CACHE_SIZE_BYTES,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

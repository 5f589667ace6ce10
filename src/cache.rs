use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;

/// Default maximum size of the reachability cache, in bytes (approximate).
pub const DEFAULT_CACHE_SIZE_BYTES: u32 = 1024 * 1024;
/// Default time-to-live for a stored entry, in seconds.
pub const DEFAULT_TTL_SECONDS: u32 = 600;

/// Rough per-entry overhead (key + packed record + map/LRU bookkeeping) used to turn a
/// byte budget into an entry-count capacity for `lru::LruCache`.
const ENTRY_OVERHEAD_BYTES: usize = 48;

const PACKED_LEN: usize = 7;

/// Whether a probed address was reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Reachable,
    Unreachable,
}

/// A decoded reachability cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub expiry_unix_secs: u32,
    pub status: Status,
    /// Latency in milliseconds. Only meaningful when `status` is `Reachable`.
    pub latency_ms: u16,
}

impl Entry {
    fn pack(self) -> [u8; PACKED_LEN] {
        let mut buf = [0u8; PACKED_LEN];
        buf[0..4].copy_from_slice(&self.expiry_unix_secs.to_be_bytes());
        buf[4] = match self.status {
            Status::Reachable => 0,
            Status::Unreachable => 1,
        };
        buf[5..7].copy_from_slice(&self.latency_ms.to_be_bytes());
        buf
    }

    /// Decode a packed record. Returns `None` for a short/corrupt buffer, which the
    /// cache treats identically to a miss.
    fn unpack(buf: &[u8]) -> Option<Self> {
        if buf.len() < PACKED_LEN {
            return None;
        }
        let expiry_unix_secs = u32::from_be_bytes(buf[0..4].try_into().ok()?);
        let status = match buf[4] {
            0 => Status::Reachable,
            _ => Status::Unreachable,
        };
        let latency_ms = u16::from_be_bytes(buf[5..7].try_into().ok()?);
        Some(Entry {
            expiry_unix_secs,
            status,
            latency_ms,
        })
    }
}

/// Canonicalize an IP address to the form used as the cache key: a 4-in-6 mapped
/// address collapses to its IPv4 form so both response families hit the same entry.
fn canonical_key(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}

fn now_unix_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Bounded LRU cache mapping canonical IP addresses to packed reachability records.
///
/// Safe for concurrent `get`/`put` from many probe workers; callers never need to
/// coordinate around it.
pub struct ReachabilityCache {
    inner: Mutex<LruCache<IpAddr, [u8; PACKED_LEN]>>,
    ttl_seconds: u32,
}

impl ReachabilityCache {
    pub fn new(max_bytes: u32, ttl_seconds: u32) -> Self {
        let capacity = (max_bytes as usize / ENTRY_OVERHEAD_BYTES).max(1);
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl_seconds,
        }
    }

    /// Look up an address. An expired entry is indistinguishable from a miss and is
    /// left in place for LRU pressure to evict later, not proactively removed.
    pub fn get(&self, ip: IpAddr) -> Option<Entry> {
        let key = canonical_key(ip);
        let mut cache = self.inner.lock().unwrap();
        let packed = cache.get(&key)?;
        let entry = Entry::unpack(packed)?;
        if entry.expiry_unix_secs <= now_unix_secs() {
            return None;
        }
        Some(entry)
    }

    /// Store a reachability observation, encoding the fixed 7-byte record with
    /// `expiry = now + ttl_seconds`.
    pub fn put(&self, ip: IpAddr, status: Status, latency_ms: u16) {
        let key = canonical_key(ip);
        let entry = Entry {
            expiry_unix_secs: now_unix_secs().saturating_add(self.ttl_seconds),
            status,
            latency_ms,
        };
        let mut cache = self.inner.lock().unwrap();
        cache.put(key, entry.pack());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::net::Ipv6Addr;

    #[test]
    fn round_trip_reachable() {
        let cache = ReachabilityCache::new(DEFAULT_CACHE_SIZE_BYTES, 600);
        let ip: IpAddr = Ipv4Addr::new(1, 1, 1, 1).into();
        cache.put(ip, Status::Reachable, 42);
        let got = cache.get(ip).unwrap();
        assert_eq!(got.status, Status::Reachable);
        assert_eq!(got.latency_ms, 42);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ReachabilityCache::new(DEFAULT_CACHE_SIZE_BYTES, 0);
        let ip: IpAddr = Ipv4Addr::new(2, 2, 2, 2).into();
        cache.put(ip, Status::Reachable, 10);
        // ttl=0 means expiry == now, which the strict `<=` check treats as expired.
        assert!(cache.get(ip).is_none());
    }

    #[test]
    fn unreachable_is_stored_but_distinguishable() {
        let cache = ReachabilityCache::new(DEFAULT_CACHE_SIZE_BYTES, 600);
        let ip: IpAddr = Ipv4Addr::new(3, 3, 3, 3).into();
        cache.put(ip, Status::Unreachable, 0);
        let got = cache.get(ip).unwrap();
        assert_eq!(got.status, Status::Unreachable);
    }

    #[test]
    fn v4_mapped_v6_canonicalizes_to_v4_entry() {
        let cache = ReachabilityCache::new(DEFAULT_CACHE_SIZE_BYTES, 600);
        let v4: IpAddr = Ipv4Addr::new(9, 9, 9, 9).into();
        let mapped: IpAddr = Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0x0909, 0x0909).into();
        cache.put(mapped, Status::Reachable, 15);
        let got = cache.get(v4).unwrap();
        assert_eq!(got.latency_ms, 15);
    }

    #[test]
    fn lru_eviction_under_pressure() {
        // Force a tiny capacity so the second `put` evicts the first.
        let cache = ReachabilityCache::new(ENTRY_OVERHEAD_BYTES as u32, 600);
        let a: IpAddr = Ipv4Addr::new(1, 0, 0, 1).into();
        let b: IpAddr = Ipv4Addr::new(1, 0, 0, 2).into();
        cache.put(a, Status::Reachable, 1);
        cache.put(b, Status::Reachable, 2);
        assert!(cache.get(a).is_none());
        assert!(cache.get(b).is_some());
    }

    #[test]
    fn latency_clamped_to_u16_range_by_caller() {
        // The cache itself just stores whatever u16 it's given; clamping to the
        // 0..65535ms range is the probe's responsibility before calling `put`.
        let cache = ReachabilityCache::new(DEFAULT_CACHE_SIZE_BYTES, 600);
        let ip: IpAddr = Ipv4Addr::new(4, 4, 4, 4).into();
        cache.put(ip, Status::Reachable, u16::MAX);
        assert_eq!(cache.get(ip).unwrap().latency_ms, u16::MAX);
    }
}

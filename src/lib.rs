//! Fastest-address DNS selection engine.
//!
//! Given a query and a set of upstream resolvers, [`driver::Engine`] fans the
//! query out, extracts candidate A/AAAA addresses from the responses, and races
//! ICMP echo / TCP connect probes against them to pick whichever address is
//! expected to give the client the lowest connection latency. See
//! [`driver::Engine::exchange_fastest`] for the full selection protocol.

pub mod cache;
pub mod candidates;
pub mod cli;
pub mod config;
pub mod dns;
pub mod driver;
pub mod error;
pub mod probe;
pub mod race;
pub mod resolver;
pub mod upstream;

pub use config::EngineConfig;
pub use driver::Engine;
pub use error::EngineError;
pub use upstream::{ExchangeAll, ParallelExchangeAll, UdpUpstream, Upstream};

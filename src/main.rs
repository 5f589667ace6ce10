use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use hickory_proto::rr::RecordType;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use fastest_dns_proxy::cli::Cli;
use fastest_dns_proxy::{dns, resolver, Engine, EngineConfig, ParallelExchangeAll, UdpUpstream, Upstream};

fn init_logging() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();
}

fn build_upstreams(cli: &Cli, timeout: Duration) -> Result<Vec<Arc<dyn Upstream>>> {
	let mut resolvers = Vec::new();
	for r in &cli.resolvers {
		resolvers.push(resolver::parse_resolver(r)?);
	}
	if let Some(path) = &cli.resolver_file {
		resolvers.extend(resolver::read_resolver_file(path)?);
	}
	if cli.system_resolvers {
		resolvers.extend(resolver::system_resolvers());
	}
	if resolvers.is_empty() {
		resolvers = resolver::default_resolvers();
	}

	Ok(resolvers
		.into_iter()
		.map(|r| -> Arc<dyn Upstream> {
			let addr: SocketAddr = r.addr;
			Arc::new(UdpUpstream::new(r.label, addr, timeout))
		})
		.collect())
}

#[tokio::main]
async fn main() -> Result<()> {
	init_logging();
	let cli = Cli::parse();

	let timeout = Duration::from_millis(cli.timeout);
	let upstreams = build_upstreams(&cli, timeout)?;
	if upstreams.is_empty() {
		return Err(anyhow!("no upstream resolvers configured"));
	}

	let record_type = if cli.aaaa { RecordType::AAAA } else { RecordType::A };
	let txid: u16 = rand::thread_rng().gen();
	let query_bytes = dns::build_query(&cli.name, record_type, txid)?;
	let request = hickory_proto::op::Message::from_vec(&query_bytes)
		.map_err(|e| anyhow!("failed to build query message: {}", e))?;

	let config = EngineConfig {
		allow_icmp: !cli.no_icmp,
		allow_tcp: !cli.no_tcp,
		tcp_port: cli.tcp_port,
		cache_size_bytes: cli.cache_size_bytes,
		ttl_seconds: cli.ttl_seconds,
	};
	let engine = Engine::new(config, Arc::new(ParallelExchangeAll));

	let (response, upstream) = engine.exchange_fastest(&request, &upstreams).await?;

	println!("resolved {} via {}", cli.name, upstream.address());
	for record in response.answers() {
		println!("  {} {:?} {:?}", record.name(), record.record_type(), record.data());
	}

	Ok(())
}

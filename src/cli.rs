use clap::Parser;

/// Resolve a name through the fastest-address selection engine.
#[derive(Parser, Debug)]
#[command(name = "fastest-dns-proxy")]
#[command(about = "Query multiple DNS resolvers in parallel and return the fastest address")]
pub struct Cli {
	/// The name to resolve (e.g. example.com)
	pub name: String,

	/// DNS resolver address (repeatable, e.g. 1.1.1.1 or 1.1.1.1:53)
	#[arg(short = 'r', long = "resolver")]
	pub resolvers: Vec<String>,

	/// File containing resolver addresses (one per line)
	#[arg(short = 'f', long = "resolver-file")]
	pub resolver_file: Option<String>,

	/// Include system resolvers from /etc/resolv.conf
	#[arg(long = "system-resolvers")]
	pub system_resolvers: bool,

	/// Also query AAAA in addition to A
	#[arg(long = "aaaa")]
	pub aaaa: bool,

	/// Disable ICMP echo probing
	#[arg(long = "no-icmp")]
	pub no_icmp: bool,

	/// Disable TCP connect probing
	#[arg(long = "no-tcp")]
	pub no_tcp: bool,

	/// Destination port used by TCP connect probes
	#[arg(long = "tcp-port", default_value = "80")]
	pub tcp_port: u16,

	/// Approximate byte budget for the reachability cache
	#[arg(long = "cache-size-bytes", default_value = "1048576")]
	pub cache_size_bytes: u32,

	/// Time-to-live for cache entries, in seconds
	#[arg(long = "ttl-seconds", default_value = "600")]
	pub ttl_seconds: u32,

	/// Per-upstream exchange timeout in milliseconds
	#[arg(short = 't', long = "timeout", default_value = "2000")]
	pub timeout: u64,
}

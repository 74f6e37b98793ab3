//! CLI surface and logging init, shared by the one `flowgate` binary.

use anyhow::{Context, Result};
use clap::Parser;
use flowgate_core::config::{Config, HttpTimeouts, SignerPaths, VenueConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Venue-agnostic order-routing and execution gateway")]
pub struct Args {
    /// Venue to bridge. Repeatable: the process may bridge several
    /// venues in one run, each adapter initialized independently.
    #[arg(long = "exchange", required = true)]
    pub exchanges: Vec<String>,

    /// API key, paired positionally with `--exchange` by repetition order.
    #[arg(long = "api-key", required = true)]
    pub api_keys: Vec<String>,

    /// API secret, paired positionally with `--exchange` by repetition order.
    #[arg(long = "api-secret", required = true)]
    pub api_secrets: Vec<String>,

    /// Trade against the venue's mainnet. Absent means testnet.
    #[arg(long)]
    pub live_trade: bool,

    #[arg(long, default_value = "tcp://127.0.0.1:5601")]
    pub ingress_endpoint: String,

    #[arg(long, default_value = "tcp://127.0.0.1:5602")]
    pub egress_endpoint: String,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit structured JSON log lines instead of the default text format.
    #[arg(long)]
    pub log_json: bool,

    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// CPU core to pin T_ingress/T_publish to.
    #[arg(long)]
    pub cpu_pin: Option<usize>,

    /// Request SCHED_FIFO real-time priority for T_ingress/T_publish.
    #[arg(long)]
    pub realtime: bool,

    #[arg(long, default_value_t = 10)]
    pub stats_interval_secs: u64,

    /// Append-only JSONL crash-aid journal path. Omit to disable journaling.
    #[arg(long)]
    pub journal_path: Option<String>,
}

impl Args {
    /// Pair `--exchange`/`--api-key`/`--api-secret` by repetition order
    /// into one [`VenueConfig`] per venue, and assemble the rest of
    /// [`Config`] from flags plus the environment tier.
    pub fn into_config(self) -> Result<Config> {
        if self.exchanges.len() != self.api_keys.len() || self.exchanges.len() != self.api_secrets.len() {
            anyhow::bail!(
                "--exchange ({}), --api-key ({}), and --api-secret ({}) must be repeated the same number of times",
                self.exchanges.len(),
                self.api_keys.len(),
                self.api_secrets.len(),
            );
        }

        let venues = self
            .exchanges
            .into_iter()
            .zip(self.api_keys)
            .zip(self.api_secrets)
            .map(|((name, api_key), api_secret)| VenueConfig { name, api_key, api_secret, live_trade: self.live_trade })
            .collect();

        Ok(Config {
            venues,
            ingress_endpoint: strip_scheme(&self.ingress_endpoint),
            egress_endpoint: strip_scheme(&self.egress_endpoint),
            log_level: self.log_level,
            log_json: self.log_json,
            metrics_port: self.metrics_port,
            cpu_pin: self.cpu_pin,
            realtime: self.realtime,
            stats_interval_secs: self.stats_interval_secs,
            http_timeouts: HttpTimeouts::from_env(),
            signer_paths: SignerPaths::from_env(),
            journal_path: self.journal_path,
        })
    }
}

/// `Publisher`/the ingress listener bind via `std::net::TcpListener`, which
/// takes a bare `host:port`, not a URL — strip an optional `tcp://` prefix
/// operators naturally reach for on the CLI.
fn strip_scheme(endpoint: &str) -> String {
    endpoint.strip_prefix("tcp://").unwrap_or(endpoint).to_string()
}

/// Initialize `tracing`, honoring `RUST_LOG` over `--log-level` and
/// switching to JSON output when `--log-json` is set.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level)).context("invalid log level")?;

    if json {
        tracing_subscriber::registry().with(fmt::layer().json().with_target(false)).with(filter).init();
    } else {
        tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tcp_scheme_but_leaves_bare_addr_alone() {
        assert_eq!(strip_scheme("tcp://127.0.0.1:5601"), "127.0.0.1:5601");
        assert_eq!(strip_scheme("127.0.0.1:5601"), "127.0.0.1:5601");
    }
}

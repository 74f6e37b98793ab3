//! Configuration: CLI flags are the primary, operator-facing tier; a
//! handful of values are read from environment variables instead. No
//! file-based configuration is implemented, so this module's job is
//! purely clamping and typing what `flowgate-bin`'s `clap` parser and
//! `std::env` hand it into one typed [`Config`].

use std::time::Duration;

/// A connect timeout below this is almost certainly a misconfiguration,
/// not an intentional low value.
pub const MIN_HTTP_CONNECT_TIMEOUT_MS: u64 = 100;
/// Lower bound for the overall per-request timeout.
pub const MIN_HTTP_TIMEOUT_MS: u64 = 200;

pub const DEFAULT_HTTP_CONNECT_TIMEOUT_MS: u64 = 2_500;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 2_500;

#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl HttpTimeouts {
    /// Read `LATENTSPEED_HTTP_CONNECT_TIMEOUT_MS` / `LATENTSPEED_HTTP_TIMEOUT_MS`
    /// from the environment, clamping to the lower bounds above. An unset
    /// or unparsable variable falls back to the default rather than
    /// failing startup.
    pub fn from_env() -> Self {
        let connect_ms = env_u64("LATENTSPEED_HTTP_CONNECT_TIMEOUT_MS", DEFAULT_HTTP_CONNECT_TIMEOUT_MS)
            .max(MIN_HTTP_CONNECT_TIMEOUT_MS);
        let request_ms = env_u64("LATENTSPEED_HTTP_TIMEOUT_MS", DEFAULT_HTTP_TIMEOUT_MS).max(MIN_HTTP_TIMEOUT_MS);
        Self { connect: Duration::from_millis(connect_ms), request: Duration::from_millis(request_ms) }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Paths to the external signer process, read from
/// `LATENTSPEED_HL_SIGNER_PYTHON` / `LATENTSPEED_HL_SIGNER_SCRIPT`.
/// `None` when an adapter that needs signing is configured without
/// them; `flowgate-bin` turns that into an initialization-failure exit.
#[derive(Debug, Clone, Default)]
pub struct SignerPaths {
    pub python: Option<String>,
    pub script: Option<String>,
}

impl SignerPaths {
    pub fn from_env() -> Self {
        Self {
            python: std::env::var("LATENTSPEED_HL_SIGNER_PYTHON").ok(),
            script: std::env::var("LATENTSPEED_HL_SIGNER_SCRIPT").ok(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.python.is_some() && self.script.is_some()
    }
}

/// One configured venue, mirroring the repeatable `--exchange` flag:
/// the process may bridge several venues in a single run.
#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub name: String,
    pub api_key: String,
    pub api_secret: String,
    pub live_trade: bool,
}

/// Full process configuration, assembled by `flowgate-bin`'s `clap`
/// parser plus the environment tier above.
#[derive(Debug, Clone)]
pub struct Config {
    pub venues: Vec<VenueConfig>,
    pub ingress_endpoint: String,
    pub egress_endpoint: String,
    pub log_level: String,
    pub log_json: bool,
    pub metrics_port: u16,
    pub cpu_pin: Option<usize>,
    pub realtime: bool,
    pub stats_interval_secs: u64,
    pub http_timeouts: HttpTimeouts,
    pub signer_paths: SignerPaths,
    /// Path to the crash-aid journal file, from `--journal-path`.
    /// `None` disables journaling entirely.
    pub journal_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            venues: Vec::new(),
            ingress_endpoint: "127.0.0.1:5601".to_string(),
            egress_endpoint: "127.0.0.1:5602".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            metrics_port: 9090,
            cpu_pin: None,
            realtime: false,
            stats_interval_secs: 10,
            http_timeouts: HttpTimeouts { connect: Duration::from_millis(DEFAULT_HTTP_CONNECT_TIMEOUT_MS), request: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS) },
            signer_paths: SignerPaths::default(),
            journal_path: None,
        }
    }
}

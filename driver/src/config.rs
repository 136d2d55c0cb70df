use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub dnsperf: DnsperfConfig,
    #[serde(default)]
    pub resperf: ResperfConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for carving a ranking CSV into benchmark input shards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_ranking_file")]
    pub input: String,
    #[serde(default = "default_shard_dir")]
    pub output_dir: String,
    #[serde(default = "default_shard_size")]
    pub shard_size: usize,
    #[serde(default = "default_max_domains")]
    pub max_domains: usize,
}

fn default_ranking_file() -> String {
    "tranco_4N6VX.csv".to_string()
}

fn default_shard_dir() -> String {
    "dnsperf_files".to_string()
}

fn default_shard_size() -> usize {
    100_000
}

fn default_max_domains() -> usize {
    1_000_000
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            input: default_ranking_file(),
            output_dir: default_shard_dir(),
            shard_size: default_shard_size(),
            max_domains: default_max_domains(),
        }
    }
}

/// Fixed-rate run settings, passed straight through to the dnsperf
/// command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsperfConfig {
    #[serde(default = "default_dnsperf_binary")]
    pub binary: String,
    #[serde(default = "default_dns_server")]
    pub server: String,
    #[serde(default = "default_shard_dir")]
    pub shard_dir: String,
    #[serde(default = "default_clients")]
    pub clients: u32,
    #[serde(default = "default_max_queries")]
    pub max_queries: u64,
    #[serde(default = "default_max_outstanding")]
    pub max_outstanding: u64,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default = "default_run_length")]
    pub run_length_secs: u64,
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
    #[serde(default = "default_query_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_restart_interval")]
    pub restart_interval_secs: u64,
    /// Stop the restart loop after this many seconds; run until
    /// interrupted when unset.
    #[serde(default)]
    pub total_runtime_secs: Option<u64>,
}

fn default_dnsperf_binary() -> String {
    "dnsperf".to_string()
}

fn default_dns_server() -> String {
    "8.8.8.8".to_string()
}

fn default_clients() -> u32 {
    10
}

fn default_max_queries() -> u64 {
    1_000_000
}

fn default_max_outstanding() -> u64 {
    1_000_000
}

fn default_threads() -> u32 {
    6
}

fn default_run_length() -> u64 {
    20
}

fn default_stats_interval() -> u64 {
    1
}

fn default_query_timeout() -> u64 {
    30
}

fn default_workers() -> usize {
    3
}

fn default_restart_interval() -> u64 {
    2
}

impl Default for DnsperfConfig {
    fn default() -> Self {
        Self {
            binary: default_dnsperf_binary(),
            server: default_dns_server(),
            shard_dir: default_shard_dir(),
            clients: default_clients(),
            max_queries: default_max_queries(),
            max_outstanding: default_max_outstanding(),
            threads: default_threads(),
            run_length_secs: default_run_length(),
            stats_interval_secs: default_stats_interval(),
            timeout_secs: default_query_timeout(),
            workers: default_workers(),
            restart_interval_secs: default_restart_interval(),
            total_runtime_secs: None,
        }
    }
}

/// Ramp-to-failure settings, passed through to the resperf command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResperfConfig {
    #[serde(default = "default_resperf_binary")]
    pub binary: String,
    #[serde(default = "default_dns_server")]
    pub server: String,
    #[serde(default = "default_max_qps")]
    pub max_qps: u64,
    #[serde(default = "default_ramp_rate")]
    pub ramp_rate: u64,
    #[serde(default = "default_hold_secs")]
    pub hold_secs: u64,
    #[serde(default = "default_ramp_clients")]
    pub clients: u32,
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_ramp_log")]
    pub log_file: String,
}

fn default_resperf_binary() -> String {
    "resperf".to_string()
}

fn default_max_qps() -> u64 {
    500_000
}

fn default_ramp_rate() -> u64 {
    10_000
}

fn default_hold_secs() -> u64 {
    60
}

fn default_ramp_clients() -> u32 {
    100
}

fn default_data_file() -> String {
    "resperf_domains.txt".to_string()
}

fn default_ramp_log() -> String {
    "resperf_log.txt".to_string()
}

impl Default for ResperfConfig {
    fn default() -> Self {
        Self {
            binary: default_resperf_binary(),
            server: default_dns_server(),
            max_qps: default_max_qps(),
            ramp_rate: default_ramp_rate(),
            hold_secs: default_hold_secs(),
            clients: default_ramp_clients(),
            data_file: default_data_file(),
            log_file: default_ramp_log(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DriverConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DriverConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file when present, fall back to defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

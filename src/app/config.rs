use crate::core::demand::DemandClientConfig;
use crate::core::models::agreement::AgreementRecord;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Actix worker count, defaults to the number of physical cores
    #[serde(default)]
    pub workers: Option<usize>,
    /// Inbound requests per second, unlimited when absent
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            rate_limit_rps: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Hard cutoff for partner responses, measured from auction start
    #[serde(default = "default_bidding_window", with = "humantime_serde")]
    pub bidding_window: Duration,
    /// Network timeout of a single partner call
    #[serde(default = "default_partner_timeout", with = "humantime_serde")]
    pub partner_timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

fn default_bidding_window() -> Duration {
    Duration::from_millis(120)
}

fn default_partner_timeout() -> Duration {
    Duration::from_millis(100)
}

fn default_connect_timeout() -> Duration {
    Duration::from_millis(50)
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            bidding_window: default_bidding_window(),
            partner_timeout: default_partner_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl AuctionConfig {
    pub fn demand_client(&self) -> DemandClientConfig {
        DemandClientConfig {
            timeout: self.partner_timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Firestore collection holding agreement documents
    #[serde(default = "default_directory_collection")]
    pub collection: String,
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_directory_collection() -> String {
    "exchange".to_string()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            collection: default_directory_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    #[serde(default = "default_settlement_collection")]
    pub collection: String,
}

fn default_settlement_collection() -> String {
    "auction_stats".to_string()
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            collection: default_settlement_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirestoreConfig {
    pub project_id: String,
    #[serde(default)]
    pub database_id: Option<String>,
    /// Service account json, application default credentials otherwise
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// host:port of a local emulator
    #[serde(default)]
    pub emulator_host: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdxConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auction: AuctionConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    /// Absent means agreements come from config and
    /// settlements go to the log
    #[serde(default)]
    pub firestore: Option<FirestoreConfig>,
    #[serde(default)]
    pub agreements: Vec<AgreementRecord>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OtelProto {
    Http,
    #[default]
    Grpc,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSink {
    #[serde(flatten)]
    pub dest: LogType,
    /// Emit span open and close events on this sink
    #[serde(default = "default_true")]
    pub spans: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogType {
    Stdout {
        #[serde(default = "default_true")]
        color: bool,
        #[serde(default)]
        json: bool,
    },
    File {
        path: PathBuf,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        rotation: FileRotation,
        #[serde(default)]
        max_files: usize,
    },
    Otel {
        #[serde(default)]
        endpoint: String,
        #[serde(default)]
        proto: OtelProto,
        #[serde(default = "default_true")]
        metrics: bool,
        #[serde(default = "default_metrics_interval", with = "humantime_serde")]
        metrics_interval: Duration,
    },
}

fn default_true() -> bool {
    true
}

fn default_metrics_interval() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_span_sample_rate")]
    pub span_sample_rate: f32,
    #[serde(default = "default_sinks")]
    pub sinks: Vec<LogSink>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_span_sample_rate() -> f32 {
    0.01
}

fn default_sinks() -> Vec<LogSink> {
    vec![LogSink {
        dest: LogType::Stdout {
            color: true,
            json: false,
        },
        spans: false,
    }]
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            span_sample_rate: default_span_sample_rate(),
            sinks: default_sinks(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.sinks.is_empty() {
            anyhow::bail!("At least one logging sink must be configured");
        }

        self.level.parse::<tracing::Level>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                self.level
            )
        })?;

        if !(0.0..=1.0).contains(&self.span_sample_rate) {
            anyhow::bail!(
                "span_sample_rate must be between 0.0 and 1.0, got {}",
                self.span_sample_rate
            );
        }

        let otel_sinks = self
            .sinks
            .iter()
            .filter(|sink| matches!(sink.dest, LogType::Otel { .. }))
            .count();

        if otel_sinks > 1 {
            anyhow::bail!("Only one otel sink may be configured, got {}", otel_sinks);
        }

        Ok(())
    }
}

impl AdxConfig {
    /// Load from a yaml file, with `ADX__SECTION__KEY` environment
    /// variables taking precedence over file values
    pub fn load(path: &Path) -> Result<AdxConfig, anyhow::Error> {
        let cfg = Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .add_source(
                Environment::with_prefix("ADX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: AdxConfig = cfg.try_deserialize()?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.logging.validate()?;

        if self.auction.bidding_window.is_zero() {
            anyhow::bail!("auction.bidding_window must be greater than zero");
        }

        if self.directory.cache_capacity == 0 {
            anyhow::bail!("directory.cache_capacity must be greater than zero");
        }

        if self.server.rate_limit_rps == Some(0) {
            anyhow::bail!("server.rate_limit_rps must be greater than zero when set");
        }

        if let Some(firestore) = &self.firestore {
            if firestore.project_id.is_empty() {
                anyhow::bail!("firestore.project_id is required when firestore is configured");
            }
        }

        Ok(())
    }
}

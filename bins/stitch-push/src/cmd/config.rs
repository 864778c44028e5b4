use std::time::Duration;

use clap::Args;
use serde::Deserialize;

use stitch_api::{BatchLimits, FieldTrait};
use stitch_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use super::error::PushError;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub base_url: Option<String>,
    pub table_name: Option<String>,
    #[serde(default)]
    pub key_names: Vec<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub batch: Option<BatchLimits>,
    /// Описание полей `data` для schema целевой таблицы.
    #[serde(default)]
    pub schema: Vec<FieldTrait>,
}

pub fn load_config(path: &str) -> Result<Config, PushError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PushError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| PushError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug, Default)]
pub struct PushArgs {
    /// Path to the TOML config
    #[arg(long, default_value = "stitch.toml", env = "STITCH_PUSH_CONFIG")]
    pub config: String,

    /// JSON file with an array of records ("-" for stdin)
    #[arg(long)]
    pub input: String,

    /// Import API token
    #[arg(long, env = "STITCH_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Target table (overrides table_name from config)
    #[arg(long)]
    pub table: Option<String>,

    /// Sequence stamped on every record (default: current Unix time, seconds)
    #[arg(long)]
    pub sequence: Option<i64>,

    /// Byte ceiling per batch
    #[arg(long)]
    pub max_bytes: Option<usize>,

    /// Record ceiling per batch
    #[arg(long)]
    pub max_count: Option<usize>,

    /// API base URL, without trailing slash
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print payloads to stdout instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация после мержа: config.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub input: String,
    pub token: Option<String>,
    pub base_url: String,
    pub table_name: String,
    pub key_names: Vec<String>,
    pub timeout: Duration,
    pub limits: BatchLimits,
    pub schema: Vec<FieldTrait>,
    pub sequence: i64,
    pub dry_run: bool,
}

impl Effective {
    pub fn new(args: &PushArgs) -> Result<Self, PushError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };

        let table_name = args
            .table
            .clone()
            .or(cfg.table_name)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PushError::Config("table name is required (--table or table_name)".into()))?;

        let token = args.token.clone().filter(|t| !t.is_empty());
        if token.is_none() && !args.dry_run {
            return Err(PushError::Config(
                "API token is required (--token or STITCH_API_TOKEN)".into(),
            ));
        }

        let file_limits = cfg.batch.unwrap_or_default();
        let limits = BatchLimits::new(
            args.max_bytes.unwrap_or(file_limits.max_bytes),
            args.max_count.unwrap_or(file_limits.max_count),
        );
        limits.validate()?;

        let timeout = match cfg.timeout_secs {
            Some(0) => return Err(PushError::Config("timeout_secs must be greater than 0".into())),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            input: args.input.clone(),
            token,
            base_url: args
                .base_url
                .clone()
                .or(cfg.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            table_name,
            key_names: cfg.key_names,
            timeout,
            limits,
            schema: cfg.schema,
            sequence: args.sequence.unwrap_or_else(stitch_api::now_secs),
            dry_run: args.dry_run,
        })
    }
}

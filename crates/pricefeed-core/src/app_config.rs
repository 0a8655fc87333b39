use std::path::PathBuf;

use chrono::NaiveTime;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Endpoint that receives one `POST` per accepted product record.
    pub backend_url: String,
    /// JSON document mapping run identity to last-run timestamp.
    pub state_path: PathBuf,
    /// Optional YAML file replacing the built-in site profiles.
    pub sites_path: Option<PathBuf>,
    pub log_level: String,
    pub page_load_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    /// Pause after each submission attempt.
    pub submit_delay_ms: u64,
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_secs: u64,
    /// Minimum whole days between two scheduled runs of the same source.
    pub run_interval_days: u32,
    /// Time of day (UTC) at which the recurring schedule fires.
    pub schedule_time: NaiveTime,
}

mod app_config;
mod config;
mod products;
mod sites;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{Category, ProductRecord, UnknownCategory};
pub use sites::{
    builtin_profiles, load_site_profiles, resolve_site_profiles, BlockMarkers, ImageStrategy,
    ScrollMode, ScrollPhase, ScrollPlan, SearchFallback, SiteProfile, SitesFile,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sites file {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sites file: {0}")]
    SitesFileParse(#[from] serde_yaml::Error),

    #[error("site configuration invalid: {0}")]
    Validation(String),
}

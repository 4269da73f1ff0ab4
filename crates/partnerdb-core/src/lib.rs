pub mod app_config;
pub mod config;
pub mod distance;
pub mod geometry;
pub mod locator;
pub mod partner;
pub mod partners_file;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use distance::{haversine_km, EARTH_RADIUS_KM};
pub use geometry::{
    decode_address, decode_coverage_area, Coordinate, CoordinateError, CoverageArea,
    GeometryError,
};
pub use locator::{locate, parse_query, LocateError, LocateMode, MatchResult, PartnerMatch};
pub use partner::{GeometryField, Partner, PartnerRecord, ValidationError};
pub use partners_file::{load_partners_file, PartnersFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read partners file {path}: {source}")]
    PartnersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse partners file: {0}")]
    PartnersFileParse(#[from] serde_yaml::Error),

    #[error("partners file validation failed: {0}")]
    Validation(String),
}

pub mod app_config;
pub mod config;
pub mod hotel;
pub mod numeric;
pub mod search;
pub mod table;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use hotel::{
    CrawlResult, EmptyReason, Facilities, FacilityList, HotelRecord, ListingCardSummary,
    FACILITIES_NOT_FOUND, FACILITY_SEPARATOR, NOT_AVAILABLE, NO_FACILITIES_LISTED,
};
pub use numeric::{parse_price_numeric, parse_score_clean};
pub use search::{parse_date, Occupancy, SearchRequest, ValidationError, DEFAULT_RESULT_CAP};
pub use table::{
    latest_table, read_table, table_file_name, write_table, TableError, TableRow,
    MISSING_FACILITIES_PLACEHOLDER,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod ipify;
pub mod logging;
pub mod lookup;
pub mod tracker;

pub use config::Settings;
pub use data::LookupResult;
pub use error::{ConfigError, LookupError};
pub use ipify::{GeoLookup, IpifyClient};
pub use lookup::{LookupController, Transition};

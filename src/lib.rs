pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{Cli, Command};
pub use core::query::{QueryConnection, QueryParams};
pub use core::results::{filter_events, parse_and_filter_events, parse_events, NOT_FOUND};
pub use domain::model::{FieldValue, FlatRecord};
pub use utils::error::{DwvError, Result};

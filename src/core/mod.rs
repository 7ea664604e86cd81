pub mod accumulo;
pub mod authorization;
pub mod dictionary;
pub mod ingest;
pub mod query;
pub mod results;

pub use crate::domain::model::{FieldValue, FlatRecord};
pub use crate::domain::ports::ClusterPods;
pub use crate::utils::error::Result;

pub mod config;
pub mod storage;

pub use config::{LocalStorageConfig, ObjectStorageConfig};

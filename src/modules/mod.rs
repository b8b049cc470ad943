pub mod anime;
pub mod dataset;
pub mod download_control;
pub mod merge_lock;
pub mod provider;
pub mod validation;

pub mod config;

pub use config::{
    Config, MetaDataProviderConfig, CONVERTED_FILE_SUFFIX, DOWNLOAD_CONTROL_STATE_FILE_SUFFIX,
    LOCK_FILE_SUFFIX,
};

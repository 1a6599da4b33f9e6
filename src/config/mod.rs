/// Database configuration and connection management
pub mod database;

/// Store settings and category seeds from config.toml
pub mod catalog;

/// Current administrator identity from environment variables
pub mod session;

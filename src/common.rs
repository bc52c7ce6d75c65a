pub mod config;
pub mod endpoint;
pub mod format;
pub mod outcome;
pub mod prefix_map;
pub mod query_source;
pub mod verbosity;

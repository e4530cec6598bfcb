// Library root — exposes the resolver for integration tests and for wrappers
// that embed it. The binary entry point is src/main.rs.

pub mod address;
pub mod cluster_id;
pub mod config;
pub mod error;
pub mod identity;
pub mod launch;
pub mod logger;
pub mod ordinal;
pub mod quorum;
pub mod resolver;

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the FleetRepository port (local cache)
//! - In-memory vectors for the FleetRepository port (tests, embedding)
//! - Session settings for the AuthProvider port

pub mod duckdb;
pub mod feeds;
pub mod memory;
pub mod session;

pub use self::duckdb::DuckDbRepository;
pub use feeds::Feeds;
pub use memory::InMemoryRepository;
pub use session::SessionAuth;

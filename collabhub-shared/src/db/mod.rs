//! Database access for CollabHub
//!
//! - `pool`: PostgreSQL connection pool construction and health checks
//!
//! Queries live in [`crate::store::postgres`]; this module only owns the
//! connection lifecycle.

pub mod pool;

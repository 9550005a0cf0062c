//! Request middleware
//!
//! - `identity`: Caller identity from the bearer token

pub mod identity;

//! # CollabHub API Server Library
//!
//! HTTP surface of CollabHub: the identity-provider webhook receiver and the
//! JSON API over the resource lifecycle operations.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Caller identity extraction
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

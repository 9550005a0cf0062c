//! API route handlers
//!
//! This module contains all route handlers organized by resource:
//!
//! - `health`: Health check endpoint
//! - `webhooks`: Identity-provider webhook receiver
//! - `projects`: Project CRUD
//! - `members`: Project and organization membership
//! - `documents`: Document upload, status and download
//! - `notes`: Project notes
//! - `invalidations`: Stale-view event stream

pub mod documents;
pub mod health;
pub mod invalidations;
pub mod members;
pub mod notes;
pub mod projects;
pub mod webhooks;

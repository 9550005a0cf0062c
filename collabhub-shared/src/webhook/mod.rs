//! Identity-provider webhook handling
//!
//! # Modules
//!
//! - [`signature`]: Svix-style HMAC verification of the envelope
//! - [`event`]: typed event payloads
//! - [`processor`]: idempotent application of events to the store
//!
//! # Example
//!
//! ```no_run
//! use collabhub_shared::store::memory::MemoryStore;
//! use collabhub_shared::webhook::{WebhookEventProcessor, WebhookHeaders, WebhookVerifier};
//! use std::sync::Arc;
//!
//! # async fn example(body: &[u8], headers: WebhookHeaders) -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = WebhookVerifier::new(&std::env::var("WEBHOOK_SECRET")?)?;
//! let processor = WebhookEventProcessor::new(Arc::new(MemoryStore::new()), Some(verifier));
//!
//! match processor.process(&headers, body).await {
//!     Ok(outcome) => println!("{:?}", outcome),
//!     Err(err) => println!("{} {}", err.status_code(), err.response_text()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod event;
pub mod processor;
pub mod signature;

pub use event::{EventError, WebhookEvent};
pub use processor::{WebhookError, WebhookEventProcessor, WebhookOutcome, PROCESSED_MESSAGE};
pub use signature::{SignatureError, WebhookHeaders, WebhookVerifier, DEFAULT_TOLERANCE_SECS};

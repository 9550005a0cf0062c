//! Application state and router builder
//!
//! This module defines the shared application state and provides
//! a function to build the Axum router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use collabhub_api::{app::{build_router, AppState}, config::Config};
//! use collabhub_shared::storage::memory::MemoryBlobStorage;
//! use collabhub_shared::store::memory::MemoryStore;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let state = AppState::new(
//!     config,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryBlobStorage::new()),
//! )?;
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, middleware::identity::identity_layer};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use collabhub_shared::{
    auth::IdentityVerifier,
    invalidation::BroadcastInvalidator,
    lifecycle::ResourceLifecycleManager,
    storage::BlobStorage,
    store::Store,
    webhook::WebhookEventProcessor,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Multipart framing allowance on top of the largest accepted file
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Store used for health checks
    pub store: Arc<dyn Store>,

    /// Project, membership, document and note operations
    pub lifecycle: ResourceLifecycleManager,

    /// Identity-provider webhook processing
    pub webhooks: WebhookEventProcessor,

    /// Caller token verification
    pub identity: IdentityVerifier,

    /// Stale-view announcements streamed to clients
    pub invalidations: BroadcastInvalidator,
}

impl AppState {
    /// Wires the lifecycle manager and webhook processor over the given
    /// store and blob storage
    ///
    /// # Errors
    ///
    /// Fails when the identity key or webhook secret cannot be decoded.
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStorage>,
    ) -> anyhow::Result<Self> {
        let identity = config.identity.verifier()?;
        let webhook_verifier = config.webhook.verifier()?;
        if webhook_verifier.is_none() {
            tracing::warn!("WEBHOOK_SECRET is not set; identity webhooks will be rejected");
        }

        let invalidations = BroadcastInvalidator::default();
        let lifecycle = ResourceLifecycleManager::new(
            store.clone(),
            blobs,
            Arc::new(invalidations.clone()),
            config.lifecycle.clone(),
        );

        Ok(Self {
            webhooks: WebhookEventProcessor::new(store.clone(), webhook_verifier),
            config: Arc::new(config),
            store,
            lifecycle,
            identity,
            invalidations,
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                          # Health check (public)
/// ├── POST /webhooks/identity               # Signed provider events (public)
/// └── /v1/                                  # Caller identity required
///     ├── /projects                         # list, create
///     │   └── /:id                          # get, update, delete
///     │       ├── /members[/:user_id]       # list, add, remove
///     │       ├── /documents                # list, upload (multipart)
///     │       └── /notes[/:note_id]         # list, create, delete
///     ├── /documents/:id                    # delete
///     │   ├── /status                       # set status (owner)
///     │   └── /download                     # signed URL
///     ├── /org/members                      # organization roster
///     └── /invalidations                    # stale-view stream (SSE)
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Caller identity (`/v1` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let upload_limit = (state.config.lifecycle.max_upload_bytes + MULTIPART_OVERHEAD_BYTES) as usize;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/webhooks/identity", post(routes::webhooks::receive));

    let v1_routes = Router::new()
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/members",
            get(routes::members::list_project_members).post(routes::members::add_project_member),
        )
        .route(
            "/projects/:id/members/:user_id",
            delete(routes::members::remove_project_member),
        )
        .route(
            "/projects/:id/documents",
            get(routes::documents::list_documents)
                .post(routes::documents::upload_document)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/projects/:id/notes",
            get(routes::notes::list_notes).post(routes::notes::create_note),
        )
        .route(
            "/projects/:id/notes/:note_id",
            delete(routes::notes::delete_note),
        )
        .route(
            "/documents/:id",
            delete(routes::documents::delete_document),
        )
        .route(
            "/documents/:id/status",
            put(routes::documents::update_document_status),
        )
        .route(
            "/documents/:id/download",
            get(routes::documents::download_document),
        )
        .route("/org/members", get(routes::members::list_org_members))
        .route("/invalidations", get(routes::invalidations::stream))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

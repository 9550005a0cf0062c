//! Caller identity middleware
//!
//! Verifies the `Authorization: Bearer <token>` header and inserts the
//! resulting [`CallerIdentity`] into the request extensions. Handlers read it
//! with `Extension<CallerIdentity>`; a request without a valid token never
//! reaches them.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use collabhub_shared::auth::CallerIdentity;

use crate::{app::AppState, error::ApiError};

pub async fn identity_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let caller: CallerIdentity = state.identity.verify_bearer(authorization).map_err(|err| {
        tracing::debug!(error = %err, path = %req.uri().path(), "Rejected caller token");
        ApiError::from(err)
    })?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

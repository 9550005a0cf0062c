//! Stale-view event stream
//!
//! # Endpoint
//!
//! ```text
//! GET /v1/invalidations
//! Accept: text/event-stream
//! ```
//!
//! Each committed write emits one `invalidate` event per stale view:
//!
//! ```text
//! event: invalidate
//! data: {"scope":"project","project_id":"6f1c..."}
//! ```
//!
//! Slow clients that fall behind the channel skip the missed events; a
//! client should refetch whatever it shows when it reconnects.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use collabhub_shared::auth::CallerIdentity;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::app::AppState;

pub async fn stream(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(caller = %caller.user_id, "Invalidation stream opened");

    let events = BroadcastStream::new(state.invalidations.subscribe()).filter_map(|scope| {
        let scope = scope.ok()?;
        Event::default()
            .event("invalidate")
            .json_data(scope)
            .ok()
            .map(Ok)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

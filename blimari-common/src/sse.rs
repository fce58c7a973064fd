//! Server-Sent Events (SSE) utilities
//!
//! Adapts an `EventBus` subscription into an axum SSE response with a
//! keep-alive heartbeat.

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};

/// Create an SSE stream relaying trail events to one client
///
/// Lagged receivers (slow clients that missed buffered events) are resumed
/// rather than disconnected; missed progress events are not replayed.
pub fn trail_event_stream(
    bus: &EventBus,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    info!("New SSE client connected to trail events");

    let mut rx = bus.subscribe();
    let stream = async_stream::stream! {
        // Initial connection marker so clients can show status immediately
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => yield Ok(Event::default().event("TrailEvent").data(json)),
                    Err(e) => debug!(error = %e, "Failed to serialize trail event"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "SSE client lagged, resuming");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

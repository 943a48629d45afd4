//! Server-Sent Events stream of folder lifecycle events

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

/// GET /api/events - SSE stream of FolderEvents
///
/// Every lifecycle, autosave, and feedback event on the bus is forwarded to
/// connected clients; reviewer dashboards and open editors refresh from
/// these rather than polling.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "New SSE client connected, total subscribers: {}",
        state.events.subscriber_count() + 1
    );

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(folder_event) => {
                let event = Event::default()
                    .event(folder_event.event_type())
                    .json_data(&folder_event)
                    .ok();
                event.map(Ok)
            }
            Err(e) => {
                // Lagged subscriber; skip and continue
                warn!("SSE client lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}

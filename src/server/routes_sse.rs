use crate::server::AppContext;
use crate::state::{SearchEvent, SearchState, StateView};
use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt;

pub fn sse_routes() -> Router<AppContext> {
    Router::new().route("/events", get(events_handler))
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_else(|e| {
        format!(r#"{{"error": "serialization failed: {}"}}"#, e)
    });
    Event::default().event(name).data(data)
}

/// Stream of state snapshots (`state` events) and diagnostics
/// (`diagnostic` events).
///
/// The first `state` event carries the current snapshot so a freshly
/// connected client can render immediately.
pub async fn events_handler(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let store = ctx.orchestrator.store();

    let states = WatchStream::new(store.watch())
        .map(|state: SearchState| Ok(json_event("state", &StateView::from(state))));

    let diagnostics = BroadcastStream::new(store.subscribe())
        .filter_map(|result| result.ok())
        .map(|event: SearchEvent| Ok(json_event("diagnostic", &event)));

    // Heartbeat every 30 seconds
    let heartbeat =
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
            .map(|_| Ok(Event::default().event("heartbeat").data("{}")));

    let combined = states.merge(diagnostics).merge(heartbeat);

    Sse::new(combined).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

//! SSE routes

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{Stream, StreamExt};

use super::state::ServerState;
use crate::streaming::{StreamKind, StreamSession};

fn sse(
    session: StreamSession,
    keep_alive: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = session
        .into_stream()
        .map(|frame| Ok(Event::default().data(frame)));
    Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive))
}

async fn stream_health(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse(state.publisher.open(StreamKind::Health), state.config.keep_alive())
}

async fn stream_index(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse(state.publisher.open(StreamKind::Index), state.config.keep_alive())
}

pub fn make_stream_routes(state: ServerState) -> Router {
    Router::new()
        .route("/stream/health", get(stream_health))
        .route("/stream/index", get(stream_index))
        .with_state(state)
}

//! Router assembly: health, server-sent events, tables and modules

use crate::core::events::EventBus;
use crate::server::host::ServerHost;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete router from a host
///
/// Returns a router with:
/// - `GET /health`, `GET /healthz`
/// - `GET /events` (server-sent events)
/// - every registered table and module route
/// - custom routes
pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Router {
    let mut app = health_routes(host.clone())
        .merge(event_routes(host.event_bus().clone()))
        .merge(host.entity_registry.build_routes());

    for custom_router in custom_routes {
        app = app.merge(custom_router);
    }

    let app = app.layer(TraceLayer::new_for_http());
    if host.config().server.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn health_routes(host: Arc<ServerHost>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .with_state(host)
}

async fn health_check(State(host): State<Arc<ServerHost>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "opsboard",
        "modules": host.modules,
        "entities": host.entity_types(),
    }))
}

fn event_routes(events: EventBus) -> Router {
    Router::new()
        .route("/events", get(event_stream))
        .with_state(events)
}

/// `GET /events`
///
/// One SSE message per published event, named after its kind (`entity` or
/// `notification`). Lagged receivers skip what they missed.
async fn event_stream(
    State(events): State<EventBus>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(events.subscribe()).filter_map(|received| {
        let envelope = match received {
            Ok(envelope) => envelope,
            Err(lagged) => {
                tracing::warn!("event stream subscriber lagged: {}", lagged);
                return None;
            }
        };
        Event::default()
            .id(envelope.id.to_string())
            .event(envelope.event.event_kind())
            .json_data(&envelope)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

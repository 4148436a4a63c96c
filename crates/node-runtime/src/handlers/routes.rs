//! # Peer Protocol Routes
//!
//! | Route | Success | Failure |
//! |-------|---------|---------|
//! | `POST /forward/{route}?addr&redistribute` | 200 (also for dropped duplicates) | 400 invalid, 404 unknown route |
//! | `POST /mutual_add` | 201, body = local signing address | 400 bad signature, 409 self-join, 503 full |
//! | `GET /info/peers` | `{"peers": [...]}` | |
//! | `GET /info/clockchain` | `{"length", "head", "pool_size", "stage"}` | |
//!
//! Accepted gossip is re-forwarded on a background task with the sender's
//! address as origin and the received hop count, so the response does not
//! wait on delivery to other peers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cc_01_peer_discovery::{DiscoveryError, PeerDiscoveryApi, PeerRegistry};
use cc_02_gossip_propagation::GossipApi;
use cc_03_round_production::{RoundApi, RoundError, RoundStatus};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{GossipRoute, HopCount, JoinRequest, Ping, PeersResponse, SigningAddress, Tick};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<dyn PeerDiscoveryApi>,
    pub registry: Arc<PeerRegistry>,
    pub gossip: Arc<dyn GossipApi>,
    pub rounds: Arc<dyn RoundApi>,
}

/// Query string of `/forward/{route}`.
#[derive(Debug, Deserialize)]
pub struct ForwardParams {
    /// Signing address of the sending node.
    pub addr: String,
    /// Hop count the payload arrived with.
    pub redistribute: i64,
}

/// Build the peer protocol router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/forward/:route", post(forward))
        .route("/mutual_add", post(mutual_add))
        .route("/info/peers", get(info_peers))
        .route("/info/clockchain", get(info_clockchain))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn forward(
    State(state): State<AppState>,
    Path(route): Path<String>,
    Query(params): Query<ForwardParams>,
    Json(payload): Json<Value>,
) -> Response {
    let Ok(route) = route.parse::<GossipRoute>() else {
        return (StatusCode::NOT_FOUND, format!("unknown route: {route}")).into_response();
    };

    if state.gossip.is_duplicate(&payload) {
        debug!(route = %route, "Dropped duplicate payload");
        return (StatusCode::OK, "duplicate").into_response();
    }

    if let Err(reason) = accept(&state, route, &payload).await {
        debug!(route = %route, from = %params.addr, "Rejected payload: {reason}");
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }

    let gossip = Arc::clone(&state.gossip);
    let origin = SigningAddress::new(params.addr);
    let hops = HopCount::new(params.redistribute);
    tokio::spawn(async move {
        gossip.forward(&payload, route.as_str(), &origin, hops).await;
    });

    StatusCode::OK.into_response()
}

/// Decode and hand a gossiped artifact to round production.
async fn accept(state: &AppState, route: GossipRoute, payload: &Value) -> Result<(), String> {
    let outcome: Result<(), RoundError> = match route {
        GossipRoute::Ping => {
            let ping: Ping =
                serde_json::from_value(payload.clone()).map_err(|e| format!("malformed ping: {e}"))?;
            state.rounds.receive_ping(ping).await.map(|_| ())
        }
        GossipRoute::Tick => {
            let tick: Tick =
                serde_json::from_value(payload.clone()).map_err(|e| format!("malformed tick: {e}"))?;
            state.rounds.receive_tick(tick).await.map(|_| ())
        }
    };
    outcome.map_err(|e| e.to_string())
}

async fn mutual_add(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Json(request): Json<JoinRequest>,
) -> Response {
    match state.discovery.accept_join(remote.ip(), &request) {
        Ok(address) => (StatusCode::CREATED, address.to_string()).into_response(),
        Err(e @ (DiscoveryError::InvalidSignature | DiscoveryError::InvalidAddress(_))) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e @ DiscoveryError::SelfJoin) => (StatusCode::CONFLICT, e.to_string()).into_response(),
        Err(e @ DiscoveryError::AtCapacity) => {
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

async fn info_peers(State(state): State<AppState>) -> Json<PeersResponse> {
    Json(PeersResponse {
        peers: state
            .registry
            .urls()
            .into_iter()
            .map(|url| url.as_str().to_string())
            .collect(),
    })
}

async fn info_clockchain(State(state): State<AppState>) -> Json<RoundStatus> {
    Json(state.rounds.status())
}

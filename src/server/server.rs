use anyhow::{Context, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::mix::MixError;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::metrics::{metrics_handler, record_error, record_mix_ranking, record_mix_request};
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub status: &'static str,
    pub message: &'static str,
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug, Default)]
struct SearchParams {
    pub search: Option<String>,
}

impl SearchParams {
    /// An empty search is the same as no search.
    fn term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Deserialize, Debug, Default)]
struct MixParams {
    #[serde(rename = "trackId")]
    pub track_id: Option<String>,
    pub limit: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn store_error(endpoint: &str, err: anyhow::Error) -> Response {
    error!("Error serving {}: {:#}", endpoint, err);
    record_error("store", endpoint);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn data_response(result: Result<Vec<Value>>, endpoint: &str) -> Response {
    match result {
        Ok(rows) => Json(json!({ "data": rows })).into_response(),
        Err(err) => store_error(endpoint, err),
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        status: "ok",
        message: "Mashup catalog server is running",
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn list_artists(
    State(catalog): State<GuardedCatalogStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    data_response(catalog.list_artists(params.term()), "/api/artists")
}

async fn get_artist(State(catalog): State<GuardedCatalogStore>, Path(id): Path<String>) -> Response {
    let artist = match catalog.get_artist(&id) {
        Ok(Some(artist)) => artist,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "artist": null, "albums": [], "tracks": [] })),
            )
                .into_response()
        }
        Err(err) => return store_error("/api/artists/{id}", err),
    };

    let albums_and_tracks = catalog
        .get_artist_albums(&id)
        .and_then(|albums| Ok((albums, catalog.get_artist_tracks(&id)?)));
    match albums_and_tracks {
        Ok((albums, tracks)) => Json(json!({
            "artist": artist,
            "albums": albums,
            "tracks": tracks,
        }))
        .into_response(),
        Err(err) => store_error("/api/artists/{id}", err),
    }
}

async fn get_artist_albums(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    data_response(catalog.get_artist_albums(&id), "/api/artists/{id}/albums")
}

async fn get_artist_tracks(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    data_response(catalog.get_artist_tracks(&id), "/api/artists/{id}/tracks")
}

async fn list_albums(
    State(catalog): State<GuardedCatalogStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    data_response(catalog.list_albums(params.term()), "/api/albums")
}

async fn get_album(State(catalog): State<GuardedCatalogStore>, Path(id): Path<String>) -> Response {
    match catalog.get_album(&id) {
        Ok(Some(album)) => Json(json!({ "data": album })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({ "data": null }))).into_response(),
        Err(err) => store_error("/api/albums/{id}", err),
    }
}

async fn get_album_tracks(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    data_response(catalog.get_album_tracks(&id), "/api/albums/{id}/tracks")
}

async fn list_tracks(
    State(catalog): State<GuardedCatalogStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    data_response(catalog.list_tracks(params.term()), "/api/tracks")
}

fn parse_limit(limit: Option<&str>) -> Result<Option<usize>, String> {
    match limit.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| format!("limit must be a non-negative integer, got '{}'", raw)),
    }
}

async fn get_mix(
    State(mix_service): State<GuardedMixService>,
    Query(params): Query<MixParams>,
) -> Response {
    let track_id = match params
        .track_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        Some(id) => id.to_string(),
        None => {
            record_mix_request("bad_request");
            return error_response(StatusCode::BAD_REQUEST, "trackId is required");
        }
    };
    let limit = match parse_limit(params.limit.as_deref()) {
        Ok(limit) => limit,
        Err(message) => {
            record_mix_request("bad_request");
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    let start = Instant::now();
    let service = mix_service.clone();
    let base_id = track_id.clone();
    let result = tokio::task::spawn_blocking(move || service.recommend(&base_id, limit)).await;

    match result {
        Ok(Ok(mix)) => {
            let elapsed = start.elapsed();
            record_mix_request("ok");
            record_mix_ranking(mix.pool_size, elapsed);
            info!(
                "Mix for {}: {} candidates, {} recommendations in {}ms",
                track_id,
                mix.pool_size,
                mix.recommendations.len(),
                elapsed.as_millis()
            );
            Json(mix).into_response()
        }
        Ok(Err(err @ MixError::TrackNotFound(_))) => {
            debug!("{}", err);
            record_mix_request("not_found");
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        Ok(Err(err)) => {
            error!("Mix for {} failed: {:#}", track_id, anyhow::Error::new(err));
            record_mix_request("error");
            record_error("mix", "/api/mix");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(join_err) => {
            error!("Mix task for {} did not complete: {}", track_id, join_err);
            record_mix_request("error");
            record_error("mix", "/api/mix");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        mix_service: GuardedMixService,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            mix_service,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    mix_service: GuardedMixService,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog_store, mix_service);

    let api_routes: Router = Router::new()
        .route("/api", get(home))
        .route("/api/artists", get(list_artists))
        .route("/api/artists/{id}", get(get_artist))
        .route("/api/artists/{id}/albums", get(get_artist_albums))
        .route("/api/artists/{id}/tracks", get(get_artist_tracks))
        .route("/api/albums", get(list_albums))
        .route("/api/albums/{id}", get(get_album))
        .route("/api/albums/{id}/tracks", get(get_album_tracks))
        .route("/api/tracks", get(list_tracks))
        .route("/api/mix", get(get_mix))
        .with_state(state.clone());

    let mut app: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            api_routes.fallback_service(static_files_service)
        }
        None => api_routes,
    };

    app = app
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    mix_service: GuardedMixService,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store, mix_service)?;

    let metrics_listener =
        tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, metrics_port)))
            .await
            .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, app).await?)
}

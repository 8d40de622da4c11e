#![forbid(unsafe_code)]

//! Axum server exposing the video catalog.
//!
//! Routes are thin: they validate input, call into the library and wrap the
//! result in the `{"status": ..}` envelope the frontend expects.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use axum::{
    Json, Router,
    extract::{
        Path as AxumPath, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use newtube_catalog::{
    CatalogStore, CreateVideo, Cursor, ListingParams, StoreError, UpdateVideo, Video, VideoStore,
    config::{RuntimeOverrides, resolve_runtime_settings},
    list_videos as list_catalog_videos,
};
use serde::Serialize;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
struct CatalogArgs {
    database_path: PathBuf,
    port: u16,
    listen_host: IpAddr,
}

impl CatalogArgs {
    fn parse() -> Result<Self> {
        Self::from_iter(std::env::args().skip(1))
    }

    fn from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut database_override: Option<PathBuf> = None;
        let mut port_override: Option<u16> = None;
        let mut host_override: Option<String> = None;
        let mut args = iter.into_iter();
        while let Some(arg) = args.next() {
            if let Some(value) = arg.strip_prefix("--database=") {
                database_override = Some(PathBuf::from(value));
                continue;
            }
            if let Some(value) = arg.strip_prefix("--port=") {
                port_override = Some(parse_port_arg(value)?);
                continue;
            }
            if let Some(value) = arg.strip_prefix("--host=") {
                host_override = Some(parse_host_arg(value)?.to_string());
                continue;
            }

            match arg.as_str() {
                "--database" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--database requires a value"))?;
                    database_override = Some(PathBuf::from(value));
                }
                "--port" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--port requires a value"))?;
                    port_override = Some(parse_port_arg(&value)?);
                }
                "--host" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--host requires a value"))?;
                    host_override = Some(parse_host_arg(&value)?.to_string());
                }
                _ => return Err(anyhow!("unknown argument: {arg}")),
            }
        }

        let settings = resolve_runtime_settings(RuntimeOverrides {
            database_path: database_override,
            port: port_override,
            host: host_override,
            ..RuntimeOverrides::default()
        })?;
        let listen_host = parse_host_arg(&settings.host)?;

        Ok(Self {
            database_path: settings.database_path,
            port: settings.port,
            listen_host,
        })
    }
}

fn parse_port_arg(value: &str) -> Result<u16> {
    value
        .parse::<u16>()
        .context("expected a numeric port between 0 and 65535")
}

fn parse_host_arg(value: &str) -> Result<IpAddr> {
    value
        .parse::<IpAddr>()
        .context("expected a valid IPv4 or IPv6 address for --host/CATALOG_HOST")
}

/// Shared state injected into every handler.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn VideoStore>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    errors: Vec<String>,
}

impl ApiError {
    fn bad_request(errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            errors,
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            errors: vec![message.into()],
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            errors: vec![message.into()],
        }
    }

    /// Maps a store failure, logging anything that is not a missing video.
    fn from_store(err: StoreError, message: &str) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found("Video not found"),
            err => {
                error!(error = %err, "{message}");
                Self::internal(message)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    errors: &'a [String],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            errors: &self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Success envelope. `nextPageToken` only appears on paginated responses
/// that have a following page.
#[derive(Debug, Serialize)]
struct OkBody<T> {
    status: &'static str,
    data: T,
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    next_page_token: Option<Cursor>,
}

impl<T> OkBody<T> {
    fn new(data: T) -> Self {
        Self {
            status: "ok",
            data,
            next_page_token: None,
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let CatalogArgs {
        database_path,
        port,
        listen_host,
    } = CatalogArgs::parse()?;

    let store = CatalogStore::open(&database_path)
        .await
        .context("initializing catalog store")?;
    info!(database = %database_path.display(), "catalog store ready");

    let state = AppState {
        store: Arc::new(store),
    };
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::new(listen_host, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!("catalog API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running catalog API server")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/videos", get(list_videos).post(create_video))
        .route(
            "/videos/{id}",
            get(get_video).put(update_video).delete(delete_video),
        )
        .fallback(fallback)
        .with_state(state)
}

async fn shutdown_signal() {
    // Only graceful shutdown depends on this; Ctrl+C still stops the process.
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl+C handler");
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("endpoint not found")
}

/// Parses the `{id}` path segment. Ids are positive integers.
fn parse_video_id(raw: &str) -> ApiResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::bad_request(vec![
            "id must be a positive integer".to_string(),
        ])),
    }
}

async fn list_videos(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Json<OkBody<Vec<Video>>>> {
    let Query(params) = params.map_err(|err| ApiError::bad_request(vec![err.body_text()]))?;
    let query = params
        .validate()
        .map_err(|err| ApiError::bad_request(err.issues))?;

    let page = list_catalog_videos(state.store.as_ref(), &query)
        .await
        .map_err(|err| ApiError::from_store(err, "Failed to fetch videos"))?;

    Ok(Json(OkBody {
        next_page_token: page.next_page_token,
        ..OkBody::new(page.items)
    }))
}

async fn create_video(
    State(state): State<AppState>,
    payload: Result<Json<CreateVideo>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OkBody<Video>>)> {
    let Json(payload) = payload.map_err(|err| ApiError::bad_request(vec![err.body_text()]))?;
    let new_video = payload.validate().map_err(ApiError::bad_request)?;

    let row = state
        .store
        .create(new_video)
        .await
        .map_err(|err| ApiError::from_store(err, "Unable to save video"))?;
    info!(id = row.id, "video created");

    Ok((StatusCode::CREATED, Json(OkBody::new(Video::from(row)))))
}

async fn get_video(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<OkBody<Video>>> {
    let id = parse_video_id(&id)?;
    let row = state
        .store
        .get(id)
        .await
        .map_err(|err| ApiError::from_store(err, "Failed to fetch video"))?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    Ok(Json(OkBody::new(Video::from(row))))
}

async fn update_video(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    payload: Result<Json<UpdateVideo>, JsonRejection>,
) -> ApiResult<Json<OkBody<Video>>> {
    let id = parse_video_id(&id)?;
    let Json(payload) = payload.map_err(|err| ApiError::bad_request(vec![err.body_text()]))?;
    let changes = payload.validate().map_err(ApiError::bad_request)?;

    let row = state
        .store
        .update(id, changes)
        .await
        .map_err(|err| ApiError::from_store(err, "Failed to update video"))?;
    Ok(Json(OkBody::new(Video::from(row))))
}

async fn delete_video(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<StatusCode> {
    let id = parse_video_id(&id)?;
    state
        .store
        .delete(id)
        .await
        .map_err(|err| ApiError::from_store(err, "Failed to delete video"))?;
    info!(id, "video deleted");
    Ok(StatusCode::NO_CONTENT)
}

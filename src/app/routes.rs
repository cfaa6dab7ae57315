use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app::config_store::{ConfigStore, DomainConfig};
use crate::app::domain::{normalize_domain, pick_request_domain};
use crate::cache::ResultCache;
use crate::config::{RawSourceConfig, SourceConfig};
use crate::error::PipelineError;
use crate::formats::{DirectoryListing, GalleryIndex};
use crate::gallery::SOURCE_MODE;
use crate::listing::ListingSource;
use crate::pipeline::GalleryPipeline;

const GALLERY_CACHE_CONTROL: &str = "public, max-age=30";

#[derive(Clone)]
pub struct AppState {
    pub config_store: Arc<dyn ConfigStore>,
    pub cache: Arc<ResultCache>,
    pub source: Arc<dyn ListingSource>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/gallery-data", get(gallery_data).options(no_content))
        .route(
            "/api/admin/directories",
            post(admin_directories).options(no_content),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: String,
}

/// `{success:false, error, message}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Missing settings are the caller's problem; everything else is an
    /// upstream failure reported under `fetch_code`.
    fn pipeline(err: PipelineError, fetch_code: &'static str) -> Self {
        match err {
            PipelineError::MissingBaseUrl | PipelineError::MissingToken => {
                Self::new(StatusCode::BAD_REQUEST, err.code(), err.to_string())
            }
            err => {
                tracing::warn!(error = %err, code = fetch_code, "imgbed request failed");
                Self::new(StatusCode::BAD_GATEWAY, fetch_code, err.to_string())
            }
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        tracing::error!("internal error: {err:#}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal-error",
            format!("{err:#}"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Default, Deserialize)]
struct DomainQuery {
    #[serde(default)]
    domain: Option<String>,
}

#[derive(Debug, Serialize)]
struct GalleryDataBody<'a> {
    success: bool,
    mode: &'a str,
    cached: bool,
    data: &'a GalleryIndex,
}

async fn gallery_data(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let domain = pick_request_domain(query.domain.as_deref(), &headers);
    let stored = state
        .config_store
        .get(&domain)
        .await
        .map_err(ApiError::internal)?;

    if !stored.imgbed_enabled() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "gallery-mode-disabled",
            format!("imgbed gallery mode is not enabled for {domain}"),
        ));
    }

    let config = SourceConfig::from_raw(&stored.imgbed);
    config
        .require_credentials()
        .map_err(|err| ApiError::pipeline(err, "imgbed-fetch-failed"))?;
    let signature = config.signature();
    let pipeline = GalleryPipeline::builder(config)
        .source(Arc::clone(&state.source))
        .build()
        .map_err(ApiError::internal)?;

    let result = state
        .cache
        .get_or_try_compute(&domain, &signature, || async {
            pipeline.run_gallery().await.map(|run| run.index)
        })
        .await
        .map_err(|err| ApiError::pipeline(err, "imgbed-fetch-failed"))?;
    tracing::info!(%domain, cached = result.cached, "gallery data served");

    let body = GalleryDataBody {
        success: true,
        mode: SOURCE_MODE,
        cached: result.cached,
        data: &result.data,
    };
    let mut response = Json(body).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(GALLERY_CACHE_CONTROL),
    );
    Ok(response)
}

#[derive(Debug, Default, Deserialize)]
struct DirectoriesRequest {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    imgbed: Option<RawSourceConfig>,
    /// Older admin clients nest the override as `config.imgbed`.
    #[serde(default)]
    config: Option<DomainConfig>,
}

#[derive(Debug, Serialize)]
struct DirectoriesBody {
    success: bool,
    data: DirectoryListing,
}

async fn admin_directories(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DirectoriesBody>, ApiError> {
    let request: DirectoriesRequest = if body.is_empty() {
        DirectoriesRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|err| {
            tracing::debug!(%err, "ignoring unreadable directories request body");
            DirectoriesRequest::default()
        })
    };

    let domain = match request.domain.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(domain) => normalize_domain(domain),
        None => pick_request_domain(None, &headers),
    };
    let stored = state
        .config_store
        .get(&domain)
        .await
        .map_err(ApiError::internal)?;

    let override_config = request
        .imgbed
        .or_else(|| request.config.map(|config| config.imgbed))
        .unwrap_or_default();
    let config = SourceConfig::from_raw(&override_config.merged_over(&stored.imgbed));

    let fetch_code = "imgbed-directory-fetch-failed";
    config
        .require_base_url()
        .map_err(|err| ApiError::pipeline(err, fetch_code))?;
    let pipeline = GalleryPipeline::builder(config)
        .source(Arc::clone(&state.source))
        .build()
        .map_err(ApiError::internal)?;

    let run = pipeline
        .run_directories()
        .await
        .map_err(|err| ApiError::pipeline(err, fetch_code))?;

    let mut listing = run.listing;
    listing.domain = Some(domain);
    Ok(Json(DirectoriesBody {
        success: true,
        data: listing,
    }))
}

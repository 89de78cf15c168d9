use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use catalog::DancerCatalog;
use formats::{DanceMode, DancerRecord};
use layers::{
    DeclusterConfig, Legend, MarkerIcon, MarkersLayer, ModeStyle, PlacedMarker, PopupContent,
    PopupOptions,
};
use scene::{fit_camera, Camera2D, FitOptions, MercatorProjector, Viewport, ZoomLimits};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

const LAYOUT_LAYER_ID: u64 = 1;

#[derive(Clone)]
pub struct AppState {
    /// The dataset, or the reason it could not be loaded.
    pub dataset: Arc<Result<DancerCatalog, String>>,
    pub decluster: DeclusterConfig,
    pub base_url: String,
}

impl AppState {
    fn catalog(&self) -> Result<&DancerCatalog, Response> {
        match self.dataset.as_ref() {
            Ok(catalog) => Ok(catalog),
            Err(reason) => {
                Err((StatusCode::SERVICE_UNAVAILABLE, reason.clone()).into_response())
            }
        }
    }
}

pub fn router(state: AppState, static_root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/dancers", get(list_dancers))
        .route("/api/dancers/:id", get(get_dancer))
        .route("/api/dancers/:id/popup", get(get_popup))
        .route("/api/layout", get(get_layout))
        .route("/api/view", get(get_view))
        .route("/api/legend", get(get_legend))
        .fallback_service(ServeDir::new(static_root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

#[derive(Debug, Default, Deserialize)]
struct ModeQuery {
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PopupQuery {
    compact: Option<bool>,
}

/// View parameters are kept as raw strings so a malformed value degrades to
/// an unprojected layout instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
struct LayoutQuery {
    mode: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    zoom: Option<String>,
    width: Option<String>,
    height: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    mode: Option<String>,
    width: Option<String>,
    height: Option<String>,
}

#[derive(Debug, Serialize)]
struct LayoutResponse {
    mode: DanceMode,
    /// False when no usable view was supplied and markers sit at their
    /// original coordinates.
    projected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera: Option<Camera2D>,
    icon: MarkerIcon,
    markers: Vec<PlacedMarker>,
}

#[derive(Debug, Serialize)]
struct ViewResponse {
    mode: DanceMode,
    viewport: Viewport,
    camera: Camera2D,
    style: ModeStyle,
}

async fn list_dancers(
    State(state): State<AppState>,
    Query(query): Query<ModeQuery>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let catalog = state.catalog()?;
    let mode = parse_mode(query.mode.as_deref())?;

    let etag = match mode {
        Some(mode) => format!("\"{}-{mode}\"", catalog.content_hash()),
        None => format!("\"{}\"", catalog.content_hash()),
    };
    if if_none_match(&headers, &etag) {
        return Ok(with_etag(StatusCode::NOT_MODIFIED.into_response(), &etag));
    }

    let records: Vec<&DancerRecord> = match mode {
        Some(mode) => catalog.by_mode(mode),
        None => catalog.all().iter().collect(),
    };
    Ok(with_etag(Json(records).into_response(), &etag))
}

async fn get_dancer(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Response, Response> {
    let catalog = state.catalog()?;
    let dancer = find_dancer(catalog, &id)?;
    Ok(Json(dancer).into_response())
}

async fn get_popup(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<PopupQuery>,
) -> Result<Response, Response> {
    let catalog = state.catalog()?;
    let dancer = find_dancer(catalog, &id)?;
    let options = PopupOptions {
        base_url: state.base_url.clone(),
        compact: query.compact.unwrap_or(false),
    };
    Ok(Json(PopupContent::for_dancer(dancer, &options)).into_response())
}

async fn get_layout(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<Response, Response> {
    let catalog = state.catalog()?;
    let mode = parse_mode(query.mode.as_deref())?.unwrap_or_default();

    let view = parse_view(&query);
    if view.is_none() {
        debug!("layout requested without a usable view; returning original positions");
    }
    let projector = view.map(|(camera, viewport)| MercatorProjector::new(camera, viewport));

    let mut layer = MarkersLayer::new(LAYOUT_LAYER_ID, state.decluster);
    layer.set_dancers(mode, catalog.records_for(mode), projector.as_ref());

    Ok(Json(LayoutResponse {
        mode,
        projected: view.is_some(),
        camera: view.map(|(camera, _)| camera),
        icon: MarkerIcon::for_mode(mode),
        markers: layer.markers(),
    })
    .into_response())
}

async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, Response> {
    let catalog = state.catalog()?;
    let mode = parse_mode(query.mode.as_deref())?.unwrap_or_default();

    let default = Viewport::default();
    let viewport = Viewport::new(
        parse_positive(query.width.as_deref()).unwrap_or(default.width_px),
        parse_positive(query.height.as_deref()).unwrap_or(default.height_px),
    );
    let camera = catalog
        .bounds(mode)
        .map(|bounds| {
            fit_camera(
                bounds,
                viewport,
                FitOptions::dancers(),
                ZoomLimits::default(),
            )
        })
        .unwrap_or_default();

    Ok(Json(ViewResponse {
        mode,
        viewport,
        camera,
        style: ModeStyle::for_mode(mode),
    })
    .into_response())
}

async fn get_legend(Query(query): Query<ModeQuery>) -> Result<Response, Response> {
    let mode = parse_mode(query.mode.as_deref())?.unwrap_or_default();
    Ok(Json(Legend::for_mode(mode)).into_response())
}

fn find_dancer<'a>(catalog: &'a DancerCatalog, id: &str) -> Result<&'a DancerRecord, Response> {
    catalog
        .get(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no dancer {id:?}")).into_response())
}

fn parse_mode(raw: Option<&str>) -> Result<Option<DanceMode>, Response> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .parse::<DanceMode>()
            .map(Some)
            .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()).into_response()),
    }
}

fn parse_finite(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_positive(raw: Option<&str>) -> Option<f64> {
    parse_finite(raw).filter(|v| *v > 0.0)
}

fn parse_view(query: &LayoutQuery) -> Option<(Camera2D, Viewport)> {
    let lat = parse_finite(query.lat.as_deref()).filter(|v| (-90.0..=90.0).contains(v))?;
    let lon = parse_finite(query.lon.as_deref()).filter(|v| (-180.0..=180.0).contains(v))?;
    let zoom = parse_finite(query.zoom.as_deref())?;
    let width = parse_positive(query.width.as_deref())?;
    let height = parse_positive(query.height.as_deref())?;

    let camera = Camera2D::new(
        foundation::math::LatLon::new(lat, lon),
        ZoomLimits::default().clamp(zoom),
    );
    Some((camera, Viewport::new(width, height)))
}

fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(http::header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(',')
                .map(str::trim)
                .any(|tag| tag == "*" || tag == etag)
        })
}

fn with_etag(mut response: Response, etag: &str) -> Response {
    match HeaderValue::from_str(etag) {
        Ok(value) => {
            response.headers_mut().insert(http::header::ETAG, value);
        }
        Err(err) => warn!("unusable etag {etag:?}: {err}"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use formats::parse_dancers;
    use foundation::DancerId;
    use serde_json::Value;
    use tower::ServiceExt;

    const DATASET: &str = include_str!("../../../../data/dancers.json");

    fn state_with(catalog: DancerCatalog) -> AppState {
        AppState {
            dataset: Arc::new(Ok(catalog)),
            decluster: DeclusterConfig::default(),
            base_url: "/dance-map/".to_string(),
        }
    }

    fn bundled() -> AppState {
        state_with(DancerCatalog::from_records(parse_dancers(DATASET).unwrap()).unwrap())
    }

    fn record(id: &str, lat: f64, lon: f64) -> DancerRecord {
        DancerRecord {
            id: DancerId::new(id),
            name: format!("Dancer {id}"),
            mode: DanceMode::Salsa,
            location: "New York, USA".into(),
            latitude: lat,
            longitude: lon,
            profile_pic: format!("images/{id}.jpg"),
            instagram: None,
            tiktok: None,
        }
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        get_with(state, Request::builder().uri(uri)).await
    }

    async fn get_with(
        state: AppState,
        request: http::request::Builder,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let app = router(state, Path::new("does-not-exist"));
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (status, _, body) = get(bundled(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn lists_dancers_for_one_mode() {
        let (status, headers, body) = get(bundled(), "/api/dancers?mode=bachata").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(http::header::ETAG));
        let dancers = json(&body);
        let dancers = dancers.as_array().unwrap();
        assert!(!dancers.is_empty());
        assert!(dancers.iter().all(|d| d["type"] == "bachata"));
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let (_, headers, _) = get(bundled(), "/api/dancers").await;
        let etag = headers.get(http::header::ETAG).unwrap().clone();

        let (status, _, body) = get_with(
            bundled(),
            Request::builder()
                .uri("/api/dancers")
                .header(http::header::IF_NONE_MATCH, etag),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let (status, _, _) = get(bundled(), "/api/dancers?mode=tango").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = get(bundled(), "/api/layout?mode=tango").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_dancer_is_not_found() {
        let (status, _, _) = get(bundled(), "/api/dancers/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn popup_uses_base_url_and_compact_flag() {
        let (status, _, body) = get(bundled(), "/api/dancers/salsa-1/popup?compact=true").await;
        assert_eq!(status, StatusCode::OK);
        let popup = json(&body);
        assert_eq!(popup["dancer"], "salsa-1");
        assert!(popup["image"]["url"]
            .as_str()
            .unwrap()
            .starts_with("/dance-map/"));
        assert!(popup.get("center_on").is_some());
    }

    #[tokio::test]
    async fn layout_spreads_overlapping_markers() {
        let state = state_with(
            DancerCatalog::from_records(vec![
                record("a", 40.7128, -74.0060),
                record("b", 40.7130, -74.0050),
                record("c", 51.5074, -0.1278),
            ])
            .unwrap(),
        );
        let (status, _, body) = get(
            state,
            "/api/layout?mode=salsa&lat=45&lon=-40&zoom=3&width=1024&height=768",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let layout = json(&body);
        assert_eq!(layout["projected"], true);
        let displaced: Vec<&str> = layout["markers"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|m| m["displaced"] == true)
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        assert_eq!(displaced, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn layout_without_view_keeps_original_positions() {
        let (status, _, body) = get(bundled(), "/api/layout?mode=salsa&zoom=abc").await;
        assert_eq!(status, StatusCode::OK);
        let layout = json(&body);
        assert_eq!(layout["projected"], false);
        assert!(layout.get("camera").is_none());
        for marker in layout["markers"].as_array().unwrap() {
            assert_eq!(marker["position"], marker["original"]);
        }
    }

    #[tokio::test]
    async fn initial_view_is_capped_at_zoom_three() {
        let (status, _, body) = get(bundled(), "/api/view?mode=salsa&width=1920&height=1080").await;
        assert_eq!(status, StatusCode::OK);
        let view = json(&body);
        assert!(view["camera"]["zoom"].as_f64().unwrap() <= 3.0);
        assert_eq!(view["style"]["legend_label"], "Salsa Dancers");
    }

    #[tokio::test]
    async fn legend_defaults_to_salsa() {
        let (_, _, body) = get(bundled(), "/api/legend").await;
        let legend = json(&body);
        assert_eq!(legend["label"], "Salsa Dancers");
        assert_eq!(legend["hint"], "Tap markers for details");
    }

    #[tokio::test]
    async fn missing_dataset_is_unavailable() {
        let state = AppState {
            dataset: Arc::new(Err("dancer dataset unavailable: missing".to_string())),
            decluster: DeclusterConfig::default(),
            base_url: "/".to_string(),
        };
        let (status, _, body) = get(state, "/api/dancers").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(String::from_utf8(body).unwrap().contains("missing"));
    }
}

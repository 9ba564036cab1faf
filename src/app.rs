use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use crate::catalog::{CatalogCache, CatalogEntry};
use crate::config::Config;
use crate::downloader;
use crate::edit_buffer::EditField;
use crate::error::InventoryError;
use crate::filter::{self, Choice, FilterSelection};
use crate::preview::{self, PreviewRow};
use crate::saving;
use crate::session::{EditRow, InventorySession, ResetState};
use crate::spreadsheet::Spreadsheet;
use crate::writer;

/// Wire format of `/api/date`, matching `<input type="date">`.
const ISO_DATE: &str = "%Y-%m-%d";

pub struct AppState {
    config: Config,
    store: Mutex<Spreadsheet>,
    catalog: CatalogCache,
    session: Mutex<InventorySession>,
    snapshot: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: Config, store: Spreadsheet, snapshot: Option<PathBuf>) -> Self {
        AppState {
            config,
            store: Mutex::new(store),
            catalog: CatalogCache::new(),
            session: Mutex::new(InventorySession::new()),
            snapshot,
        }
    }

    fn catalog(&self) -> Result<Arc<Vec<CatalogEntry>>, ApiError> {
        let store = lock(&self.store);
        Ok(self.catalog.get_or_load(&*store, &self.config.catalog)?)
    }

    /// Persists the workbook after a write, when running from a snapshot file.
    fn persist(&self, store: &Spreadsheet) -> Result<(), ApiError> {
        if let Some(path) = &self.snapshot {
            saving::save_spreadsheet(store, path)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Every failure is rendered as `{status: "error", message}` at this boundary.
pub struct ApiError(InventoryError);

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InventoryError::InvalidArea(_)
            | InventoryError::InvalidAddress(_)
            | InventoryError::InvalidInput(_)
            | InventoryError::NoProductsMatch => StatusCode::BAD_REQUEST,
            InventoryError::MissingProducts(_) | InventoryError::ResetNotRequested => {
                StatusCode::CONFLICT
            }
            InventoryError::DataSource(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::warn!("request failed: {}", self.0);
        (
            status,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(self.0.to_string()),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl StatusResponse {
    fn ok(message: impl Into<String>) -> Self {
        StatusResponse {
            status: "ok".to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
struct SelectionQuery {
    area: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    sub_family: String,
    #[serde(default)]
    product: String,
}

impl SelectionQuery {
    fn selection(&self) -> FilterSelection {
        FilterSelection {
            area: self.area.trim().to_string(),
            category: Choice::parse(&self.category),
            sub_family: Choice::parse(&self.sub_family),
            product: Choice::parse(&self.product),
        }
    }
}

#[derive(Serialize)]
struct OptionsResponse {
    categories: Vec<String>,
    sub_families: Vec<String>,
    products: Vec<String>,
}

#[derive(Deserialize)]
struct EditRequest {
    product: String,
    field: String,
    value: Option<String>,
}

#[derive(Serialize)]
struct PreviewResponse {
    rows: Vec<PreviewRow>,
    total: f64,
}

#[derive(Deserialize)]
struct CommentRequest {
    text: String,
}

#[derive(Deserialize)]
struct DateRequest {
    /// `YYYY-MM-DD`
    date: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_landing))
        .route("/api/areas", get(get_areas))
        .route("/api/options", get(get_options))
        .route("/api/select", post(select))
        .route("/api/edit_rows", get(get_edit_rows))
        .route("/api/edit", post(edit))
        .route("/api/preview", get(get_preview))
        .route("/api/date", post(set_date))
        .route("/api/save", post(save))
        .route("/api/comment", post(save_comment))
        .route("/api/reset/request", post(request_reset))
        .route("/api/reset/confirm", post(confirm_reset))
        .route("/api/reset/cancel", post(cancel_reset))
        .route("/api/catalog/invalidate", post(invalidate_catalog))
        .route("/api/export/:tab", get(export_csv))
        .route("/api/export_xlsx/:tab", get(export_xlsx))
        .with_state(state)
}

pub async fn run(
    config: Config,
    store: Spreadsheet,
    snapshot: Option<PathBuf>,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = Arc::new(AppState::new(config, store, snapshot));
    let app = router(app_state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/inventory.html"))
}

async fn get_areas(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let catalog = state.catalog()?;
    Ok(Json(filter::areas(
        &catalog,
        &state.config.catalog.excluded_areas,
    )))
}

/// Choices for the three dependent dropdowns given the upstream ones.
async fn get_options(
    Query(params): Query<SelectionQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<OptionsResponse> {
    let catalog = state.catalog()?;
    let selection = params.selection();
    let by_area = filter::by_area(&catalog, &selection.area)?;
    let by_category = filter::by_category(by_area.clone(), &selection.category);
    let by_sub_family = filter::by_sub_family(by_category.clone(), &selection.sub_family);

    Ok(Json(OptionsResponse {
        categories: filter::with_all(filter::categories(&by_area)),
        sub_families: filter::with_all(filter::sub_families(&by_category)),
        products: filter::with_all(filter::products(&by_sub_family)),
    }))
}

async fn select(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SelectionQuery>,
) -> ApiResult<Vec<EditRow>> {
    let catalog = state.catalog()?;
    let mut session = lock(&state.session);
    session.select(params.selection())?;
    Ok(Json(session.edit_rows(&catalog)?))
}

async fn get_edit_rows(State(state): State<Arc<AppState>>) -> ApiResult<Vec<EditRow>> {
    let catalog = state.catalog()?;
    let mut session = lock(&state.session);
    Ok(Json(session.edit_rows(&catalog)?))
}

async fn edit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EditRequest>,
) -> ApiResult<StatusResponse> {
    let field = EditField::parse(&payload.field).ok_or_else(|| {
        InventoryError::InvalidInput(format!("unknown field '{}'", payload.field))
    })?;
    let mut session = lock(&state.session);
    session.edit(&payload.product, field, payload.value.as_deref())?;
    Ok(Json(StatusResponse::ok("staged")))
}

async fn get_preview(State(state): State<Arc<AppState>>) -> ApiResult<PreviewResponse> {
    let catalog = state.catalog()?;
    let mut session = lock(&state.session);
    let rows = session.preview(&catalog)?;
    let total = preview::preview_total(&rows);
    Ok(Json(PreviewResponse { rows, total }))
}

async fn set_date(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DateRequest>,
) -> ApiResult<StatusResponse> {
    let date = NaiveDate::parse_from_str(payload.date.trim(), ISO_DATE).map_err(|e| {
        InventoryError::InvalidInput(format!("invalid date '{}': {}", payload.date, e))
    })?;
    let stored = writer::format_date(date, &state.config.layout.date_format)?;
    lock(&state.session).date = date;
    Ok(Json(StatusResponse::ok(stored)))
}

async fn save(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let catalog = state.catalog()?;
    let mut session = lock(&state.session);
    let mut store = lock(&state.store);
    let report = session.save(&mut *store, &catalog, &state.config)?;
    state.persist(&store)?;
    Ok(Json(report))
}

async fn save_comment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CommentRequest>,
) -> ApiResult<StatusResponse> {
    let session = lock(&state.session);
    let mut store = lock(&state.store);
    session.save_comment(&mut *store, &state.config, &payload.text)?;
    state.persist(&store)?;
    Ok(Json(StatusResponse::ok("comment saved")))
}

async fn request_reset(State(state): State<Arc<AppState>>) -> ApiResult<ResetState> {
    let mut session = lock(&state.session);
    session.request_reset()?;
    Ok(Json(session.reset_state()))
}

async fn confirm_reset(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let mut session = lock(&state.session);
    let mut store = lock(&state.store);
    let written = session.confirm_reset(&mut *store, &state.config)?;
    state.persist(&store)?;
    Ok(Json(StatusResponse::ok(format!("{} cells cleared", written))))
}

async fn cancel_reset(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    lock(&state.session).cancel_reset()?;
    Ok(Json(StatusResponse::ok("cancelled")))
}

async fn invalidate_catalog(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    state.catalog.invalidate();
    Ok(Json(StatusResponse::ok("catalog will reload on next use")))
}

async fn export_csv(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let store = lock(&state.store);
    let csv = downloader::to_csv(store.worksheet(&tab)?)?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

async fn export_xlsx(
    Path(tab): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let store = lock(&state.store);
    let bytes = downloader::to_xlsx(store.worksheet(&tab)?)?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .body(Body::from(bytes))
        .map_err(|e| InventoryError::DataSource(e.to_string()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/workbook");
        let store = loader::load_spreadsheet(dir).unwrap();
        router(Arc::new(AppState::new(Config::default(), store, None)))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn landing_page_is_embedded() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Inventario diario"));
        // Catalog text reaches the DOM only through the escape helper or textContent.
        assert!(page.contains("function escapeHtml"));
        assert!(!page.contains("<option>${o}</option>"));
        assert!(!page.contains("${row.product}"));
    }

    #[tokio::test]
    async fn no_static_directory_is_served() {
        let response = app()
            .oneshot(Request::get("/static/inventory.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn date_is_posted_as_iso_and_stored_in_the_configured_format() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json("/api/date", r#"{"date":"2026-10-18"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("18-10-2026"));

        let response = app
            .oneshot(post_json("/api/date", r#"{"date":"18-10-2026"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains(r#""status":"error""#));
    }

    #[tokio::test]
    async fn areas_come_from_the_catalog() {
        let response = app()
            .oneshot(Request::get("/api/areas").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"["BARRA","COCINA","SUMINISTROS"]"#
        );
    }
}

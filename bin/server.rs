// Inventory Count - Web Server
// REST API over the shared counting session

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use inventory_count::{
    difference, expected_quantity, logging, read_table, resolve_columns, Config, ImportError,
    InventoryStats, ScanOutcome, Session, SharedSession, SnapshotStore,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::MutexGuard;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: SharedSession,
}

impl AppState {
    fn lock(&self) -> Result<MutexGuard<'_, Session>, Response> {
        self.session
            .lock()
            .map_err(|_| error_response(StatusCode::INTERNAL_SERVER_ERROR, "session lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn ok_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

/// Item row with derived expected/difference
#[derive(Serialize)]
struct ItemResponse {
    equipment_id: String,
    count: u32,
    expected: Option<i64>,
    difference: Option<i64>,
    attributes: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct ScanRequest {
    input: String,
}

#[derive(Deserialize)]
struct ImportParams {
    equipment_column: Option<String>,
    quantity_column: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/snapshot - Full session state
async fn get_snapshot(State(state): State<AppState>) -> Response {
    match state.lock() {
        Ok(session) => ok_response(session.snapshot()),
        Err(resp) => resp,
    }
}

/// GET /api/stats - Totals
async fn get_stats(State(state): State<AppState>) -> Response {
    match state.lock() {
        Ok(session) => ok_response::<InventoryStats>(session.stats()),
        Err(resp) => resp,
    }
}

/// GET /api/items - Items with expected quantity and difference
async fn get_items(State(state): State<AppState>) -> Response {
    let session = match state.lock() {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let snapshot = session.snapshot();
    let quantity_column = snapshot.quantity_column_name.as_deref();

    let items: Vec<ItemResponse> = snapshot
        .items
        .iter()
        .map(|item| ItemResponse {
            equipment_id: item.equipment_id.clone(),
            count: item.count,
            expected: quantity_column.map(|column| expected_quantity(item, column)),
            difference: difference(item, quantity_column),
            attributes: item.attributes.clone(),
        })
        .collect();

    ok_response(items)
}

/// GET /api/unknown - Unknown scan log
async fn get_unknown(State(state): State<AppState>) -> Response {
    match state.lock() {
        Ok(session) => ok_response(&session.snapshot().unknown_scans),
        Err(resp) => resp,
    }
}

/// GET /api/duplicates - Roster ids sharing a scan key
async fn get_duplicates(State(state): State<AppState>) -> Response {
    match state.lock() {
        Ok(session) => ok_response(session.duplicates()),
        Err(resp) => resp,
    }
}

/// POST /api/scan - Record one scan
async fn post_scan(State(state): State<AppState>, Json(request): Json<ScanRequest>) -> Response {
    let mut session = match state.lock() {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    match session.scan(&request.input) {
        Ok(Some(outcome)) => ok_response::<ScanOutcome>(outcome),
        Ok(None) => error_response(StatusCode::BAD_REQUEST, "empty scan".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "scan failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /api/import - Import a CSV equipment list (request body)
async fn post_import(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Response {
    let result = read_table(body.as_bytes()).and_then(|mut table| {
        let columns = resolve_columns(
            &table,
            params.equipment_column.as_deref(),
            params.quantity_column.as_deref(),
        )?;
        table.retain_identified(&columns.equipment);
        Ok((table, columns))
    });

    let (table, columns) = match result {
        Ok(parsed) => parsed,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("{:#}", e)),
    };

    let mut session = match state.lock() {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    match session.import(&table, &columns) {
        Ok(summary) => ok_response(summary),
        Err(e) if e.downcast_ref::<ImportError>().is_some() => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "import failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /api/reset - Zero counts, clear unknown scans
async fn post_reset(State(state): State<AppState>) -> Response {
    let mut session = match state.lock() {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    match session.reset_counts() {
        Ok(()) => ok_response(session.stats()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// POST /api/clear - Remove all data
async fn post_clear(State(state): State<AppState>) -> Response {
    let mut session = match state.lock() {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    match session.clear() {
        Ok(()) => ok_response(session.stats()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/stats", get(get_stats))
        .route("/items", get(get_items))
        .route("/unknown", get(get_unknown))
        .route("/duplicates", get(get_duplicates))
        .route("/scan", post(post_scan))
        .route("/import", post(post_import))
        .route("/reset", post(post_reset))
        .route("/clear", post(post_clear))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init(&config.log_filter);

    println!("🌐 Inventory Count - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = SnapshotStore::open(&config.database_path)?;
    println!("✓ Database opened: {}", config.database_path.display());

    let session = Session::open(store)?;
    println!("✓ {}", session.stats().summary());

    let app = router(AppState {
        session: session.into_shared(),
    });

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;

    println!("\n🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/stats", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}

// Brasil Dashboard - Web Server
// REST API over the BrasilAPI client, search history and lookup log

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use brasil_dashboard::documents::{phone, postal_code, registry_number};
use brasil_dashboard::entities::rate::split_main_indicators;
use brasil_dashboard::{
    filter, history, insert_lookup_event, logging, lookup_stats, open_database, Address,
    ApiError, Bank, BankDirectory, BrasilApiClient, ConfigArgs, ErrorKind, FilterCriteria,
    IndicatorCard, LoadState, LoadTracker, LookupEvent, LookupStat, Rate, RegistryNumber,
    Resource, SearchHistory, SortField, SortOrder,
};
use clap::{ArgAction, Parser};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tower_http::cors::CorsLayer;

#[derive(Parser)]
#[command(name = "brasil-server", version, about = "Brasil Dashboard REST API")]
struct ServerArgs {
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Listen address
    #[arg(long, env = "BRASIL_SERVER_ADDR", default_value = "0.0.0.0:3000")]
    addr: String,

    #[command(flatten)]
    config: ConfigArgs,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    client: Arc<BrasilApiClient>,
    db: Arc<Mutex<Connection>>,
    loading: Arc<Mutex<LoadTracker>>,
}

impl AppState {
    // A poisoned lock still holds usable data
    fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn loading(&self) -> MutexGuard<'_, LoadTracker> {
        self.loading.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, resource: Resource, key: &str, started: Instant, outcome: &str) {
        let event = LookupEvent::new(
            resource.as_str(),
            key,
            outcome,
            started.elapsed().as_millis() as i64,
        );
        if let Err(e) = insert_lookup_event(&self.db(), &event) {
            tracing::warn!("could not record lookup: {:#}", e);
        }
    }

    /// Run an upstream call with loading state and the lookup log kept current
    async fn tracked<T, F>(&self, resource: Resource, key: &str, call: F) -> Result<T, ApiError>
    where
        F: std::future::Future<Output = Result<T, ApiError>>,
    {
        self.loading().set_loading(resource, true);
        let started = Instant::now();

        let result = call.await;

        match &result {
            Ok(_) => {
                self.loading().set_success(resource);
                self.record(resource, key, started, "success");
            }
            Err(e) => {
                self.loading().set_error(resource, &e.message);
                self.record(resource, key, started, e.code());
            }
        }
        result
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    retryable: bool,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(code: &'static str, message: String, retryable: bool) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message,
                retryable,
            }),
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Network | ErrorKind::Server | ErrorKind::Decode | ErrorKind::Unknown => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn upstream_error(error: ApiError) -> Response {
    (
        status_for(error.kind),
        Json(ApiResponse::<()>::failed(
            error.code(),
            error.message,
            error.retryable,
        )),
    )
        .into_response()
}

fn internal_error(context: &str, error: anyhow::Error) -> Response {
    tracing::error!("{}: {:#}", context, error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::failed(
            "INTERNAL",
            context.to_string(),
            false,
        )),
    )
        .into_response()
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DocumentPath {
    Cep,
    Cnpj,
    Phone,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum HistoryPath {
    Cep,
    Cnpj,
}

#[derive(Debug, Default, Deserialize)]
struct BanksQuery {
    search: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    /// 1-based
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Serialize)]
struct BankPage {
    total: usize,
    page: usize,
    page_size: usize,
    pages: usize,
    items: Vec<Bank>,
}

#[derive(Serialize)]
struct RateView {
    name: String,
    value: f64,
    formatted_value: String,
    unit: &'static str,
    trend: &'static str,
}

impl From<&Rate> for RateView {
    fn from(rate: &Rate) -> Self {
        Self {
            name: rate.name.clone(),
            value: rate.value,
            formatted_value: rate.formatted_value(),
            unit: rate.unit(),
            trend: rate.trend().arrow(),
        }
    }
}

#[derive(Serialize)]
struct MainRatesResponse {
    indicators: Vec<IndicatorCard>,
    others: Vec<RateView>,
}

#[derive(Serialize)]
struct ValidationResponse {
    valid: bool,
    formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum HistoryList {
    Cep(Vec<Address>),
    Cnpj(Vec<String>),
}

#[derive(Serialize)]
struct StatusResponse {
    version: &'static str,
    loading: HashMap<&'static str, LoadState>,
    lookups: Vec<LookupStat>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/cep/:cep - Address for a postal code
async fn get_cep(State(state): State<AppState>, Path(cep): Path<String>) -> Response {
    let key = brasil_dashboard::digits::normalize(&cep);
    let result = state
        .tracked(Resource::PostalCode, &key, state.client.lookup_postal_code(&cep))
        .await;

    match result {
        Ok(address) => {
            if let Err(e) = history::remember(&state.db(), address.clone()) {
                tracing::warn!("could not save CEP history: {:#}", e);
            }
            ok(address)
        }
        Err(e) => upstream_error(e),
    }
}

/// GET /api/cnpj/:cnpj - Company record for a registry number
async fn get_cnpj(State(state): State<AppState>, Path(cnpj): Path<String>) -> Response {
    let key = brasil_dashboard::digits::normalize(&cnpj);
    let result = state
        .tracked(Resource::RegistryNumber, &key, state.client.lookup_company(&cnpj))
        .await;

    match result {
        Ok(company) => {
            if let Ok(number) = registry_number::validate(&cnpj) {
                if let Err(e) = history::remember(&state.db(), number) {
                    tracing::warn!("could not save CNPJ history: {:#}", e);
                }
            }
            ok(company)
        }
        Err(e) => upstream_error(e),
    }
}

async fn fetch_banks(state: &AppState) -> Result<BankDirectory, ApiError> {
    let banks = state
        .tracked(Resource::Banks, "", state.client.list_banks())
        .await?;
    Ok(BankDirectory::new(banks))
}

/// GET /api/banks - Search, sort and page the bank listing
async fn get_banks(State(state): State<AppState>, Query(query): Query<BanksQuery>) -> Response {
    let directory = match fetch_banks(&state).await {
        Ok(directory) => directory,
        Err(e) => return upstream_error(e),
    };

    let criteria = FilterCriteria::new(
        query.search.as_deref().unwrap_or(""),
        match query.sort.as_deref() {
            Some(sort) => SortField::parse(sort),
            None => Some(SortField::Name),
        },
        query
            .order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default(),
    );
    let filtered = directory.search(&criteria);

    let page_size = query
        .page_size
        .unwrap_or(filter::DEFAULT_PAGE_SIZE)
        .clamp(1, filter::MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    ok(BankPage {
        total: filtered.len(),
        page,
        page_size,
        pages: filter::page_count(filtered.len(), page_size),
        items: filter::paginate(&filtered, page - 1, page_size).to_vec(),
    })
}

/// GET /api/banks/main - The main retail banks, by name
async fn get_main_banks(State(state): State<AppState>) -> Response {
    match fetch_banks(&state).await {
        Ok(directory) => ok(directory.main_banks()),
        Err(e) => upstream_error(e),
    }
}

/// GET /api/rates - Every rate with its display value
async fn get_rates(State(state): State<AppState>) -> Response {
    match state
        .tracked(Resource::Rates, "", state.client.list_rates())
        .await
    {
        Ok(rates) => ok(rates.iter().map(RateView::from).collect::<Vec<_>>()),
        Err(e) => upstream_error(e),
    }
}

/// GET /api/rates/main - Indicator cards plus the remaining rates
async fn get_main_rates(State(state): State<AppState>) -> Response {
    match state
        .tracked(Resource::Rates, "", state.client.list_rates())
        .await
    {
        Ok(rates) => {
            let (indicators, others) = split_main_indicators(&rates);
            ok(MainRatesResponse {
                indicators,
                others: others.iter().map(RateView::from).collect(),
            })
        }
        Err(e) => upstream_error(e),
    }
}

/// GET /api/validate/:kind/:value - Offline document check
async fn validate_document(Path((kind, value)): Path<(DocumentPath, String)>) -> Response {
    let (result, formatted) = match kind {
        DocumentPath::Cep => (
            postal_code::validate(&value).map(|_| ()),
            postal_code::display(&value),
        ),
        DocumentPath::Cnpj => (
            registry_number::validate(&value).map(|_| ()),
            registry_number::format(&value),
        ),
        DocumentPath::Phone => (phone::validate(&value).map(|_| ()), phone::format(&value)),
    };

    ok(ValidationResponse {
        valid: result.is_ok(),
        formatted,
        message: result.err().map(|e| e.to_string()),
    })
}

/// GET /api/history/:kind - Last successful lookups, most recent first
async fn get_history(State(state): State<AppState>, Path(kind): Path<HistoryPath>) -> Response {
    let conn = state.db();
    let list = match kind {
        HistoryPath::Cep => {
            SearchHistory::<Address>::load(&conn).map(|h| HistoryList::Cep(h.entries().to_vec()))
        }
        HistoryPath::Cnpj => SearchHistory::<RegistryNumber>::load(&conn)
            .map(|h| HistoryList::Cnpj(h.entries().iter().map(|n| n.to_string()).collect())),
    };

    match list {
        Ok(list) => ok(list),
        Err(e) => internal_error("Failed to read history", e),
    }
}

/// DELETE /api/history/:kind - Forget the lookups of one kind
async fn clear_history(State(state): State<AppState>, Path(kind): Path<HistoryPath>) -> Response {
    let conn = state.db();
    let result = match kind {
        HistoryPath::Cep => SearchHistory::<Address>::new().clear_stored(&conn),
        HistoryPath::Cnpj => SearchHistory::<RegistryNumber>::new().clear_stored(&conn),
    };

    match result {
        Ok(()) => ok("cleared"),
        Err(e) => internal_error("Failed to clear history", e),
    }
}

/// GET /api/status - Loading state per resource plus lookup counters
async fn get_status(State(state): State<AppState>) -> Response {
    let loading = state.loading().snapshot();

    match lookup_stats(&state.db()) {
        Ok(lookups) => ok(StatusResponse {
            version: brasil_dashboard::VERSION,
            loading,
            lookups,
        }),
        Err(e) => internal_error("Failed to read lookup stats", e),
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/cep/:cep", get(get_cep))
        .route("/cnpj/:cnpj", get(get_cnpj))
        .route("/banks", get(get_banks))
        .route("/banks/main", get(get_main_banks))
        .route("/rates", get(get_rates))
        .route("/rates/main", get(get_main_rates))
        .route("/validate/:kind/:value", get(validate_document))
        .route("/history/:kind", get(get_history).delete(clear_history))
        .route("/status", get(get_status))
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
    let args = ServerArgs::parse();
    logging::init(logging::level_for(args.verbose.max(1)));

    println!("🌐 Brasil Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_database(&args.config.db)?;
    println!("✓ Database opened: {:?}", args.config.db);

    let client = BrasilApiClient::new(args.config.api_config())?;
    println!("✓ Upstream: {}", client.config().base_url);

    // Create shared state
    let state = AppState {
        client: Arc::new(client),
        db: Arc::new(Mutex::new(conn)),
        loading: Arc::new(Mutex::new(LoadTracker::new())),
    };

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;

    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/banks", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use brasil_dashboard::{setup_database, ApiConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        // Nothing listens here; tests below never reach the network
        let config = ApiConfig::default().with_base_url("http://127.0.0.1:9").with_retries(0);

        AppState {
            client: Arc::new(BrasilApiClient::new(config).unwrap()),
            db: Arc::new(Mutex::new(conn)),
            loading: Arc::new(Mutex::new(LoadTracker::new())),
        }
    }

    async fn call(state: AppState, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(test_state(), "GET", "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_validate_cnpj() {
        let (status, body) = call(test_state(), "GET", "/api/validate/cnpj/11222333000181").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["valid"], true);
        assert_eq!(body["data"]["formatted"], "11.222.333/0001-81");

        let (_, body) = call(test_state(), "GET", "/api/validate/cnpj/11222333000182").await;
        assert_eq!(body["data"]["valid"], false);
        assert_eq!(body["data"]["message"], "CNPJ inválido");
    }

    #[tokio::test]
    async fn test_validate_unknown_kind_is_rejected() {
        let (status, _) = call(test_state(), "GET", "/api/validate/cpf/123").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_cep_is_bad_request_and_logged() {
        let state = test_state();
        let (status, body) = call(state.clone(), "GET", "/api/cep/123").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "CEP deve conter exatamente 8 dígitos");

        let (_, body) = call(state, "GET", "/api/status").await;
        assert_eq!(body["data"]["lookups"][0]["resource"], "cep");
        assert_eq!(body["data"]["lookups"][0]["failures"], 1);
        assert!(body["data"]["loading"]["cep"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_history_roundtrip() {
        let state = test_state();
        history::remember(&state.db(), registry_number::validate("11222333000181").unwrap())
            .unwrap();

        let (_, body) = call(state.clone(), "GET", "/api/history/cnpj").await;
        assert_eq!(body["data"][0], "11.222.333/0001-81");

        let (status, _) = call(state.clone(), "DELETE", "/api/history/cnpj").await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(state, "GET", "/api/history/cnpj").await;
        assert_eq!(body["data"], serde_json::json!([]));
    }
}

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clausex_core::document::Document;
use clausex_core::domain::loan::{LoanId, LoanRecord, RiskBand};
use clausex_core::error::{FileReadError, UploadError};
use clausex_core::extraction::LoanExtractor;
use clausex_core::llm::gemini::GeminiClient;
use clausex_core::session::user::{Credentials, UserProfile};
use clausex_core::session::{self, PortfolioSummary, SessionAction, SessionState, SessionStore};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = clausex_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let model = GeminiClient::from_settings(&settings)?;
    let state = AppState {
        store: Arc::new(SessionStore::new()),
        extractor: LoanExtractor::new(Arc::new(model)),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/session", post(login).get(profile).delete(logout))
        .route("/loans", get(list_loans))
        .route("/loans/analyze", post(analyze))
        .route("/loans/:id", get(get_loan))
        .route("/selection", get(get_selection).delete(clear_selection))
        .route("/selection/:id", put(select_loan))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    store: Arc<SessionStore>,
    extractor: LoanExtractor,
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    NotFound,
    BadRequest(String),
    Upload(UploadError),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self::Upload(err)
    }
}

impl From<FileReadError> for ApiError {
    fn from(err: FileReadError) -> Self {
        Self::Upload(err.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "not signed in".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "loan not found".to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upload(err) => {
                let status = match &err {
                    UploadError::FileRead(e) => {
                        tracing::warn!(error = %format!("{:#}", e.cause()), "upload body unreadable");
                        StatusCode::BAD_REQUEST
                    }
                    UploadError::Extraction(e) => {
                        sentry_anyhow::capture_anyhow(e.cause());
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, err.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

async fn require_user(store: &SessionStore) -> Result<SessionState, ApiError> {
    let state = store.snapshot().await;
    if state.user().is_none() {
        return Err(ApiError::Unauthorized);
    }
    Ok(state)
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(credentials) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user =
        UserProfile::sign_in(credentials).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state
        .store
        .dispatch(SessionAction::LoggedIn(user.clone()))
        .await;
    tracing::info!(email = %user.email, "signed in");
    Ok(Json(user))
}

async fn logout(State(state): State<AppState>) -> StatusCode {
    state.store.dispatch(SessionAction::LoggedOut).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileView {
    user: UserProfile,
    initials: String,
    summary: PortfolioSummary,
}

async fn profile(State(state): State<AppState>) -> Result<Json<ProfileView>, ApiError> {
    let session = require_user(&state.store).await?;
    let user = session.user().cloned().ok_or(ApiError::Unauthorized)?;
    Ok(Json(ProfileView {
        initials: user.initials(),
        user,
        summary: session.summary(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioRow {
    #[serde(flatten)]
    loan: Arc<LoanRecord>,
    risk_band: RiskBand,
}

async fn list_loans(State(state): State<AppState>) -> Result<Json<Vec<PortfolioRow>>, ApiError> {
    let session = require_user(&state.store).await?;
    let rows = session
        .loans()
        .iter()
        .map(|loan| PortfolioRow {
            risk_band: loan.risk_band(),
            loan: loan.clone(),
        })
        .collect();
    Ok(Json(rows))
}

async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<LoanRecord>), ApiError> {
    require_user(&state.store).await?;

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

    // No size limit: the advertised 10MB is guidance only.
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(FileReadError::new)?;

    let record = session::upload(
        &state.store,
        &state.extractor,
        Document::new(bytes.to_vec(), mime_type),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

fn parse_id(raw: &str) -> Result<LoanId, ApiError> {
    LoanId::parse(raw).ok_or(ApiError::NotFound)
}

async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Arc<LoanRecord>>, ApiError> {
    let session = require_user(&state.store).await?;
    let loan = session.find(parse_id(&id)?).ok_or(ApiError::NotFound)?;
    Ok(Json(loan.clone()))
}

async fn select_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Arc<LoanRecord>>, ApiError> {
    let session = require_user(&state.store).await?;
    let id = parse_id(&id)?;
    let loan = session.find(id).cloned().ok_or(ApiError::NotFound)?;
    state
        .store
        .dispatch(SessionAction::RecordSelected(id))
        .await;
    Ok(Json(loan))
}

async fn get_selection(
    State(state): State<AppState>,
) -> Result<Json<Arc<LoanRecord>>, ApiError> {
    let session = require_user(&state.store).await?;
    let loan = session.selected().cloned().ok_or(ApiError::NotFound)?;
    Ok(Json(loan))
}

async fn clear_selection(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    require_user(&state.store).await?;
    state.store.dispatch(SessionAction::SelectionCleared).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &clausex_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

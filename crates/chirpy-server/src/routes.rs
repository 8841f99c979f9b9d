use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::error;

use chirpy_api::{ApiError, AppState, AppStateInner, auth, chirps, webhooks};
use chirpy_types::api::{
    CreateChirpRequest, ListChirpsQuery, LoginRequest, SignupRequest, UpdateUserRequest,
    UpgradeEvent,
};

/// Maps core error kinds onto HTTP status codes.
pub struct HttpError(ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{}", self.0);
            "Something went wrong".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/healthz", get(healthz))
        .route("/api/users", post(signup).put(update_user))
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/revoke", post(revoke))
        .route("/api/chirps", post(create_chirp).get(list_chirps))
        .route("/api/chirps/{id}", get(get_chirp).delete(delete_chirp))
        .route("/api/polka/webhooks", post(polka_webhook))
        .with_state(state)
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Run a store-backed operation off the async runtime.
async fn run<F, T>(state: AppState, op: F) -> Result<T, HttpError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal("worker task failed".into())
        })?
        .map_err(HttpError)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let user = run(state, move |s| auth::signup(s, req)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let header = auth_header(&headers);
    let user = run(state, move |s| auth::update_user(s, header.as_deref(), req)).await?;
    Ok(Json(user))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let session = run(state, move |s| auth::login(s, req)).await?;
    Ok(Json(session))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let header = auth_header(&headers);
    let token = run(state, move |s| auth::refresh(s, header.as_deref())).await?;
    Ok(Json(token))
}

async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let header = auth_header(&headers);
    run(state, move |s| auth::revoke(s, header.as_deref())).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_chirp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateChirpRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let header = auth_header(&headers);
    let chirp = run(state, move |s| chirps::create_chirp(s, header.as_deref(), req)).await?;
    Ok((StatusCode::CREATED, Json(chirp)))
}

async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let list = run(state, move |s| chirps::list_chirps(s, query)).await?;
    Ok(Json(list))
}

async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, HttpError> {
    let chirp = run(state, move |s| chirps::get_chirp(s, id)).await?;
    Ok(Json(chirp))
}

async fn delete_chirp(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let header = auth_header(&headers);
    run(state, move |s| chirps::delete_chirp(s, header.as_deref(), id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<UpgradeEvent>,
) -> Result<impl IntoResponse, HttpError> {
    let header = auth_header(&headers);
    run(state, move |s| webhooks::handle_upgrade(s, header.as_deref(), event)).await?;
    Ok(StatusCode::NO_CONTENT)
}

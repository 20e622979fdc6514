use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, SignupRequest},
        session::{clear_session_cookie, session_cookie},
    },
    error::ApiError,
    state::AppState,
};

const MIN_PASSWORD_CHARS: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

fn bad_request(msg: &str) -> ApiError {
    ApiError::BadRequest(msg.to_string())
}

fn token_response(state: &AppState, status: StatusCode, token: String) -> impl IntoResponse {
    let cookie = session_cookie(&token, state.auth.session_ttl_secs());
    (status, [(header::SET_COOKIE, cookie)], Json(AuthResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        warn!("signup without email or password");
        return Err(bad_request("email and password are required"));
    }
    if let Some(confirm) = &payload.confirm_password {
        if *confirm != payload.password {
            return Err(bad_request("passwords do not match"));
        }
    }
    if payload.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(bad_request("password must be at least 8 characters"));
    }
    // A blank handle field means "pick one later".
    let handle = payload
        .handle
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());

    let token = state.auth.signup(email, &payload.password, handle).await?;
    info!("signup complete");
    Ok(token_response(&state, StatusCode::CREATED, token))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(bad_request("email and password are required"));
    }
    let token = state.auth.login(email, &payload.password).await?;
    Ok(token_response(&state, StatusCode::OK, token))
}

/// Tokens are stateless; logging out only drops the cookie.
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
}

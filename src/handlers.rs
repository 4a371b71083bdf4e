use crate::auth::AuthService;
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateUserRequest, HealthResponse, LoginRequest, LoginResponse, User, UserResponse,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
}

pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    state.db.ping().await?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        backend: state.db.backend(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    info!("Login attempt for login: {}", request.login);

    let user = match state
        .auth
        .authenticate_user(&request.login, &request.password)
        .await
    {
        Ok(user) => user,
        Err(err) => {
            warn!("Failed login for {}: {}", request.login, err);
            return Err(err);
        }
    };

    let (token, expires_at) = state.auth.generate_jwt_token(&user)?;
    info!("Successful login for user: {}", user.login);

    Ok(Json(LoginResponse { token, expires_at }))
}

pub async fn list_users(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserResponse>>> {
    authenticate_request(&headers, &state).await?;

    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    authenticate_request(&headers, &state).await?;

    let user = state
        .db
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    Ok(Json(user.into()))
}

pub async fn create_user(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let requester = authenticate_request(&headers, &state).await?;

    let user = state.auth.create_user(request).await?;
    info!("User {} created by {}", user.login, requester.login);

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn authenticate_request(headers: &HeaderMap, state: &AppState) -> AppResult<User> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| AppError::Auth("No valid authentication provided".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header".to_string()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) => state.auth.authenticate_jwt(token).await,
        None => Err(AppError::Auth("Invalid authorization header".to_string())),
    }
}

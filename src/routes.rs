use crate::handlers::{create_user, get_user, health_check, list_users, login, AppState};
use axum::{routing::get, routing::post, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:user_id", get(get_user))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

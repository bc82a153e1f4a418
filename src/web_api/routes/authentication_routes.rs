use std::sync::Arc;
use axum::{Router, routing::post};
use crate::{state::AppState, web_api::controllers::authentication_controller::AuthenticationController};

pub const ROUTER_PATH: &str = "/api/auth";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/register", ROUTER_PATH).as_str(), post(AuthenticationController::register))
        .route(format!("{}/login", ROUTER_PATH).as_str(), post(AuthenticationController::login))
        .route(format!("{}/logout", ROUTER_PATH).as_str(), post(AuthenticationController::logout))
        .with_state(app_state)
}

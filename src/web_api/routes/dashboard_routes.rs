use std::sync::Arc;
use axum::{Router, middleware, routing::get};
use crate::{auth::auth_middleware, state::AppState, web_api::controllers::dashboard_controller::DashboardController};

pub const ROUTER_PATH: &str = "/api";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/stats", ROUTER_PATH).as_str(), get(DashboardController::stats))
        .route(format!("{}/activity", ROUTER_PATH).as_str(), get(DashboardController::activity))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}

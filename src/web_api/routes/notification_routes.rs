use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post}};
use crate::{auth::auth_middleware, state::AppState, web_api::controllers::notification_controller::NotificationController};

pub const ROUTER_PATH: &str = "/api/notifications";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(NotificationController::list))
        .route(format!("{}/mark_read", ROUTER_PATH).as_str(), post(NotificationController::mark_read))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}

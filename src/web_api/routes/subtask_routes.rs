use std::sync::Arc;
use axum::{Router, middleware, routing::{put, delete}};
use crate::{auth::auth_middleware, state::AppState, web_api::controllers::subtask_controller::SubtaskController};

pub const ROUTER_PATH: &str = "/api/subtasks";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/:id/toggle", ROUTER_PATH).as_str(), put(SubtaskController::toggle))
        .route(format!("{}/:id", ROUTER_PATH).as_str(), delete(SubtaskController::delete))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}

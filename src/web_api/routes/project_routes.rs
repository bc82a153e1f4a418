use std::sync::Arc;
use axum::{Router, middleware, routing::get};
use crate::{auth::auth_middleware, state::AppState, web_api::controllers::project_controller::ProjectController};

pub const ROUTER_PATH: &str = "/api/projects";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(ProjectController::list).post(ProjectController::create))
        .route(
            format!("{}/:id", ROUTER_PATH).as_str(),
            get(ProjectController::get).put(ProjectController::update).delete(ProjectController::delete),
        )
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}

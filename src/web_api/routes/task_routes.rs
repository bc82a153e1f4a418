use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post, delete}};
use crate::{
    auth::auth_middleware,
    state::AppState,
    web_api::controllers::{
        dependency_controller::DependencyController, subtask_controller::SubtaskController,
        task_controller::TaskController, time_controller::TimeController,
    },
};

pub const ROUTER_PATH: &str = "/api/tasks";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(TaskController::list).post(TaskController::create))
        .route(format!("{}/recent", ROUTER_PATH).as_str(), get(TaskController::recent))
        .route(
            format!("{}/:id", ROUTER_PATH).as_str(),
            get(TaskController::get).put(TaskController::update).delete(TaskController::delete),
        )
        .route(
            format!("{}/:id/status", ROUTER_PATH).as_str(),
            axum::routing::patch(TaskController::set_status),
        )
        .route(
            format!("{}/:id/subtasks", ROUTER_PATH).as_str(),
            get(SubtaskController::list).post(SubtaskController::create),
        )
        .route(
            format!("{}/:id/time_entries", ROUTER_PATH).as_str(),
            get(TimeController::list).post(TimeController::log),
        )
        .route(format!("{}/:id/timer/start", ROUTER_PATH).as_str(), post(TimeController::start_timer))
        .route(format!("{}/:id/timer/stop", ROUTER_PATH).as_str(), post(TimeController::stop_timer))
        .route(format!("{}/:id/dependencies", ROUTER_PATH).as_str(), post(DependencyController::add))
        .route(
            format!("{}/:id/dependencies/:dependency_id", ROUTER_PATH).as_str(),
            delete(DependencyController::remove),
        )
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}

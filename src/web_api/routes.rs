pub mod authentication_routes;
pub mod dashboard_routes;
pub mod health_routes;
pub mod notification_routes;
pub mod project_routes;
pub mod subtask_routes;
pub mod task_routes;

use axum::Router;

use crate::state::SharedState;

pub fn map_routes(app_state: SharedState) -> Router {
    Router::new()
        .merge(authentication_routes::get_router(app_state.clone()))
        .merge(health_routes::get_router(app_state.clone()))
        .merge(task_routes::get_router(app_state.clone()))
        .merge(subtask_routes::get_router(app_state.clone()))
        .merge(project_routes::get_router(app_state.clone()))
        .merge(dashboard_routes::get_router(app_state.clone()))
        .merge(notification_routes::get_router(app_state))
}

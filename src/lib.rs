pub mod auth;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod notifications;
pub mod persist;
pub mod progress;
pub mod state;
pub mod world;

//---------------------------------------
pub mod web_api {
    pub mod routes;
    pub mod controllers;
    pub mod extract;
}

pub use web_api::routes::map_routes;
//---------------------------------------

//---------------------------------------
pub mod shared {
    pub mod dto;
}
//---------------------------------------

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use state::SharedState;

/// The whole HTTP surface: API routes, then static files for everything else.
pub fn app(state: SharedState) -> Router {
    let static_dir = ServeDir::new(&state.settings.static_dir).append_index_html_on_directories(true);

    map_routes(state)
        .fallback_service(static_dir)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    shared::dto::{activity_view::ActivityView, list_query::LimitQuery},
    state::SharedState,
    web_api::extract::ApiQuery,
};

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

pub struct DashboardController {}

impl DashboardController {
    pub async fn stats(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
        let stats = state.read()?.stats(Utc::now());
        Ok(Json(json!({ "success": true, "stats": stats })))
    }

    /// Newest first.
    pub async fn activity(
        State(state): State<SharedState>,
        ApiQuery(query): ApiQuery<LimitQuery>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        let activity: Vec<ActivityView> = world
            .recent_activity(query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))
            .into_iter()
            .map(|a| ActivityView::build(&world, a))
            .collect();
        Ok(Json(json!({ "success": true, "activity": activity })))
    }
}

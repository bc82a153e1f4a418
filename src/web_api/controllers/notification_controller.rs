use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::{
    auth::CurrentUser, error::ApiError, shared::dto::mark_read_request::MarkReadRequest,
    state::SharedState, web_api::extract::ApiJson,
};

pub struct NotificationController {}

impl NotificationController {
    pub async fn list(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
    ) -> Json<Value> {
        Json(json!({ "success": true, "notifications": state.notifications.list(user.id) }))
    }

    pub async fn mark_read(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiJson(body): ApiJson<MarkReadRequest>,
    ) -> Result<Json<Value>, ApiError> {
        let id = body.id.ok_or_else(|| ApiError::BadRequest("id required".into()))?;
        if !state.notifications.mark_read(user.id, id) {
            return Err(ApiError::NotFound("Notification not found"));
        }
        Ok(Json(json!({ "success": true })))
    }
}

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::ApiError, state::SharedState};

pub struct HealthController {}

impl HealthController {
    pub async fn get(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
        let revision = state.read()?.revision;
        Ok(Json(json!({
            "success": true,
            "status": "ok",
            "dev_mode": state.settings.dev_mode,
            "revision": revision,
        })))
    }
}

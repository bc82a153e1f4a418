use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateSubtaskRequest {
    #[serde(default)]
    pub title: String,
}

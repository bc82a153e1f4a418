use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DependencyRequest {
    #[serde(alias = "dependency_id")]
    pub depends_on: Uuid,
}

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub id: Option<u32>,
}

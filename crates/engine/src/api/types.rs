use serde::Deserialize;

// Chat stream endpoint
#[derive(Deserialize)]
pub struct ChatStreamParams {
    pub checkpoint_id: Option<String>,
}

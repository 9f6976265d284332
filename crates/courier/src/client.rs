use anyhow::Result;
use futures_util::StreamExt;
use rill_shared::events::ChatEvent;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Streams one turn, feeding each event to the handler as it arrives.
    /// Returns the checkpoint id the conversation runs under, so callers
    /// can pass it back on the next turn.
    pub async fn chat_stream(
        &self,
        message: &str,
        checkpoint_id: Option<&str>,
        mut event_handler: impl FnMut(ChatEvent),
    ) -> Result<Option<String>> {
        let mut url = format!(
            "{}/chat_stream/{}",
            self.base_url,
            urlencoding::encode(message)
        );
        if let Some(id) = checkpoint_id {
            url.push_str(&format!("?checkpoint_id={}", urlencoding::encode(id)));
        }

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Request failed: {}", response.status()));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        let mut assigned_id = checkpoint_id.map(|s| s.to_string());

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            buffer.extend_from_slice(&bytes);

            // Process complete lines
            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                let line = String::from_utf8_lossy(&line);

                // SSE format: "data: {json}\n"
                if let Some(data) = line.strip_prefix("data: ") {
                    let data = data.trim();
                    if data.is_empty() {
                        continue;
                    }

                    if let Ok(event) = serde_json::from_str::<ChatEvent>(data) {
                        if let ChatEvent::Checkpoint { checkpoint_id } = &event {
                            assigned_id = Some(checkpoint_id.clone());
                        }
                        event_handler(event);
                    }
                }
            }
        }

        Ok(assigned_id)
    }
}

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub groq_api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Config {
    /// Reads configuration from the environment (a `.env` file is loaded
    /// by `main` before this runs). Only the API key is mandatory.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: env_or("RILL_ADDR", "0.0.0.0:8080"),
            groq_api_key: std::env::var("GROQ_API_KEY")
                .context("GROQ_API_KEY environment variable not set")?,
            model: env_or("RILL_MODEL", "llama-3.1-8b-instant"),
            base_url: env_or("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

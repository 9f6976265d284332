mod client;
mod config;

use std::io::{self, Write};

use anyhow::Result;
use client::ApiClient;
use config::Config;
use rill_shared::events::ChatEvent;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e);
        }
    };

    let client = ApiClient::new(config.server_url.clone());

    println!("Connected to Rill at {}", config.server_url);
    println!("Type 'quit' to exit.\n");

    let mut checkpoint_id: Option<String> = None;

    loop {
        let input = wait_for_user_input()?;

        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        let result = client
            .chat_stream(&input, checkpoint_id.as_deref(), |event| match event {
                ChatEvent::Checkpoint { .. } => {}
                ChatEvent::Content { content } => {
                    print!("{content}");
                    let _ = io::stdout().flush();
                }
                ChatEvent::End => println!("\n"),
                ChatEvent::Error { message } => {
                    eprintln!("\nServer error: {message}");
                }
            })
            .await;

        match result {
            Ok(id) => checkpoint_id = id,
            Err(e) => {
                eprintln!("Failed to reach Rill at {}: {}", config.server_url, e);
                eprintln!("Is the Rill server running?");
            }
        }
    }

    Ok(())
}

fn wait_for_user_input() -> Result<String> {
    print!("You: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

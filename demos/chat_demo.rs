//! Inference walkthrough: lists installed models, then exercises buffered
//! and streamed generation, chat, and embeddings against a local server.
//! Demonstration driver, not a reusable component.

use std::io::Write;

use anyhow::Result;
use futures_util::StreamExt;
use promptstore::services::llm::{AiClient, ChatMessage, GenerateOptions, DEFAULT_BASE_URL};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let client = AiClient::new(DEFAULT_BASE_URL);

    let models = client.list_models().await?;
    anyhow::ensure!(!models.is_empty(), "no models available");
    let model = models[0].name.clone();
    println!("using model {model} ({} installed)", models.len());

    let answer = client
        .generate("Why is the sky blue?", &model, &GenerateOptions::default())
        .await;
    println!("\n--- buffered generate ---\n{answer}");

    println!("\n--- streamed generate ---");
    let mut stream = client
        .generate_stream(
            "Name three colors.",
            &model,
            &GenerateOptions::with_system("Answer with a comma-separated list."),
        )
        .await;
    while let Some(fragment) = stream.next().await {
        print!("{fragment}");
        std::io::stdout().flush()?;
    }
    println!();

    let reply = client
        .chat(
            &[
                ChatMessage::system("You are terse."),
                ChatMessage::user("What is the capital of France?"),
            ],
            &model,
        )
        .await;
    println!("\n--- chat ---\n{reply}");

    let embedding = client.embeddings("The sky is blue.", None).await?;
    println!("\n--- embeddings ---\n{} dimensions", embedding.len());

    client.close().await;
    Ok(())
}

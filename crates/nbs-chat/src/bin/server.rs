//! NBS Chat server binary
//!
//! Run with: cargo run -p nbs-chat --bin nbs-chat-server

use nbs_chat::{config::ChatConfig, logging, server::ChatServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ChatConfig::load()?;
    logging::init(&config);

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         NBS Chat                          ║
║        Questions about Nigerian Bureau of Statistics      ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Index: {}", config.index.persist_dir.display());
    tracing::info!("  - Log file: {}", config.logging.file.display());
    if config.server.debug {
        tracing::debug!("Debug mode enabled");
    }

    let server = ChatServer::new(config).await?;

    println!("\nServer starting...");
    println!("  Chat:    http://{}/", server.address());
    println!("  Swagger: http://{}/swagger", server.address());
    println!("  Health:  http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /chat?username=<name>    - Ask a question");
    println!("  GET  /history?username=<name> - Conversation so far");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}

pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod client;

use cli::{ Args, Command, ServeArgs };
use llm::LlmConfig;
use llm::chat::new_client as new_chat_client;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve) => serve_relay(serve).await,
        Command::Chat(chat) => client::terminal::run(&chat).await,
    }
}

async fn serve_relay(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Provider Base URL: {}", args.openai_base_url.as_deref().unwrap_or("default"));
    info!("Provider Model: {}", llm::VISION_MODEL);
    info!("Max Output Tokens: {}", llm::MAX_OUTPUT_TOKENS);
    info!("Max Body Bytes: {}", args.max_body_bytes);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let config = LlmConfig::openai(args.openai_api_key.clone(), args.openai_base_url.clone());
    let provider = new_chat_client(&config)?;
    let server = Server::new(provider, args);
    server.run().await?;

    Ok(())
}

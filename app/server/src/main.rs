use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cityline::agent::{Agent, TavilySearchTool, ToolLoopConfig, ToolRegistry};
use cityline::llm::OpenAiProvider;
use cityline::prompts::STATS_SYSTEM_PROMPT;
use cityline::AppConfig;

mod page;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let provider = Arc::new(OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )?);

    let mut registry = ToolRegistry::new();
    match &config.tavily_api_key {
        Some(key) => registry.register(Arc::new(TavilySearchTool::new(key.clone())?)),
        None => tracing::warn!("TAVILY_API_KEY not set, web search tool disabled"),
    }

    // Agent state is assembled once here and never mutated afterwards.
    let loop_config = ToolLoopConfig {
        max_iterations: config.max_tool_iterations,
        ..Default::default()
    };
    let agent = Agent::new(provider, registry, STATS_SYSTEM_PROMPT, loop_config);

    let state = Arc::new(routes::AppState { agent });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "cityline server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

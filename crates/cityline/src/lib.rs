pub mod agent;
pub mod chat;
pub mod config;
pub mod extract;
pub mod history;
pub mod llm;
pub mod prompts;

// Re-export primary types for convenience
pub use agent::Agent;
pub use chat::{run_turn, ChatTurn};
pub use config::AppConfig;
pub use extract::{extract_city_tables, CityTables, YearCount};
pub use history::StoredMessage;

// Re-export common types
pub use anyhow::{Error, Result};

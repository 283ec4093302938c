//! One chat turn: agent call → history update → table extraction
//!
//! This is the whole per-submission pipeline, independent of the HTTP layer:
//! `(input, serialized history) -> (display text, new serialized history,
//! tables)`. It runs sequentially with no shared mutable state; the agent is
//! the only collaborator and its failures propagate to the caller.

use anyhow::Result;

use crate::agent::Agent;
use crate::extract::{extract_city_tables, CityTables};
use crate::history::{self, StoredMessage};

/// Result of one user submission.
#[derive(Debug)]
pub struct ChatTurn {
    /// Text shown in the response area.
    pub display_text: String,
    /// Updated history in its transportable string form.
    pub history: String,
    /// Per-city tables extracted from the reply (possibly empty).
    pub tables: CityTables,
}

/// Process one user submission.
pub async fn run_turn(agent: &Agent, input: &str, serialized_history: &str) -> Result<ChatTurn> {
    let mut chat_history = history::decode(serialized_history)?;

    let reply = agent.ask(input, &chat_history).await?;

    chat_history.push(StoredMessage::user(input));
    chat_history.push(StoredMessage::assistant(&reply));
    let history = history::encode(&chat_history)?;

    let tables = extract_city_tables(&reply);
    tracing::debug!(cities = tables.len(), "Extracted tables from reply");

    Ok(ChatTurn {
        display_text: format!("Assistant: {}", reply),
        history,
        tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ToolLoopConfig, ToolRegistry};
    use crate::llm::{
        ChatMessage, ChatResponse, GenerationConfig, LlmProvider, ToolSchema,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedProvider {
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSchema],
            _config: &GenerationConfig,
        ) -> Result<ChatResponse> {
            Ok(ChatResponse::Content(self.reply.clone()))
        }
    }

    fn agent_with_reply(reply: &str) -> Agent {
        Agent::new(
            Arc::new(FixedProvider {
                reply: reply.to_string(),
            }),
            ToolRegistry::new(),
            "fixed format",
            ToolLoopConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_turn_appends_history_and_extracts_tables() {
        let agent = agent_with_reply("City: X\nYear: 2020, Murder Count: 5");

        let turn = run_turn(&agent, "homicides in X?", "").await.unwrap();

        assert_eq!(
            turn.display_text,
            "Assistant: City: X\nYear: 2020, Murder Count: 5"
        );
        assert_eq!(turn.tables.len(), 1);
        assert_eq!(turn.tables["X"][0].year, "2020");

        let stored = history::decode(&turn.history).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content, "homicides in X?");
        assert!(stored[1].content.contains("Murder Count: 5"));
    }

    #[tokio::test]
    async fn test_turn_carries_prior_history_forward() {
        let agent = agent_with_reply("City: Y\nYear: 2021, Murder Count: 9");

        let first = run_turn(&agent, "first question", "").await.unwrap();
        let second = run_turn(&agent, "second question", &first.history)
            .await
            .unwrap();

        let stored = history::decode(&second.history).unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[2].content, "second question");
    }

    #[tokio::test]
    async fn test_unstructured_reply_yields_no_tables() {
        let agent = agent_with_reply("I could not find any statistics.");

        let turn = run_turn(&agent, "homicides on the moon?", "").await.unwrap();
        assert!(turn.tables.is_empty());
        assert!(turn.display_text.starts_with("Assistant: "));
    }

    #[tokio::test]
    async fn test_bad_history_is_an_error() {
        let agent = agent_with_reply("irrelevant");
        assert!(run_turn(&agent, "q", "corrupt blob").await.is_err());
    }
}

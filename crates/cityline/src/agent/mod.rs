//! The long-lived statistics agent
//!
//! Built once at process start and shared read-only across requests; each
//! `ask` runs one bounded tool-calling conversation against the provider.

use anyhow::Result;
use std::sync::Arc;

pub mod tool_loop;
pub mod tools;
pub mod web_search;

pub use tool_loop::{run_tool_loop, ToolInvocation, ToolLoopConfig, ToolLoopResult};
pub use tools::{AgentTool, ToolOutcome, ToolRegistry};
pub use web_search::TavilySearchTool;

use crate::history::{self, StoredMessage};
use crate::llm::{ChatMessage, GenerationConfig, LlmProvider};

pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    system_prompt: String,
    generation: GenerationConfig,
    loop_config: ToolLoopConfig,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: ToolRegistry,
        system_prompt: impl Into<String>,
        loop_config: ToolLoopConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            system_prompt: system_prompt.into(),
            generation: GenerationConfig::default(),
            loop_config,
        }
    }

    /// Ask the agent one question with prior conversation context.
    ///
    /// Returns the final text reply. Provider failures propagate unchanged to
    /// the caller; there is no retry here.
    pub async fn ask(&self, input: &str, chat_history: &[StoredMessage]) -> Result<String> {
        let request_id = uuid::Uuid::new_v4();
        tracing::info!(
            %request_id,
            history_len = chat_history.len(),
            input_len = input.len(),
            "Agent request"
        );

        let mut messages = Vec::with_capacity(chat_history.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(history::to_chat_messages(chat_history));
        messages.push(ChatMessage::user(input));

        let schemas = self.registry.schemas();
        let result = run_tool_loop(
            self.provider.as_ref(),
            &self.registry,
            &mut messages,
            &schemas,
            &self.generation,
            &self.loop_config,
        )
        .await?;

        tracing::info!(
            %request_id,
            iterations = result.iterations,
            tool_calls = result.tool_invocations.len(),
            reply_len = result.content.len(),
            "Agent reply"
        );

        Ok(result.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, ChatRole, ToolSchema};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider that records the messages it was sent and answers with a
    /// fixed reply.
    struct RecordingProvider {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSchema],
            _config: &GenerationConfig,
        ) -> Result<ChatResponse> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok(ChatResponse::Content(self.reply.clone()))
        }
    }

    #[tokio::test]
    async fn test_ask_builds_system_history_user_order() {
        let provider = Arc::new(RecordingProvider {
            reply: "City: X\nYear: 2020, Murder Count: 5".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let agent = Agent::new(
            provider.clone(),
            ToolRegistry::new(),
            "answer in the fixed format",
            ToolLoopConfig::default(),
        );

        let history = vec![
            StoredMessage::user("earlier question"),
            StoredMessage::assistant("earlier answer"),
        ];
        let reply = agent.ask("homicides in X in 2020?", &history).await.unwrap();
        assert!(reply.contains("Murder Count: 5"));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(matches!(seen[0].role, ChatRole::System));
        assert!(matches!(seen[1].role, ChatRole::User));
        assert!(matches!(seen[2].role, ChatRole::Assistant));
        assert!(matches!(seen[3].role, ChatRole::User));
        assert_eq!(seen[3].content.as_deref(), Some("homicides in X in 2020?"));
    }
}

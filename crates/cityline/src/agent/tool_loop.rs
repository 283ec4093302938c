//! Tool-calling loop
//!
//! Sends messages + tool schemas to the LLM, executes any requested tool
//! calls, feeds results back, and loops until the LLM produces a final text
//! response.

use anyhow::{anyhow, Result};

use super::tools::ToolRegistry;
use crate::llm::{ChatMessage, ChatResponse, GenerationConfig, LlmProvider, ToolCall, ToolSchema};

/// Configuration for the tool-calling loop.
#[derive(Debug, Clone)]
pub struct ToolLoopConfig {
    /// Maximum number of LLM round-trips (tool call → result → re-send).
    pub max_iterations: usize,
    /// Per-tool execution timeout in seconds.
    pub tool_timeout_secs: u64,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tool_timeout_secs: 30,
        }
    }
}

/// A single tool invocation record for observability.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub result: String,
    pub success: bool,
    pub duration_ms: u64,
}

/// The final output of a tool-calling loop run.
#[derive(Debug, Clone)]
pub struct ToolLoopResult {
    /// The LLM's final text response.
    pub content: String,
    /// All tool invocations that occurred during the loop.
    pub tool_invocations: Vec<ToolInvocation>,
    /// Total number of LLM round-trips.
    pub iterations: usize,
}

/// Run the tool-calling loop.
///
/// 1. Send `messages` + `tool_schemas` to the LLM.
/// 2. If the LLM returns `ToolCalls` → execute each tool → append results → loop.
/// 3. If the LLM returns `Content` → done.
pub async fn run_tool_loop(
    llm: &dyn LlmProvider,
    tool_registry: &ToolRegistry,
    messages: &mut Vec<ChatMessage>,
    tool_schemas: &[ToolSchema],
    generation: &GenerationConfig,
    config: &ToolLoopConfig,
) -> Result<ToolLoopResult> {
    let mut invocations = Vec::new();
    let mut iterations = 0;

    loop {
        iterations += 1;
        if iterations > config.max_iterations {
            tracing::warn!(
                max = config.max_iterations,
                "Tool loop hit max iterations, forcing text response"
            );
            // Ask the LLM to respond without tools
            let response = llm.chat(messages, &[], generation).await?;
            let content = match response {
                ChatResponse::Content(text) => text,
                ChatResponse::ToolCalls(_) => {
                    "I was unable to complete the request within the allowed number of tool calls."
                        .to_string()
                }
            };
            return Ok(ToolLoopResult {
                content,
                tool_invocations: invocations,
                iterations,
            });
        }

        tracing::debug!(iteration = iterations, "Tool loop: sending to LLM");

        let response = llm.chat(messages, tool_schemas, generation).await?;

        match response {
            ChatResponse::Content(text) => {
                tracing::debug!(iteration = iterations, "Tool loop: LLM returned content, done");
                return Ok(ToolLoopResult {
                    content: text,
                    tool_invocations: invocations,
                    iterations,
                });
            }
            ChatResponse::ToolCalls(tool_calls) => {
                tracing::info!(
                    iteration = iterations,
                    count = tool_calls.len(),
                    tools = ?tool_calls.iter().map(|tc| &tc.name).collect::<Vec<_>>(),
                    "Tool loop: LLM requested tool calls"
                );

                // Append the assistant's tool call message to history
                messages.push(ChatMessage::assistant_tool_calls(tool_calls.clone()));

                for tc in &tool_calls {
                    let start = std::time::Instant::now();
                    let result =
                        execute_tool_call(tool_registry, tc, config.tool_timeout_secs).await;
                    let duration_ms = start.elapsed().as_millis() as u64;

                    let (output, success) = match result {
                        Ok(outcome) => (outcome.output, outcome.success),
                        Err(e) => (format!("Tool execution error: {}", e), false),
                    };

                    invocations.push(ToolInvocation {
                        tool_name: tc.name.clone(),
                        arguments: serde_json::from_str(&tc.arguments)
                            .unwrap_or(serde_json::json!({})),
                        result: output.clone(),
                        success,
                        duration_ms,
                    });

                    messages.push(ChatMessage::tool_result(&tc.id, &tc.name, &output));
                }
            }
        }
    }
}

/// Execute a single tool call against the registry.
async fn execute_tool_call(
    registry: &ToolRegistry,
    tool_call: &ToolCall,
    timeout_secs: u64,
) -> Result<super::tools::ToolOutcome> {
    let tool = registry
        .get(&tool_call.name)
        .ok_or_else(|| anyhow!("Unknown tool: {}", tool_call.name))?;

    let arguments: serde_json::Value =
        serde_json::from_str(&tool_call.arguments).unwrap_or(serde_json::json!({}));

    let future = tool.execute(arguments);

    match tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), future).await {
        Ok(result) => result,
        Err(_) => Ok(super::tools::ToolOutcome::failure(format!(
            "Tool '{}' timed out after {}s",
            tool_call.name, timeout_secs
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::{AgentTool, ToolOutcome};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Provider that plays back a scripted sequence of responses.
    struct ScriptedProvider {
        responses: Mutex<Vec<ChatResponse>>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<ChatResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSchema],
            _config: &GenerationConfig,
        ) -> Result<ChatResponse> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(ChatResponse::Content("exhausted".to_string())))
        }
    }

    struct FixedTool {
        output: String,
    }

    #[async_trait]
    impl AgentTool for FixedTool {
        fn name(&self) -> &str {
            "lookup"
        }

        fn description(&self) -> &str {
            "Return a fixed result"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome> {
            Ok(ToolOutcome::ok(self.output.clone()))
        }
    }

    struct SleepyTool;

    #[async_trait]
    impl AgentTool for SleepyTool {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome> {
            tokio::time::sleep(std::time::Duration::from_secs(600)).await;
            Ok(ToolOutcome::ok("too late"))
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: format!("call_{}", name),
            name: name.to_string(),
            arguments: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_immediate_content_ends_loop() {
        let provider = ScriptedProvider::new(vec![ChatResponse::Content("done".to_string())]);
        let registry = ToolRegistry::new();
        let mut messages = vec![ChatMessage::user("hi")];

        let result = run_tool_loop(
            &provider,
            &registry,
            &mut messages,
            &[],
            &GenerationConfig::default(),
            &ToolLoopConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.content, "done");
        assert_eq!(result.iterations, 1);
        assert!(result.tool_invocations.is_empty());
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_tool_call_then_content() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::ToolCalls(vec![call("lookup")]),
            ChatResponse::Content("answer".to_string()),
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FixedTool {
            output: "42 homicides".to_string(),
        }));
        let mut messages = vec![ChatMessage::user("how many?")];
        let schemas = registry.schemas();

        let result = run_tool_loop(
            &provider,
            &registry,
            &mut messages,
            &schemas,
            &GenerationConfig::default(),
            &ToolLoopConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.content, "answer");
        assert_eq!(result.iterations, 2);
        assert_eq!(result.tool_invocations.len(), 1);
        assert!(result.tool_invocations[0].success);
        assert_eq!(result.tool_invocations[0].result, "42 homicides");

        // user + assistant tool-call + tool result
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[2].role, crate::llm::ChatRole::Tool));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failure_text() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::ToolCalls(vec![call("missing")]),
            ChatResponse::Content("recovered".to_string()),
        ]);
        let registry = ToolRegistry::new();
        let mut messages = vec![ChatMessage::user("hi")];

        let result = run_tool_loop(
            &provider,
            &registry,
            &mut messages,
            &[],
            &GenerationConfig::default(),
            &ToolLoopConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.content, "recovered");
        assert!(!result.tool_invocations[0].success);
        assert!(result.tool_invocations[0].result.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_max_iterations_forces_text() {
        // The model keeps asking for tools; the loop must cut it off.
        let provider = ScriptedProvider::new(vec![
            ChatResponse::ToolCalls(vec![call("lookup")]),
            ChatResponse::ToolCalls(vec![call("lookup")]),
            ChatResponse::Content("forced".to_string()),
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FixedTool {
            output: "partial".to_string(),
        }));
        let mut messages = vec![ChatMessage::user("hi")];
        let schemas = registry.schemas();

        let config = ToolLoopConfig {
            max_iterations: 2,
            ..Default::default()
        };
        let result = run_tool_loop(
            &provider,
            &registry,
            &mut messages,
            &schemas,
            &GenerationConfig::default(),
            &config,
        )
        .await
        .unwrap();

        assert_eq!(result.content, "forced");
        assert_eq!(result.iterations, 3);
        assert_eq!(result.tool_invocations.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_timeout_becomes_failure_text() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::ToolCalls(vec![call("sleepy")]),
            ChatResponse::Content("moved on".to_string()),
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SleepyTool));
        let mut messages = vec![ChatMessage::user("hi")];
        let schemas = registry.schemas();

        let config = ToolLoopConfig {
            tool_timeout_secs: 0,
            ..Default::default()
        };
        let result = run_tool_loop(
            &provider,
            &registry,
            &mut messages,
            &schemas,
            &GenerationConfig::default(),
            &config,
        )
        .await
        .unwrap();

        assert_eq!(result.content, "moved on");
        assert!(!result.tool_invocations[0].success);
        assert!(result.tool_invocations[0].result.contains("timed out"));
    }
}

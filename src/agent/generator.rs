//! Multi-round answer generation.
//!
//! Drives the tool-calling loop: call the model, execute any requested
//! tools, feed the results back, and repeat until the model answers in
//! prose or the round budget runs out. The loop is total over its inputs:
//! service failures, tool failures, and empty model output all collapse
//! into a descriptive answer string rather than an error.

use super::conversation::append_tool_round;
use super::executor::ToolExecutor;
use super::registry::Source;
use crate::llm::{
    ChatModel, ContentBlock, Message, ModelRequest, RoundOutcome, StopReason, ToolSchema,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// System prompt for answering questions about indexed course materials.
const SYSTEM_PROMPT: &str = "\
You are an AI assistant specialized in course materials and educational content, \
with access to tools for course information.

Tool Usage:
- **search_course_content**: Use for questions about specific course content or detailed educational materials
- **get_course_outline**: Use for questions about a course's structure, lesson list, or overview
- You may use tools across multiple rounds to refine or broaden your answer
- Synthesize tool results into accurate, fact-based responses
- If a tool yields no results, state this clearly without offering alternatives

Response requirements:
- **Brief and focused**: Get to the point quickly
- **Educational**: Maintain instructional value
- **No meta-commentary**: Do not mention the search process or tool usage in your answer

For general knowledge questions, answer directly without using tools.";

/// Returned when the model produced no usable answer text.
const FALLBACK_ANSWER: &str =
    "I wasn't able to generate a proper response. Please try rephrasing your question.";

/// Returned when the model requests tools but no executor was provided.
const NO_EXECUTOR_ANSWER: &str =
    "I cannot execute tools without a tool executor. Please try rephrasing your question.";

/// The finished product of one exchange.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Answer text. Always present, even when generation degraded.
    pub text: String,
    /// Citations gathered from tool executions, in execution order.
    pub sources: Vec<Source>,
    /// Number of model rounds consumed.
    pub rounds: usize,
    /// Number of tool invocations performed.
    pub tool_calls: usize,
}

/// Runs the multi-round generation loop against a [`ChatModel`].
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    model_name: String,
    max_tokens: u32,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>, model_name: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            max_tokens,
        }
    }

    /// Generate an answer for `query`, invoking tools as the model requests
    /// them, up to `max_rounds` model calls.
    ///
    /// Tools stay on offer every round; the budget is enforced here, not by
    /// withholding schemas. Tool requests made in the final round are still
    /// executed, but no further model call is spent on their results.
    /// Cancellation is honored between rounds and never interrupts an
    /// in-flight execution.
    pub async fn generate_answer(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &[ToolSchema],
        executor: Option<&ToolExecutor>,
        max_rounds: usize,
        cancel: &CancellationToken,
    ) -> Answer {
        let max_rounds = max_rounds.max(1);
        let system = build_system(history);
        let mut messages = vec![Message::user(query)];
        let mut sources = Vec::new();
        let mut tool_calls = 0usize;
        let mut round_num = 1usize;

        loop {
            let outcome = self
                .run_round(&system, &messages, tools, round_num, max_rounds)
                .await;

            let requests = outcome.tool_requests();
            if outcome.stop_reason != StopReason::ToolRequested || requests.is_empty() {
                let text = outcome
                    .final_text()
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                return self.finish(text, sources, round_num, tool_calls);
            }

            let Some(executor) = executor else {
                warn!("Model requested tools but no executor is available");
                return self.finish(
                    NO_EXECUTOR_ANSWER.to_string(),
                    sources,
                    round_num,
                    tool_calls,
                );
            };

            let mut results = Vec::with_capacity(requests.len());
            for request in &requests {
                let output = executor.execute(&request.name, &request.input).await;
                sources.extend(output.sources);
                results.push(ContentBlock::ToolResult {
                    tool_use_id: request.id.clone(),
                    content: output.content,
                });
                tool_calls += 1;
            }

            if round_num >= max_rounds || cancel.is_cancelled() {
                if cancel.is_cancelled() {
                    info!(round = round_num, "Exchange cancelled after tool execution");
                }
                let text = outcome
                    .final_text()
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                return self.finish(text, sources, round_num, tool_calls);
            }

            messages = append_tool_round(&messages, outcome.content, results);
            round_num += 1;
        }
    }

    async fn run_round(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSchema],
        round_num: usize,
        max_rounds: usize,
    ) -> RoundOutcome {
        let request = ModelRequest {
            model: self.model_name.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system: annotate_round(system, round_num, max_rounds),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        };

        debug!(round = round_num, max_rounds, "Calling model");

        match self.model.complete(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(round = round_num, error = %e, "Model call failed");
                RoundOutcome::from_text(format!("API call failed: {}", e))
            }
        }
    }

    fn finish(
        &self,
        text: String,
        sources: Vec<Source>,
        rounds: usize,
        tool_calls: usize,
    ) -> Answer {
        info!(rounds, tool_calls, "Exchange complete");
        Answer {
            text,
            sources,
            rounds,
            tool_calls,
        }
    }
}

fn build_system(history: Option<&str>) -> String {
    match history {
        Some(h) if !h.is_empty() => {
            format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, h)
        }
        _ => SYSTEM_PROMPT.to_string(),
    }
}

/// Tell the model where it stands in the round budget. Single-round
/// exchanges get no annotation; the budget is invisible when there is no
/// second round to plan for.
fn annotate_round(system: &str, round_num: usize, max_rounds: usize) -> String {
    if max_rounds <= 1 {
        return system.to_string();
    }
    let mut annotated = format!(
        "{}\n\nCURRENT CONTEXT: Round {} of {} maximum tool calling rounds.",
        system, round_num, max_rounds
    );
    if round_num == max_rounds {
        annotated.push_str(" This is your final round - provide complete answer.");
    }
    annotated
}

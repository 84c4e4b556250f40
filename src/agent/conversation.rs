//! Message assembly across tool rounds.

use crate::llm::{ContentBlock, Message};

/// Extend a message sequence with one completed tool round: the assistant's
/// raw tool-request content, followed by a user-role turn carrying the
/// ordered tool results.
///
/// Returns a new sequence; the caller's original is never mutated, so
/// callers may keep referencing pre-round state.
pub fn append_tool_round(
    messages: &[Message],
    assistant_content: Vec<ContentBlock>,
    tool_results: Vec<ContentBlock>,
) -> Vec<Message> {
    let mut next = messages.to_vec();
    next.push(Message::assistant_blocks(assistant_content));
    next.push(Message::tool_results(tool_results));
    next
}

//! Tool-driven answer generation.
//!
//! The pieces here cooperate to turn a question into an answer: the
//! [`AnswerGenerator`] drives model rounds, the [`ToolRegistry`] and
//! [`ToolExecutor`] service the model's tool requests, and the course
//! tools do the actual retrieval.

mod conversation;
mod executor;
mod generator;
mod registry;
mod tools;

pub use conversation::append_tool_round;
pub use executor::ToolExecutor;
pub use generator::{Answer, AnswerGenerator};
pub use registry::{CourseTool, Source, ToolOutput, ToolRegistry};
pub use tools::{CourseOutlineTool, CourseSearchTool};

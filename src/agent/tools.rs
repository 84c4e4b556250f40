//! Course retrieval tools offered to the model.

use super::registry::{CourseTool, Source, ToolOutput};
use crate::embedding::Embedder;
use crate::error::{CorsoError, Result};
use crate::llm::ToolSchema;
use crate::vector_store::VectorStore;
use async_trait::async_trait;
use std::sync::Arc;

fn required_str<'a>(input: &'a serde_json::Value, field: &str) -> Result<&'a str> {
    input[field]
        .as_str()
        .ok_or_else(|| CorsoError::InvalidInput(format!("missing required field '{}'", field)))
}

/// Semantic search over indexed course content, optionally scoped to one
/// course and/or one lesson.
pub struct CourseSearchTool {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseSearchTool {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        max_results: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            max_results,
        }
    }
}

#[async_trait]
impl CourseTool for CourseSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_course_content".to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, input: &serde_json::Value) -> Result<ToolOutput> {
        let query = required_str(input, "query")?;
        let course_name = input["course_name"].as_str();
        let lesson_number = input["lesson_number"].as_u64().map(|n| n as u32);

        // Resolve partial course names before searching so the filter is exact.
        let course_title = match course_name {
            Some(name) => match self.store.resolve_course_name(name)? {
                Some(title) => Some(title),
                None => {
                    return Ok(ToolOutput::text(format!(
                        "No course found matching '{}'.",
                        name
                    )))
                }
            },
            None => None,
        };

        // Search failures go back to the model as the result string, so it
        // can tell the user what went wrong instead of the round aborting.
        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => return Ok(ToolOutput::text(e.to_string())),
        };
        let results = match self.store.search(
            &query_embedding,
            self.max_results,
            course_title.as_deref(),
            lesson_number,
        ) {
            Ok(results) => results,
            Err(e) => return Ok(ToolOutput::text(e.to_string())),
        };

        if results.is_empty() {
            let mut message = String::from("No relevant content found");
            if let Some(title) = &course_title {
                message.push_str(&format!(" in course '{}'", title));
            }
            if let Some(number) = lesson_number {
                message.push_str(&format!(" in lesson {}", number));
            }
            message.push('.');
            return Ok(ToolOutput::text(message));
        }

        let mut formatted = Vec::with_capacity(results.len());
        let mut sources = Vec::with_capacity(results.len());

        for result in &results {
            let header = match result.lesson_number {
                Some(n) => format!("[{} - Lesson {}]", result.course_title, n),
                None => format!("[{}]", result.course_title),
            };
            formatted.push(format!("{}\n{}", header, result.content));

            let (text, link) = match result.lesson_number {
                Some(n) => (
                    format!("{} - Lesson {}", result.course_title, n),
                    self.store.get_lesson_link(&result.course_title, n)?,
                ),
                None => (
                    result.course_title.clone(),
                    self.store
                        .get_course(&result.course_title)?
                        .and_then(|c| c.link),
                ),
            };
            sources.push(Source { text, link });
        }

        Ok(ToolOutput {
            content: formatted.join("\n\n"),
            sources,
        })
    }
}

/// Course structure lookup: title, link, and the full lesson list.
pub struct CourseOutlineTool {
    store: Arc<dyn VectorStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CourseTool for CourseOutlineTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_course_outline".to_string(),
            description: "Get a course's title, link, and complete lesson list".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, input: &serde_json::Value) -> Result<ToolOutput> {
        let name = required_str(input, "course_name")?;

        let Some(title) = self.store.resolve_course_name(name)? else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'.",
                name
            )));
        };
        let course = self
            .store
            .get_course(&title)?
            .ok_or_else(|| CorsoError::CourseNotFound(title.clone()))?;

        let mut lines = vec![format!("Course: {}", course.title)];
        if let Some(link) = &course.link {
            lines.push(format!("Link: {}", link));
        }
        lines.push(format!("Lessons ({}):", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("{}. {}", lesson.number, lesson.title));
        }

        Ok(ToolOutput {
            content: lines.join("\n"),
            sources: vec![Source {
                text: course.title.clone(),
                link: course.link.clone(),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{Course, CourseChunk, Lesson, MemoryVectorStore};

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn seeded_store() -> Arc<MemoryVectorStore> {
        let store = MemoryVectorStore::new();
        store
            .add_course(&Course {
                title: "MCP Fundamentals".to_string(),
                link: Some("https://example.com/mcp".to_string()),
                instructor: Some("Sam".to_string()),
                lessons: vec![
                    Lesson {
                        number: 1,
                        title: "Introduction".to_string(),
                        link: Some("https://example.com/mcp/1".to_string()),
                    },
                    Lesson {
                        number: 3,
                        title: "Servers".to_string(),
                        link: Some("https://example.com/mcp/3".to_string()),
                    },
                ],
            })
            .unwrap();
        store
            .add_chunks(&[
                CourseChunk {
                    course_title: "MCP Fundamentals".to_string(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                    content: "MCP is a protocol for tool use.".to_string(),
                    embedding: vec![1.0, 0.0],
                },
                CourseChunk {
                    course_title: "MCP Fundamentals".to_string(),
                    lesson_number: Some(3),
                    chunk_index: 1,
                    content: "Servers expose tools and resources.".to_string(),
                    embedding: vec![0.8, 0.2],
                },
            ])
            .unwrap();
        Arc::new(store)
    }

    fn search_tool(store: Arc<MemoryVectorStore>) -> CourseSearchTool {
        CourseSearchTool::new(store, Arc::new(StubEmbedder), 5)
    }

    #[tokio::test]
    async fn test_search_formats_headers_and_sources() {
        let tool = search_tool(seeded_store());

        let output = tool
            .execute(&serde_json::json!({"query": "what is MCP"}))
            .await
            .unwrap();

        assert!(output
            .content
            .starts_with("[MCP Fundamentals - Lesson 1]\nMCP is a protocol for tool use."));
        assert!(output.content.contains("\n\n[MCP Fundamentals - Lesson 3]"));

        assert_eq!(output.sources[0].text, "MCP Fundamentals - Lesson 1");
        assert_eq!(
            output.sources[0].link.as_deref(),
            Some("https://example.com/mcp/1")
        );
    }

    #[tokio::test]
    async fn test_search_with_partial_course_and_lesson_filter() {
        let tool = search_tool(seeded_store());

        let output = tool
            .execute(&serde_json::json!({
                "query": "servers",
                "course_name": "mcp",
                "lesson_number": 3
            }))
            .await
            .unwrap();

        assert!(output.content.contains("[MCP Fundamentals - Lesson 3]"));
        assert!(!output.content.contains("Lesson 1"));
    }

    #[tokio::test]
    async fn test_search_unknown_course() {
        let tool = search_tool(seeded_store());

        let output = tool
            .execute(&serde_json::json!({"query": "x", "course_name": "Haskell"}))
            .await
            .unwrap();

        assert_eq!(output.content, "No course found matching 'Haskell'.");
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_results_message_includes_filters() {
        let tool = search_tool(seeded_store());

        let output = tool
            .execute(&serde_json::json!({
                "query": "x",
                "course_name": "MCP Fundamentals",
                "lesson_number": 9
            }))
            .await
            .unwrap();

        assert_eq!(
            output.content,
            "No relevant content found in course 'MCP Fundamentals' in lesson 9."
        );
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(CorsoError::Embedding("service unavailable".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(CorsoError::Embedding("service unavailable".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_search_failure_becomes_result_string() {
        let tool = CourseSearchTool::new(seeded_store(), Arc::new(FailingEmbedder), 5);

        let output = tool
            .execute(&serde_json::json!({"query": "what is MCP"}))
            .await
            .unwrap();

        assert_eq!(
            output.content,
            "Embedding generation failed: service unavailable"
        );
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_search_missing_query_is_input_error() {
        let tool = search_tool(seeded_store());
        let err = tool.execute(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, CorsoError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_outline_lists_lessons() {
        let tool = CourseOutlineTool::new(seeded_store());

        let output = tool
            .execute(&serde_json::json!({"course_name": "mcp"}))
            .await
            .unwrap();

        assert_eq!(
            output.content,
            "Course: MCP Fundamentals\n\
             Link: https://example.com/mcp\n\
             Lessons (2):\n\
             1. Introduction\n\
             3. Servers"
        );
        assert_eq!(output.sources.len(), 1);
        assert_eq!(output.sources[0].text, "MCP Fundamentals");
        assert_eq!(
            output.sources[0].link.as_deref(),
            Some("https://example.com/mcp")
        );
    }

    #[tokio::test]
    async fn test_outline_unknown_course() {
        let tool = CourseOutlineTool::new(seeded_store());

        let output = tool
            .execute(&serde_json::json!({"course_name": "nope"}))
            .await
            .unwrap();

        assert_eq!(output.content, "No course found matching 'nope'.");
    }
}

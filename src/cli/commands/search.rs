//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course: Option<String>,
    lesson: Option<u32>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;

    let spinner = Output::spinner("Searching...");
    let results = rag.search(query, limit, course.as_deref(), lesson).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) if results.is_empty() => {
            Output::info("No matching content found.");
        }
        Ok(results) => {
            for result in &results {
                Output::search_result(
                    &result.course_title,
                    result.lesson_number,
                    result.score,
                    &result.content,
                );
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

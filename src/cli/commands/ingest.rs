//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &Path, force: bool, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;

    if clear {
        rag.clear_store()?;
        Output::info("Cleared existing course data.");
    }

    let spinner = Output::spinner("Indexing course documents...");

    let added = if path.is_dir() {
        rag.add_course_folder(path, force).await?
    } else {
        rag.add_course_document(path, force)
            .await?
            .into_iter()
            .collect()
    };

    spinner.finish_and_clear();

    if added.is_empty() {
        Output::info("Nothing new to index.");
    } else {
        Output::success(&format!("Indexed {} course(s):", added.len()));
        for title in &added {
            Output::list_item(title);
        }
    }

    let analytics = rag.analytics()?;
    Output::kv("Total courses", &analytics.total_courses.to_string());
    Output::kv("Total chunks", &rag.chunk_count()?.to_string());

    Ok(())
}

//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let rag = RagSystem::new(&settings)?;
    let analytics = rag.analytics()?;

    if analytics.course_titles.is_empty() {
        Output::info("No courses indexed yet. Run 'corso ingest <path>' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", analytics.total_courses));
    for title in &analytics.course_titles {
        Output::list_item(title);
    }
    println!();
    Output::kv("Total chunks", &rag.chunk_count()?.to_string());

    Ok(())
}

//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, session: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;

    let spinner = Output::spinner("Thinking...");

    match rag.query(question, session).await {
        Ok(response) => {
            spinner.finish_and_clear();
            Output::answer(&response.answer.text, &response.answer.sources);
            println!();
            Output::kv("Session", &response.session_id);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;
    let mut session_id = rag.create_session();

    println!("\n{}", style("Corso Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your courses, or 'exit' to quit. Use 'clear' to reset the conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            rag.clear_session(&session_id);
            session_id = rag.create_session();
            Output::info("Conversation history cleared.");
            continue;
        }

        match rag.query(input, Some(session_id.clone())).await {
            Ok(response) => {
                println!("\n{} {}", style("Corso:").cyan().bold(), response.answer.text);
                if !response.answer.sources.is_empty() {
                    for source in &response.answer.sources {
                        println!("  {}", style(&source.text).dim());
                    }
                }
                println!();
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

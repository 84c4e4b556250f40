//! CLI output formatting utilities.

use crate::agent::Source;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an answer with its cited sources.
    pub fn answer(text: &str, sources: &[Source]) {
        println!("\n{}", text);
        if !sources.is_empty() {
            println!("\n{}", style("Sources").bold().underlined());
            for source in sources {
                match &source.link {
                    Some(link) => {
                        println!("  {} {} ({})", style("*").cyan(), source.text, style(link).dim())
                    }
                    None => println!("  {} {}", style("*").cyan(), source.text),
                }
            }
        }
    }

    /// Print a search result.
    pub fn search_result(course: &str, lesson: Option<u32>, score: f32, content: &str) {
        let location = match lesson {
            Some(n) => format!("{} - Lesson {}", course, n),
            None => course.to_string(),
        };
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(&location).bold(),
            score
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.len() <= max_len {
        content
    } else {
        let cut = content
            .char_indices()
            .take_while(|(i, _)| *i < max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &content[..cut])
    }
}

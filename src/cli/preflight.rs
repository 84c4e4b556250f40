//! Pre-flight checks before expensive operations.
//!
//! Validates that required API keys are configured before starting
//! operations that would otherwise fail midway.

use crate::error::{CorsoError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds chunks and needs the embedding key.
    Ingest,
    /// Asking questions needs both the model key and the embedding key.
    Ask,
    /// Direct search embeds the query.
    Search,
    /// Listing reads only the local store.
    List,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Search => {
            check_env_key("OPENAI_API_KEY", "sk-...")?;
        }
        Operation::Ask => {
            check_env_key("ANTHROPIC_API_KEY", "sk-ant-...")?;
            check_env_key("OPENAI_API_KEY", "sk-...")?;
        }
        Operation::List => {}
    }
    Ok(())
}

fn check_env_key(name: &str, example: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(CorsoError::Config(format!(
            "{} is empty. Set it with: export {}='{}'",
            name, name, example
        ))),
        Err(_) => Err(CorsoError::Config(format!(
            "{} not set. Set it with: export {}='{}'",
            name, name, example
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_has_no_requirements() {
        assert!(check(Operation::List).is_ok());
    }
}

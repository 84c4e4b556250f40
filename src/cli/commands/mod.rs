//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod ingest;
mod list;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;

//! CLI command implementations.

mod clear;
mod config;
mod extract;
mod fetch;
mod index;
mod list;
mod quiz;
mod search;
mod sections;

pub use clear::run_clear;
pub use config::run_config;
pub use extract::run_extract;
pub use fetch::run_fetch;
pub use index::run_index;
pub use list::run_list;
pub use quiz::run_quiz;
pub use search::run_search;
pub use sections::run_sections;

//! CLI command implementations.

mod generate;
mod ingest;
mod search;
mod status;
mod structure;

pub use generate::run_generate;
pub use ingest::run_ingest;
pub use search::run_search;
pub use status::run_status;
pub use structure::run_structure;

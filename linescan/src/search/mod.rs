pub mod matcher;
pub mod orchestrator;

pub use matcher::LineMatcher;
pub use orchestrator::{RunState, Searcher};

pub mod clock;
pub mod config;
pub mod corpus;
pub mod errors;
pub mod events;
pub mod results;
pub mod search;

pub use config::SearchConfig;
pub use errors::{ScanError, ScanResult};
pub use events::ScanEvent;
pub use results::MatchSink;
pub use search::{RunState, Searcher};

pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod query;
pub mod sanitize;
pub mod server;
pub mod sources;
pub mod state;
pub mod traits;
pub mod types;
pub mod utils;

pub use aggregator::FeedAggregator;
pub use config::{Settings, SourceEndpoints};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use query::{FeedView, QueryService};
pub use state::FeedStore;
pub use traits::SourceFetcher;
pub use types::*;

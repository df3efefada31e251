//! Configuration, query construction and page fetching

pub mod config;
pub mod error;
pub mod fetcher;
pub mod query;

pub use config::{load_config, SearchConfig};
pub use error::FetchError;
pub use fetcher::{HttpPageSource, PageResult, PageSource};
pub use query::{build_search_url, QueryKind};

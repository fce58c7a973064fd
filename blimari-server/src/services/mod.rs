//! External service clients and discovery/curation services

pub mod books_client;
pub mod curator;
pub mod discovery;
pub mod gemini_client;
pub mod github_client;
pub mod qloo_client;
pub mod websearch_client;
pub mod youtube_client;

pub use books_client::BooksClient;
pub use curator::{CurationRequest, Curator, CuratorError, GeminiCurator};
pub use discovery::{DiscoveryService, SourceClient};
pub use gemini_client::GeminiClient;
pub use github_client::GitHubClient;
pub use qloo_client::QlooClient;
pub use websearch_client::WebSearchClient;
pub use youtube_client::YouTubeClient;

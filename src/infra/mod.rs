pub mod http_client;
pub mod memory_fetcher;

pub use http_client::ReqwestFetcher;
pub use memory_fetcher::InMemoryFetcher;

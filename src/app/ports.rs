use crate::error::Result;
use async_trait::async_trait;

/// Retrieval of one page from the results site.
///
/// Implementations pass transport failures through unchanged (`Http`, `Fetch`,
/// `Io`); they never retry. Parsing happens on the caller's side.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

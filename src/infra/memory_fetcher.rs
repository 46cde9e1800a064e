use crate::app::ports::DocumentFetcher;
use crate::error::{FinalsError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// Serves pages from memory; unknown URLs answer like a missing page (404).
///
/// Used to replay saved show pages offline and to drive tests.
#[derive(Default)]
pub struct InMemoryFetcher {
    pages: RwLock<HashMap<String, String>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are whole pages; a poisoned lock is recovered, never reported.
    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), body.into());
    }

    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    /// Serve the contents of a saved HTML file under `url`.
    pub fn insert_file(&self, url: impl Into<String>, path: impl AsRef<Path>) -> Result<()> {
        let body = std::fs::read_to_string(path)?;
        self.insert(url, body);
        Ok(())
    }

    pub fn remove(&self, url: &str) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
    }
}

#[async_trait]
impl DocumentFetcher for InMemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let pages = self.pages.read().unwrap_or_else(PoisonError::into_inner);
        pages.get(url).cloned().ok_or_else(|| FinalsError::Fetch {
            url: url.to_string(),
            status: 404,
        })
    }
}

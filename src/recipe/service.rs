//! Recipe feed fetching and validation.
//!
//! A [`RecipeService`] pulls raw JSON from an injected [`RecipeSource`]
//! (remote endpoint or bundled local file), decodes it, and validates the
//! batch. The three failure kinds stay distinct so the UI can message
//! each appropriately.

use crate::http::AsyncHttpClient;
use crate::recipe::dto::RecipesDto;
use crate::recipe::model::Recipe;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Default remote recipe feed endpoint.
pub const DEFAULT_FEED_URL: &str = "https://d3jbb8n5wk0qxi.cloudfront.net/recipes.json";

/// Service errors for recipe operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecipeServiceError {
    /// Transport failure, non-2xx status, or unreadable source
    #[error("Network error: {0}")]
    Network(String),

    /// The body was not valid recipes JSON
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// The batch failed structural validation
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A source of raw recipe feed bytes.
pub trait RecipeSource: Send + Sync {
    /// Fetch the raw JSON body of the feed.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, RecipeServiceError>> + Send;
}

/// Remote source fetching the feed over HTTP.
pub struct RemoteRecipeSource<C: AsyncHttpClient> {
    client: C,
    endpoint: String,
}

impl<C: AsyncHttpClient> RemoteRecipeSource<C> {
    /// Create a source for the default feed endpoint.
    pub fn new(client: C) -> Self {
        Self::with_endpoint(client, DEFAULT_FEED_URL)
    }

    /// Create a source for a custom endpoint.
    pub fn with_endpoint(client: C, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl<C: AsyncHttpClient> RecipeSource for RemoteRecipeSource<C> {
    async fn fetch(&self) -> Result<Vec<u8>, RecipeServiceError> {
        self.client
            .get(&self.endpoint)
            .await
            .map_err(|e| RecipeServiceError::Network(e.to_string()))
    }
}

/// Local source reading a bundled JSON file.
///
/// Used as the offline/fallback data source; the payload schema is
/// identical to the remote feed.
pub struct LocalRecipeSource {
    path: PathBuf,
}

impl LocalRecipeSource {
    /// Create a source reading from `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RecipeSource for LocalRecipeSource {
    async fn fetch(&self) -> Result<Vec<u8>, RecipeServiceError> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            RecipeServiceError::Network(format!("Could not read {}: {e}", self.path.display()))
        })
    }
}

/// Service responsible for fetching and validating recipes.
pub struct RecipeService<S: RecipeSource> {
    source: S,
}

impl<S: RecipeSource> RecipeService<S> {
    /// Create a service over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch, decode, and validate the full recipe batch.
    pub async fn fetch_recipes(&self) -> Result<Vec<Recipe>, RecipeServiceError> {
        let bytes = self.source.fetch().await?;

        let dto: RecipesDto = serde_json::from_slice(&bytes)
            .map_err(|e| RecipeServiceError::Decoding(e.to_string()))?;

        let recipes = dto
            .validate()
            .map_err(|e| RecipeServiceError::Validation(e.to_string()))?;

        debug!("Fetched {} validated recipes", recipes.len());
        Ok(recipes)
    }
}

//! Recipe feed client: DTOs, validation, fetching, and link fallbacks.

pub mod links;
mod dto;
mod model;
mod service;

pub use dto::{RecipeDto, RecipesDto, ValidationError};
pub use model::Recipe;
pub use service::{
    LocalRecipeSource, RecipeService, RecipeServiceError, RecipeSource, RemoteRecipeSource,
    DEFAULT_FEED_URL,
};

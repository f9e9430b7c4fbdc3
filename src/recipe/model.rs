//! Recipe domain model.

use serde::{Deserialize, Serialize};

/// A validated recipe.
///
/// Produced only by validating a [`RecipeDto`](crate::recipe::RecipeDto);
/// the identifier is a well-formed UUID string and both photo URLs parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// UUID identifier from the feed
    pub id: String,
    /// Cuisine label, e.g. "Malaysian"
    pub cuisine: String,
    /// Display name
    pub name: String,
    /// Locator for the large photo
    pub large_photo_url: String,
    /// Locator for the small photo (list/grid cells)
    pub small_photo_url: String,
    /// Original recipe web page, if the feed provided one
    pub source_url: Option<String>,
    /// Video for the recipe, if the feed provided one
    pub youtube_url: Option<String>,
}

//! Wire-format DTOs for the recipe feed and their structural validation.
//!
//! Validation is fail-fast and wholesale: one malformed record rejects
//! the entire batch, so the application never renders a partially valid
//! feed.

use crate::recipe::model::Recipe;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Recipe validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A single record failed a structural check
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    /// The batch as a whole is unusable
    #[error("Invalid recipe list: {0}")]
    InvalidList(String),
}

/// Top-level DTO for the recipes JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipesDto {
    pub recipes: Vec<RecipeDto>,
}

/// DTO for an individual recipe record.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDto {
    pub uuid: String,
    pub cuisine: String,
    pub name: String,
    pub photo_url_large: String,
    pub photo_url_small: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
}

impl RecipesDto {
    /// Validate the entire batch into domain models.
    ///
    /// An empty feed and any single invalid record both reject the whole
    /// batch.
    pub fn validate(&self) -> Result<Vec<Recipe>, ValidationError> {
        if self.recipes.is_empty() {
            return Err(ValidationError::InvalidList(
                "No recipes found in the data".to_string(),
            ));
        }

        self.recipes
            .iter()
            .map(RecipeDto::validate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ValidationError::InvalidList(format!("Invalid recipe found: {e}")))
    }
}

impl RecipeDto {
    /// Validate a single record into a domain model.
    pub fn validate(&self) -> Result<Recipe, ValidationError> {
        if self.uuid.is_empty() || Uuid::parse_str(&self.uuid).is_err() {
            return Err(ValidationError::InvalidRecipe(format!(
                "Invalid UUID: {}",
                self.uuid
            )));
        }

        if self.cuisine.is_empty() {
            return Err(ValidationError::InvalidRecipe(
                "Cuisine cannot be empty".to_string(),
            ));
        }

        if self.name.is_empty() {
            return Err(ValidationError::InvalidRecipe(
                "Name cannot be empty".to_string(),
            ));
        }

        if self.photo_url_large.is_empty() || Url::parse(&self.photo_url_large).is_err() {
            return Err(ValidationError::InvalidRecipe(
                "Invalid large photo URL".to_string(),
            ));
        }

        if self.photo_url_small.is_empty() || Url::parse(&self.photo_url_small).is_err() {
            return Err(ValidationError::InvalidRecipe(
                "Invalid small photo URL".to_string(),
            ));
        }

        Ok(Recipe {
            id: self.uuid.clone(),
            cuisine: self.cuisine.clone(),
            name: self.name.clone(),
            large_photo_url: self.photo_url_large.clone(),
            small_photo_url: self.photo_url_small.clone(),
            source_url: self.source_url.clone(),
            youtube_url: self.youtube_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_dto(n: u32) -> RecipeDto {
        RecipeDto {
            uuid: format!("0c6ca6e7-e32a-4053-b824-1dbf749910d{}", n % 10),
            cuisine: "Malaysian".to_string(),
            name: format!("Apam Balik {n}"),
            photo_url_large: "https://example.com/photos/large.jpg".to_string(),
            photo_url_small: "https://example.com/photos/small.jpg".to_string(),
            source_url: Some("https://example.com/recipe".to_string()),
            youtube_url: None,
        }
    }

    #[test]
    fn test_valid_record_maps_to_domain_model() {
        let recipe = valid_dto(1).validate().unwrap();
        assert_eq!(recipe.cuisine, "Malaysian");
        assert_eq!(recipe.name, "Apam Balik 1");
        assert_eq!(recipe.source_url.as_deref(), Some("https://example.com/recipe"));
        assert!(recipe.youtube_url.is_none());
    }

    #[test]
    fn test_invalid_uuid_is_rejected() {
        let mut dto = valid_dto(1);
        dto.uuid = "not-a-uuid".to_string();
        assert!(matches!(
            dto.validate(),
            Err(ValidationError::InvalidRecipe(_))
        ));
    }

    #[test]
    fn test_empty_uuid_is_rejected() {
        let mut dto = valid_dto(1);
        dto.uuid = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_empty_cuisine_is_rejected() {
        let mut dto = valid_dto(1);
        dto.cuisine = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut dto = valid_dto(1);
        dto.name = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_malformed_photo_url_is_rejected() {
        let mut dto = valid_dto(1);
        dto.photo_url_large = "not a url".to_string();
        assert!(dto.validate().is_err());

        let mut dto = valid_dto(1);
        dto.photo_url_small = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let dto = RecipesDto { recipes: vec![] };
        assert!(matches!(
            dto.validate(),
            Err(ValidationError::InvalidList(_))
        ));
    }

    #[test]
    fn test_one_bad_record_rejects_the_whole_batch() {
        let mut bad = valid_dto(3);
        bad.uuid = "garbage".to_string();
        let dto = RecipesDto {
            recipes: vec![valid_dto(1), valid_dto(2), bad, valid_dto(4)],
        };

        // Fail-fast: three valid records and one invalid one yield zero
        // usable recipes.
        assert!(matches!(
            dto.validate(),
            Err(ValidationError::InvalidList(_))
        ));
    }

    #[test]
    fn test_all_valid_batch_converts() {
        let dto = RecipesDto {
            recipes: vec![valid_dto(1), valid_dto(2)],
        };
        let recipes = dto.validate().unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[test]
    fn test_deserialize_with_optional_fields_missing() {
        let json = r#"{
            "recipes": [{
                "uuid": "0c6ca6e7-e32a-4053-b824-1dbf749910d8",
                "cuisine": "British",
                "name": "Bakewell Tart",
                "photo_url_large": "https://example.com/large.jpg",
                "photo_url_small": "https://example.com/small.jpg"
            }]
        }"#;

        let dto: RecipesDto = serde_json::from_str(json).unwrap();
        let recipes = dto.validate().unwrap();
        assert!(recipes[0].source_url.is_none());
        assert!(recipes[0].youtube_url.is_none());
    }
}

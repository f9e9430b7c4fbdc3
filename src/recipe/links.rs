//! Recipe link construction with search-engine fallbacks.
//!
//! A feed record's site or video link can be missing or malformed; the
//! detail page still needs somewhere to navigate. Malformed links fall
//! back to a search-engine query built from the recipe's name and
//! cuisine.

use crate::recipe::model::Recipe;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use url::Url;

/// Query encoding: keep only unreserved characters literal.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const GOOGLE_SEARCH: &str = "https://www.google.com/search?q=";
const YOUTUBE_SEARCH: &str = "https://www.youtube.com/results?search_query=";

/// URL of the recipe's web page.
///
/// A missing or unparseable `source_url` falls back to a Google search
/// for the recipe.
pub fn site_url(recipe: &Recipe) -> Url {
    if let Some(parsed) = recipe.source_url.as_deref().and_then(|s| Url::parse(s).ok()) {
        return parsed;
    }
    let fallback = search_url(recipe, false);
    debug!("Falling back to search URL: {fallback}");
    fallback
}

/// URL of the recipe's video, if the feed provided one.
///
/// `None` when the record has no video link at all; an unparseable link
/// falls back to a YouTube search.
pub fn video_url(recipe: &Recipe) -> Option<Url> {
    let raw = recipe.youtube_url.as_deref()?;
    if raw.is_empty() {
        return None;
    }
    Some(Url::parse(raw).unwrap_or_else(|_| {
        let fallback = search_url(recipe, true);
        debug!("Falling back to video search URL: {fallback}");
        fallback
    }))
}

/// Search URL for a recipe: Google for web pages, YouTube for videos.
pub fn search_url(recipe: &Recipe, video_search: bool) -> Url {
    let query = format!(
        "{} {} {}",
        recipe.name,
        recipe.cuisine,
        if video_search { "recipe video" } else { "recipe" }
    );
    let encoded = utf8_percent_encode(&query, QUERY).to_string();
    let base = if video_search { YOUTUBE_SEARCH } else { GOOGLE_SEARCH };

    // The query is reduced to unreserved characters and percent escapes,
    // so the concatenation always parses.
    Url::parse(&format!("{base}{encoded}")).expect("encoded search URL is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(source_url: Option<&str>, youtube_url: Option<&str>) -> Recipe {
        Recipe {
            id: "0c6ca6e7-e32a-4053-b824-1dbf749910d8".to_string(),
            cuisine: "Malaysian".to_string(),
            name: "Apam Balik".to_string(),
            large_photo_url: "https://example.com/large.jpg".to_string(),
            small_photo_url: "https://example.com/small.jpg".to_string(),
            source_url: source_url.map(str::to_owned),
            youtube_url: youtube_url.map(str::to_owned),
        }
    }

    #[test]
    fn test_site_url_uses_feed_link() {
        let recipe = recipe(Some("https://example.com/apam-balik"), None);
        assert_eq!(site_url(&recipe).as_str(), "https://example.com/apam-balik");
    }

    #[test]
    fn test_site_url_falls_back_to_google_search() {
        let recipe = recipe(None, None);
        let url = site_url(&recipe);
        assert!(url.as_str().starts_with(GOOGLE_SEARCH));
        assert!(url.as_str().contains("Apam%20Balik"));
    }

    #[test]
    fn test_site_url_malformed_link_falls_back() {
        let recipe = recipe(Some("not a url"), None);
        assert!(site_url(&recipe).as_str().starts_with(GOOGLE_SEARCH));
    }

    #[test]
    fn test_video_url_absent_is_none() {
        let recipe = recipe(None, None);
        assert!(video_url(&recipe).is_none());

        let recipe_empty = self::recipe(None, Some(""));
        assert!(video_url(&recipe_empty).is_none());
    }

    #[test]
    fn test_video_url_uses_feed_link() {
        let recipe = recipe(None, Some("https://www.youtube.com/watch?v=1ahpSTf_Pvk"));
        assert_eq!(
            video_url(&recipe).unwrap().as_str(),
            "https://www.youtube.com/watch?v=1ahpSTf_Pvk"
        );
    }

    #[test]
    fn test_video_url_malformed_link_falls_back_to_youtube_search() {
        let recipe = recipe(None, Some("::::"));
        let url = video_url(&recipe).unwrap();
        assert!(url.as_str().starts_with(YOUTUBE_SEARCH));
        assert!(url.as_str().contains("recipe%20video"));
    }

    #[test]
    fn test_search_url_encodes_query() {
        let recipe = recipe(None, None);
        let url = search_url(&recipe, false);
        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=Apam%20Balik%20Malaysian%20recipe"
        );
    }

    #[test]
    fn test_search_url_video_variant() {
        let recipe = recipe(None, None);
        let url = search_url(&recipe, true);
        assert_eq!(
            url.as_str(),
            "https://www.youtube.com/results?search_query=Apam%20Balik%20Malaysian%20recipe%20video"
        );
    }
}

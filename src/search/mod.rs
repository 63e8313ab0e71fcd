//! Target-site grammar: search categories, extraction patterns and locators
//!
//! Locators are composed by plain string concatenation. The search query joins
//! keywords with `+` and is not percent-encoded.

mod category;

pub use category::SearchCategory;

/// Pattern applied to repository pages; alternately yields a language name and its share
pub const LANGUAGE_STATS_PATTERN: &str = r#"<span class="(?:lang|percent)">([^<]*?)</span>"#;

/// Builds the search page locator for the given keywords and category
///
/// # Example
///
/// ```
/// use gitfan::search::{search_url, SearchCategory};
///
/// let keywords = vec!["python".to_string(), "html".to_string()];
/// assert_eq!(
///     search_url("https://github.com", &keywords, SearchCategory::Repositories),
///     "https://github.com/search?q=python+html&type=Repositories"
/// );
/// ```
pub fn search_url(base_url: &str, keywords: &[String], category: SearchCategory) -> String {
    format!(
        "{}/search?q={}&type={}",
        base_url.trim_end_matches('/'),
        keywords.join("+"),
        category
    )
}

/// Builds the page locator for a discovered repository path
pub fn repository_url(base_url: &str, key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if key.starts_with('/') {
        format!("{}{}", base, key)
    } else {
        format!("{}/{}", base, key)
    }
}

/// Returns the owner segment of a `/owner/name` repository path
///
/// Returns an empty string when the path has no owner segment.
pub fn owner_of(key: &str) -> &str {
    key.split('/').nth(1).unwrap_or("")
}

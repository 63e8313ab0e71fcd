use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Search result listing the crawl starts from
///
/// Each category has exactly one extraction pattern with a single capture
/// group that yields a `/owner/name` repository path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SearchCategory {
    Repositories,
    Issues,
    Wikis,
}

impl SearchCategory {
    /// All supported categories
    pub const ALL: [SearchCategory; 3] = [Self::Repositories, Self::Issues, Self::Wikis];

    /// Name used in the `type=` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repositories => "Repositories",
            Self::Issues => "Issues",
            Self::Wikis => "Wikis",
        }
    }

    /// Single-line pattern extracting repository paths from this listing
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Repositories => r#"<a class="v-align-middle" data-hydro.*? href="(/[^/]*/[^"/]*)">"#,
            Self::Issues => r#"<a class="muted-link text-bold".*?href="(/[^/]*/[^/]*)/issues">"#,
            Self::Wikis => r#"<a class="muted-link .*?href="(/[^/]*/[^/]*)">"#,
        }
    }
}

impl FromStr for SearchCategory {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for SearchCategory {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_from_str() {
        assert_eq!(
            "Repositories".parse::<SearchCategory>().unwrap(),
            SearchCategory::Repositories
        );
        assert_eq!(
            "Issues".parse::<SearchCategory>().unwrap(),
            SearchCategory::Issues
        );
        assert_eq!(
            "Wikis".parse::<SearchCategory>().unwrap(),
            SearchCategory::Wikis
        );

        let err = "repositories".parse::<SearchCategory>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory(ref name) if name == "repositories"));
    }

    #[test]
    fn test_every_pattern_has_one_capture_group() {
        for category in SearchCategory::ALL {
            let regex = Regex::new(category.pattern()).unwrap();
            // captures_len counts the implicit whole-match group
            assert_eq!(regex.captures_len(), 2, "{}", category);
        }
    }

    #[test]
    fn test_repositories_pattern_extracts_path() {
        let line = r#"<a class="v-align-middle" data-hydro-click="{}" data-hydro-click-hmac="abc" href="/psf/requests-html">psf/requests-html</a>"#;
        let regex = Regex::new(SearchCategory::Repositories.pattern()).unwrap();
        let captured = regex.captures(line).unwrap().get(1).unwrap().as_str();
        assert_eq!(captured, "/psf/requests-html");
    }

    #[test]
    fn test_issues_pattern_extracts_path() {
        let line = r#"<a class="muted-link text-bold" data-hydro-click="{}" href="/scrapy/scrapy/issues">scrapy/scrapy</a>"#;
        let regex = Regex::new(SearchCategory::Issues.pattern()).unwrap();
        let captured = regex.captures(line).unwrap().get(1).unwrap().as_str();
        assert_eq!(captured, "/scrapy/scrapy");
    }

    #[test]
    fn test_display_matches_query_value() {
        assert_eq!(SearchCategory::Wikis.to_string(), "Wikis");
    }
}

use crate::config::TargetConfig;
use crate::UrlError;
use url::Url;

/// Builds result page URLs for a keyword
///
/// Page 1 is `{base}{path}?query={keyword}`; later pages add `&page={n}`.
#[derive(Debug, Clone)]
pub struct SearchTemplate {
    endpoint: Url,
}

impl SearchTemplate {
    /// Creates a template from a base URL and search path
    pub fn new(base_url: &str, search_path: &str) -> Result<Self, UrlError> {
        let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let endpoint = base
            .join(search_path)
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        Ok(Self { endpoint })
    }

    /// Creates a template from the `[target]` config section
    pub fn from_config(target: &TargetConfig) -> Result<Self, UrlError> {
        Self::new(&target.base_url, &target.search_path)
    }

    /// URL of result page `page` (1-based) for `keyword`
    pub fn page_url(&self, keyword: &str, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("query", keyword);
            if page > 1 {
                query.append_pair("page", &page.to_string());
            }
        }
        url
    }

    /// Reads the `page` number out of a pagination link
    ///
    /// Relative links are resolved against the search endpoint. Returns `None`
    /// when the link has no parsable `page` parameter.
    pub fn page_number(&self, href: &str) -> Option<u32> {
        let url = self.endpoint.join(href.trim()).ok()?;
        let page = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())?;
        page.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> SearchTemplate {
        SearchTemplate::new("https://www.trustpilot.com", "/search").unwrap()
    }

    #[test]
    fn test_first_page_has_no_page_param() {
        assert_eq!(
            template().page_url("vpn", 1).as_str(),
            "https://www.trustpilot.com/search?query=vpn"
        );
    }

    #[test]
    fn test_later_pages() {
        assert_eq!(
            template().page_url("vpn", 4).as_str(),
            "https://www.trustpilot.com/search?query=vpn&page=4"
        );
    }

    #[test]
    fn test_keyword_is_encoded() {
        assert_eq!(
            template().page_url("web hosting & more", 1).as_str(),
            "https://www.trustpilot.com/search?query=web+hosting+%26+more"
        );
    }

    #[test]
    fn test_page_number_from_relative_link() {
        assert_eq!(template().page_number("/search?query=vpn&page=5"), Some(5));
        assert_eq!(template().page_number("?page=12&query=vpn"), Some(12));
    }

    #[test]
    fn test_page_number_from_absolute_link() {
        assert_eq!(
            template().page_number("https://www.trustpilot.com/search?page=7&query=vpn"),
            Some(7)
        );
    }

    #[test]
    fn test_page_number_missing_or_garbage() {
        assert_eq!(template().page_number("/search?query=vpn"), None);
        assert_eq!(template().page_number("/search?query=vpn&page=last"), None);
    }
}

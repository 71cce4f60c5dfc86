use crate::config::ProxyConfig;
use crate::UrlError;
use url::Url;

/// A forwarding proxy that fetches the target URL on our behalf
///
/// Requests go to `{endpoint}?api_key={key}&url={target}&country={geo}`.
#[derive(Debug, Clone)]
pub struct ProxyEndpoint {
    endpoint: Url,
    api_key: String,
    country: String,
}

impl ProxyEndpoint {
    pub fn new(endpoint: &str, api_key: &str, country: &str) -> Result<Self, UrlError> {
        let endpoint = Url::parse(endpoint).map_err(|e| UrlError::Parse(e.to_string()))?;
        Ok(Self {
            endpoint,
            api_key: api_key.to_string(),
            country: country.to_string(),
        })
    }

    /// Creates an endpoint from the `[proxy]` config section
    pub fn from_config(proxy: &ProxyConfig) -> Result<Self, UrlError> {
        Self::new(&proxy.endpoint, &proxy.api_key, &proxy.country)
    }

    /// Rewrites `target` so it is fetched through the proxy
    pub fn wrap(&self, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("url", target)
            .append_pair("country", &self.country);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_encodes_target() {
        let proxy = ProxyEndpoint::new("https://proxy.scrapeops.io/v1/", "KEY", "us").unwrap();
        let wrapped = proxy.wrap("https://www.trustpilot.com/search?query=vpn&page=2");

        assert_eq!(
            wrapped.as_str(),
            "https://proxy.scrapeops.io/v1/?api_key=KEY&url=https%3A%2F%2Fwww.trustpilot.com%2Fsearch%3Fquery%3Dvpn%26page%3D2&country=us"
        );
    }

    #[test]
    fn test_wrap_round_trips_target() {
        let proxy = ProxyEndpoint::new("http://127.0.0.1:9000/v1/", "k", "de").unwrap();
        let target = "https://example.com/search?query=a b&page=3";
        let wrapped = proxy.wrap(target);

        let params: Vec<(String, String)> = wrapped
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("api_key".to_string(), "k".to_string()),
                ("url".to_string(), target.to_string()),
                ("country".to_string(), "de".to_string()),
            ]
        );
    }
}

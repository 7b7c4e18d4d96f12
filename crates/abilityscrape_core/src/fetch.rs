use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, USER_AGENT,
    UPGRADE_INSECURE_REQUESTS,
};

use crate::config::{EnvLookup, ScrapeConfig, env_string};
use crate::error::{Result, ScrapeError};

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const BROWSER_ACCEPT_ENCODING: &str = "gzip, deflate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

/// Source of raw report pages.
pub trait ReportPageApi {
    fn fetch_page(&mut self, url: &str) -> Result<FetchedPage>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct ReportWebClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl ReportWebClientConfig {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::from_config_with(config, env_string)
    }

    pub fn from_config_with(config: &ScrapeConfig, env: EnvLookup) -> Self {
        Self {
            user_agent: config.user_agent_with(env),
            timeout: config.timeout_with(env),
        }
    }
}

/// Blocking client that presents itself as a desktop browser.
pub struct ReportWebClient {
    client: Client,
    request_count: usize,
}

impl ReportWebClient {
    pub fn new(config: ReportWebClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(browser_headers(&config.user_agent)?)
            .build()
            .map_err(client_build_error)?;
        Ok(Self {
            client,
            request_count: 0,
        })
    }
}

impl ReportPageApi for ReportWebClient {
    fn fetch_page(&mut self, url: &str) -> Result<FetchedPage> {
        self.request_count += 1;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| network_error(url, &error))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response
            .bytes()
            .map_err(|error| network_error(url, &error))?;
        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

pub fn browser_headers(user_agent: &str) -> Result<HeaderMap> {
    let user_agent = HeaderValue::from_str(user_agent).map_err(|error| ScrapeError::Config {
        path: "user_agent".to_string(),
        message: format!("invalid header value: {error}"),
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_static(BROWSER_ACCEPT_ENCODING),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    Ok(headers)
}

fn client_build_error(error: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Config {
        path: "http client".to_string(),
        message: format!("failed to build: {error}"),
    }
}

fn network_error(url: &str, error: &reqwest::Error) -> ScrapeError {
    let message = if error.is_timeout() {
        format!("timed out: {error}")
    } else {
        error.to_string()
    };
    ScrapeError::Network {
        url: url.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::header::{ACCEPT_ENCODING, CONNECTION, USER_AGENT};

    use super::{ReportWebClientConfig, browser_headers, client_build_error};
    use crate::config::{ScrapeConfig, ScrapeSection};
    use crate::error::ScrapeError;

    #[test]
    fn browser_headers_cover_the_fixed_set() {
        let headers = browser_headers("agent/1.0").expect("headers");
        assert_eq!(headers[USER_AGENT], "agent/1.0");
        assert_eq!(headers[ACCEPT_ENCODING], "gzip, deflate");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers.len(), 6);
    }

    #[test]
    fn browser_headers_reject_control_characters() {
        assert!(browser_headers("agent\n1.0").is_err());
    }

    #[test]
    fn client_config_reads_scrape_section() {
        let config = ScrapeConfig {
            scrape: ScrapeSection {
                user_agent: Some("custom/2.0".to_string()),
                timeout_ms: Some(1_500),
                ..ScrapeSection::default()
            },
        };
        let client_config = ReportWebClientConfig::from_config_with(&config, |_| None);
        assert_eq!(client_config.timeout, Duration::from_millis(1_500));
        assert_eq!(client_config.user_agent, "custom/2.0");

        let client_config = ReportWebClientConfig::from_config_with(&config, |key| {
            (key == "ABILITYSCRAPE_USER_AGENT").then(|| "env/3.0".to_string())
        });
        assert_eq!(client_config.user_agent, "env/3.0");
        assert_eq!(client_config.timeout, Duration::from_millis(1_500));
    }

    #[test]
    fn client_build_failure_is_a_config_error() {
        let error = client_build_error("tls backend unavailable");
        assert!(matches!(error, ScrapeError::Config { .. }));
        assert_eq!(
            error.to_string(),
            "invalid config http client: failed to build: tls backend unavailable"
        );
    }
}

//! HTTP page fetching shared by the website analyzer and the scraping fallback.

use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A fetched page after redirects have been followed.
#[derive(Debug, Clone)]
pub(crate) struct FetchedPage {
    pub status: u16,
    pub body: String,
    pub final_url: Url,
}

/// Something that can GET a page. Implemented over reqwest, faked in tests.
#[async_trait]
pub(crate) trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// Builds the shared reqwest client with the configured timeout and user agent.
pub(crate) fn build_http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout / 2)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| AppError::Generic(anyhow::anyhow!("Failed to build HTTP client: {}", e)))
}

#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub(crate) fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        tracing::debug!(target: "fetch_task", "Attempting to GET: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(target: "fetch_task", "Timeout fetching {}: {}", url, e);
                } else if e.is_connect() || e.is_request() {
                    tracing::warn!(target: "fetch_task", "Request/Connection error fetching {}: {}", url, e);
                } else {
                    tracing::warn!(target: "fetch_task", "Unexpected error fetching {}: {}", url, e);
                }
                AppError::Request(e)
            })?;

        let status = response.status();
        let final_url = response.url().clone();
        tracing::debug!(target: "fetch_task", "GET {} status: {} (final URL {})", url, status, final_url);

        let body = response.text().await?;
        Ok(FetchedPage {
            status: status.as_u16(),
            body,
            final_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fetcher() -> HttpFetcher {
        let config = Config::default();
        HttpFetcher::new(build_http_client(&config).unwrap(), config.request_timeout)
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/home", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/home"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>Welcome</body></html>"),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.final_url.path(), "/home");
        assert!(page.body.contains("Welcome"));
    }

    #[tokio::test]
    async fn test_fetch_reports_error_status_without_failing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();
        assert_eq!(page.status, 404);
        assert_eq!(page.body, "not here");
    }
}

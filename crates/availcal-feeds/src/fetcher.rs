//! Retrieving calendar feeds.
//!
//! [`FeedFetcher`] is the seam between the aggregator and the network.
//! [`HttpFeedFetcher`] performs exactly one GET per call; there is no retry
//! at this layer. Callers that want retries wrap the whole aggregation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use availcal_core::CalendarSource;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use tracing::{debug, trace};

use crate::error::{FeedError, FeedResult};
use crate::feed::RawFeed;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retrieves the raw calendar text of a source.
///
/// Implementations must be cheap to share across tasks and must report every
/// failure as a source-scoped [`FeedError`], never by panicking.
pub trait FeedFetcher: Send + Sync {
    /// Short name of this fetcher, for logs.
    fn name(&self) -> &str;

    /// Fetches the current feed of `source`.
    ///
    /// # Errors
    ///
    /// Returns a fetch-stage [`FeedError`] on transport failure, timeout or
    /// non-2xx status.
    fn fetch<'a>(&'a self, source: &'a CalendarSource) -> BoxFuture<'a, FeedResult<RawFeed>>;
}

/// Configuration for [`HttpFeedFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Upper bound for the whole request, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Several platforms reject requests that do not look like a browser.
    pub user_agent: String,
    pub accept: String,
    /// Sent when set.
    pub accept_language: Option<String>,
}

impl FetchConfig {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Default connect timeout in seconds.
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Default user agent: a conventional desktop browser.
    pub const BROWSER_USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    pub const ACCEPT_CALENDAR: &'static str = "text/calendar, text/plain, */*";

    pub const DEFAULT_ACCEPT_LANGUAGE: &'static str = "en-US,en;q=0.9";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets or clears the `Accept-Language` header.
    pub fn with_accept_language(mut self, language: Option<String>) -> Self {
        self.accept_language = language;
        self
    }

    fn default_headers(&self) -> FeedResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value("Accept", &self.accept)?);
        if let Some(ref language) = self.accept_language {
            headers.insert(ACCEPT_LANGUAGE, header_value("Accept-Language", language)?);
        }
        Ok(headers)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: Self::BROWSER_USER_AGENT.to_string(),
            accept: Self::ACCEPT_CALENDAR.to_string(),
            accept_language: Some(Self::DEFAULT_ACCEPT_LANGUAGE.to_string()),
        }
    }
}

fn header_value(name: &str, value: &str) -> FeedResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        FeedError::configuration(format!("Invalid {} header value", name)).with_source(e)
    })
}

/// Fetches feeds with a single HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFeedFetcher {
    /// Creates a fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a header value is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(config.default_headers()?)
            .build()
            .map_err(|e| {
                FeedError::configuration("Failed to create HTTP client").with_source(e)
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_feed(&self, source: &CalendarSource) -> FeedResult<RawFeed> {
        let endpoint = source.redacted_endpoint();
        trace!(source = %source, endpoint = %endpoint, "Sending feed request");

        let response = self
            .client
            .get(source.endpoint().clone())
            .send()
            .await
            .map_err(|e| request_error(e, &endpoint))?;

        let body = read_body(response, &endpoint).await?;
        debug!(source = %source, bytes = body.len(), "Fetched calendar feed");

        Ok(RawFeed::new(source.clone(), body))
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch<'a>(&'a self, source: &'a CalendarSource) -> BoxFuture<'a, FeedResult<RawFeed>> {
        Box::pin(async move {
            self.fetch_feed(source)
                .await
                .map_err(|e| e.with_source_name(source.name()))
        })
    }
}

/// Reads the body of a 2xx response.
async fn read_body(response: Response, endpoint: &str) -> FeedResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if !status.is_success() {
        return Err(FeedError::http_status(
            status.as_u16(),
            format!("HTTP {} from {}", status, endpoint),
        ));
    }

    response.text().await.map_err(|e| {
        if e.is_timeout() {
            FeedError::timeout(format!("Timed out reading body from {}", endpoint))
                .with_source(e.without_url())
        } else {
            FeedError::invalid_response(format!("Failed to read body from {}", endpoint))
                .with_source(e.without_url())
        }
    })
}

/// Maps a transport error. The URL is stripped because it carries the
/// source's access token.
fn request_error(e: reqwest::Error, endpoint: &str) -> FeedError {
    if e.is_timeout() {
        FeedError::timeout(format!("Request to {} timed out", endpoint)).with_source(e.without_url())
    } else {
        FeedError::network(format!("Request to {} failed", endpoint)).with_source(e.without_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedErrorCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const FEED: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";

    fn source(server: &MockServer, route: &str) -> CalendarSource {
        CalendarSource::parse("Booking.com", &format!("{}{}?t=secret-token", server.uri(), route))
            .unwrap()
    }

    /// Exact header match. Comma-separated values are compared as one string.
    fn has_header(
        name: &'static str,
        expected: &'static str,
    ) -> impl Fn(&Request) -> bool + Send + Sync {
        move |req: &Request| req.headers.get(name).and_then(|v| v.to_str().ok()) == Some(expected)
    }

    #[test]
    fn default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.accept, "text/calendar, text/plain, */*");
        assert_eq!(config.accept_language.as_deref(), Some("en-US,en;q=0.9"));
    }

    #[test]
    fn invalid_header_is_configuration_error() {
        let config = FetchConfig::new().with_accept_language(Some("bad\nvalue".to_string()));
        let err = HttpFeedFetcher::new(config).unwrap_err();
        assert_eq!(err.code(), FeedErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn fetches_body_with_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export.ics"))
            .and(has_header("accept", FetchConfig::ACCEPT_CALENDAR))
            .and(has_header("accept-language", FetchConfig::DEFAULT_ACCEPT_LANGUAGE))
            .and(has_header("user-agent", FetchConfig::BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFeedFetcher::new(FetchConfig::default()).unwrap();
        let feed = fetcher.fetch(&source(&server, "/export.ics")).await.unwrap();

        assert_eq!(feed.body(), FEED);
        assert_eq!(feed.source().name(), "Booking.com");
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFeedFetcher::new(FetchConfig::default()).unwrap();
        let err = fetcher
            .fetch(&source(&server, "/export.ics"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), FeedErrorCode::HttpStatus);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.source_name(), Some("Booking.com"));
        assert!(!err.to_string().contains("secret-token"));
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(FEED)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig::new().with_timeout(Duration::from_millis(100));
        let fetcher = HttpFeedFetcher::new(config).unwrap();
        let err = fetcher
            .fetch(&source(&server, "/export.ics"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), FeedErrorCode::Timeout);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let source = CalendarSource::parse("Airbnb", "http://127.0.0.1:1/calendar.ics").unwrap();
        let fetcher = HttpFeedFetcher::new(FetchConfig::default()).unwrap();

        let err = fetcher.fetch(&source).await.unwrap_err();
        assert_eq!(err.code(), FeedErrorCode::NetworkError);
        assert_eq!(err.source_name(), Some("Airbnb"));
    }
}

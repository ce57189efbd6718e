//! Strictly sequential document fetching.
//!
//! Requests go out one at a time with a mandatory pause between any two of
//! them (robots.txt lookups and retries included). A failed document is
//! recorded and the batch moves on.

use crate::robots::Robots;
use corpus::SourceDescriptor;
use reqwest::{header, Client};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tokio::time::{sleep_until, Instant};
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: Url, status: u16 },
    #[error("{url} is disallowed by robots.txt")]
    Disallowed { url: Url },
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| ct.starts_with("application/pdf"))
    }
}

/// One GET request. Implementations must not retry or pause on their own.
pub trait Fetch {
    fn get(&self, url: &Url) -> impl Future<Output = Result<Response, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        let request_error = |source| FetchError::Request { url: url.clone(), source };
        let resp = self.client.get(url.clone()).send().await.map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(FetchError::Status { url: url.clone(), status: resp.status().as_u16() });
        }
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await.map_err(request_error)?.to_vec();
        Ok(Response { content_type, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    /// Minimum pause between the start of two consecutive requests.
    pub delay: Duration,
    /// Extra attempts after a failed request.
    pub retries: u32,
    pub respect_robots: bool,
}

impl Default for Politeness {
    fn default() -> Self {
        Self { delay: Duration::from_secs(5), retries: 1, respect_robots: true }
    }
}

#[derive(Debug)]
pub struct FetchedDoc {
    pub descriptor: SourceDescriptor,
    pub url: Url,
    pub response: Response,
    /// RFC 3339 time of the successful request.
    pub fetched_at: String,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub fetched: Vec<FetchedDoc>,
    pub failed: Vec<(String, FetchError)>,
}

/// Resolve a descriptor url, joining relative ones onto `base`.
pub fn resolve_url(base: Option<&Url>, raw: &str) -> Result<Url, FetchError> {
    let invalid = |e: url::ParseError| FetchError::InvalidUrl { url: raw.to_string(), reason: e.to_string() };
    match Url::parse(raw) {
        Ok(u) => Ok(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(b) => b.join(raw).map_err(invalid),
            None => Err(invalid(url::ParseError::RelativeUrlWithoutBase)),
        },
        Err(e) => Err(invalid(e)),
    }
}

/// Issues requests one at a time, never sooner than `delay` after the last one.
struct Pacer<'a, F: Fetch> {
    fetcher: &'a F,
    politeness: Politeness,
    last_request: Option<Instant>,
    robots: HashMap<String, Robots>,
}

impl<'a, F: Fetch> Pacer<'a, F> {
    async fn request(&mut self, url: &Url, delay: Duration) -> Result<Response, FetchError> {
        if let Some(last) = self.last_request {
            sleep_until(last + delay).await;
        }
        self.last_request = Some(Instant::now());
        self.fetcher.get(url).await
    }

    async fn robots_for(&mut self, url: &Url) -> Robots {
        let Some(host) = url.host_str().map(str::to_string) else { return Robots::allow_all() };
        if let Some(r) = self.robots.get(&host) {
            return r.clone();
        }
        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);
        robots_url.set_fragment(None);
        let rules = match self.request(&robots_url, self.politeness.delay).await {
            Ok(resp) => Robots::parse(&String::from_utf8_lossy(&resp.body)),
            Err(e) => {
                tracing::debug!(%host, error = %e, "no usable robots.txt, allowing all");
                Robots::allow_all()
            }
        };
        self.robots.insert(host, rules.clone());
        rules
    }

    async fn fetch_one(&mut self, url: &Url) -> Result<Response, FetchError> {
        let mut delay = self.politeness.delay;
        if self.politeness.respect_robots {
            let robots = self.robots_for(url).await;
            if !robots.allows(&robots_target(url)) {
                return Err(FetchError::Disallowed { url: url.clone() });
            }
            delay = delay.max(robots.crawl_delay().unwrap_or_default());
        }
        let mut attempt = 0;
        loop {
            match self.request(url, delay).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.politeness.retries => {
                    attempt += 1;
                    tracing::warn!(%url, error = %e, attempt, "fetch failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Path plus `?query`, the string robots.txt rules are matched against.
fn robots_target(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    }
}

/// Fetch every source in order. Never fails as a whole.
pub async fn fetch_all<F: Fetch>(
    fetcher: &F,
    base: Option<&Url>,
    sources: &[SourceDescriptor],
    politeness: Politeness,
) -> FetchOutcome {
    let mut pacer = Pacer { fetcher, politeness, last_request: None, robots: HashMap::new() };
    let mut outcome = FetchOutcome::default();
    for source in sources {
        let result = match resolve_url(base, &source.url) {
            Ok(url) => pacer.fetch_one(&url).await.map(|resp| (url, resp)),
            Err(e) => Err(e),
        };
        match result {
            Ok((url, response)) => {
                tracing::info!(name = %source.name, %url, bytes = response.body.len(), "fetched");
                let fetched_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
                outcome.fetched.push(FetchedDoc { descriptor: source.clone(), url, response, fetched_at });
            }
            Err(e) => {
                tracing::warn!(name = %source.name, error = %e, "giving up on document");
                outcome.failed.push((source.name.clone(), e));
            }
        }
    }
    tracing::info!(fetched = outcome.fetched.len(), failed = outcome.failed.len(), "fetch batch done");
    outcome
}

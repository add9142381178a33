use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use cdnmap_common::error::ProbeError;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode, Url};
use tokio::time::timeout;

use super::registrable_domain;

const MAX_REDIRECTS: usize = 5;

/// Response headers as lowercase `(name, value)` pairs, in wire order.
pub type HeaderList = Vec<(String, String)>;

/// HTTP fetches the analyzers need.
#[async_trait]
pub trait WebClient: Send + Sync {
    /// Fetches `url` and returns the headers of the final response. Redirects
    /// are followed only while they stay on the same registrable domain.
    async fn fetch_headers(&self, url: &str, limit: Duration) -> Result<HeaderList, ProbeError>;

    /// Fetches `url` and decodes the body as JSON. Redirects may cross
    /// domains; `429` maps to [`ProbeError::RateLimited`].
    async fn fetch_json(&self, url: &str, limit: Duration) -> Result<serde_json::Value, ProbeError>;
}

/// [`WebClient`] over a `reqwest` client with automatic redirects disabled.
#[derive(Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: Url, limit: Duration) -> Result<Response, ProbeError> {
        self.client
            .get(url)
            .timeout(limit)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))
    }

    /// Issues requests until a non-redirect response arrives. `same_site`
    /// restricts every hop to the registrable domain of `url`.
    async fn follow(&self, url: &str, limit: Duration, same_site: bool) -> Result<Response, ProbeError> {
        let mut current = Url::parse(url).map_err(|e| ProbeError::Malformed(format!("{url}: {e}")))?;
        let site = registrable_domain(current.host_str().unwrap_or_default());

        for _ in 0..=MAX_REDIRECTS {
            let resp = self.send(current.clone(), limit).await?;
            if !resp.status().is_redirection() {
                return Ok(resp);
            }

            let Some(location) = resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()) else {
                return Ok(resp);
            };
            let next = current
                .join(location)
                .map_err(|e| ProbeError::Malformed(format!("bad redirect '{location}': {e}")))?;

            if same_site && registrable_domain(next.host_str().unwrap_or_default()) != site {
                return Err(ProbeError::CrossDomainRedirect {
                    from: current.to_string(),
                    to: next.to_string(),
                });
            }
            current = next;
        }

        Err(ProbeError::Malformed(format!("more than {MAX_REDIRECTS} redirects from {url}")))
    }

    async fn json_body(&self, url: &str, limit: Duration) -> Result<serde_json::Value, ProbeError> {
        let resp = self.follow(url, limit, false).await?;
        match resp.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                let host = resp.url().host_str().unwrap_or_default().to_string();
                Err(ProbeError::RateLimited(host))
            }
            status if !status.is_success() => {
                Err(ProbeError::Lookup(format!("HTTP {status} from {url}")))
            }
            _ => resp
                .json::<serde_json::Value>()
                .await
                .map_err(|e| ProbeError::Malformed(e.to_string())),
        }
    }
}

#[async_trait]
impl WebClient for ReqwestClient {
    async fn fetch_headers(&self, url: &str, limit: Duration) -> Result<HeaderList, ProbeError> {
        let resp = timeout(limit, self.follow(url, limit, true))
            .await
            .map_err(|_| ProbeError::Timeout)??;

        Ok(resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect())
    }

    async fn fetch_json(&self, url: &str, limit: Duration) -> Result<serde_json::Value, ProbeError> {
        timeout(limit, self.json_body(url, limit))
            .await
            .map_err(|_| ProbeError::Timeout)?
    }
}

/// Maps `reqwest` failures onto the probe status taxonomy.
pub fn map_reqwest_error(err: &reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::Timeout;
    }

    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }

    let lower = text.to_ascii_lowercase();
    if lower.contains("certificate") || lower.contains("tls") || lower.contains("handshake") {
        ProbeError::Tls(text)
    } else if err.is_connect() {
        ProbeError::Connection(text)
    } else {
        ProbeError::Lookup(text)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

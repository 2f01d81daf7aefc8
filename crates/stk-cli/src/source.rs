//! Feed sources: a local file or an `http(s)://` URL.
//!
//! URLs may carry tokens in their query string. Anything logged or put in
//! an error message goes through [`stk_config::redact_source`].

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use stk_config::redact_source;
use tracing::debug;

#[derive(Clone, PartialEq, Eq)]
pub enum FeedSource {
    File(PathBuf),
    Http(Url),
}

impl FeedSource {
    pub fn parse(raw: &str) -> Result<FeedSource> {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| anyhow!("invalid feed url {}: {e}", redact_source(raw)))?;
            return Ok(FeedSource::Http(url));
        }
        if raw.is_empty() {
            bail!("feed source is empty");
        }
        Ok(FeedSource::File(PathBuf::from(raw)))
    }

    /// Read the raw feed bytes. Non-2xx responses are errors.
    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        match self {
            FeedSource::File(p) => tokio::fs::read(p)
                .await
                .with_context(|| format!("read feed failed: {}", p.display())),
            FeedSource::Http(url) => {
                let shown = redact_source(url.as_str());
                let resp = client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| anyhow!("feed request failed source={shown}: {}", e.without_url()))?;

                let status = resp.status();
                if !status.is_success() {
                    bail!("feed http error source={shown} status={}", status.as_u16());
                }

                let body = resp
                    .bytes()
                    .await
                    .map_err(|e| anyhow!("feed body read failed source={shown}: {}", e.without_url()))?;
                debug!(source = %shown, bytes = body.len(), "feed fetched");
                Ok(body.to_vec())
            }
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::File(p) => write!(f, "{}", p.display()),
            FeedSource::Http(u) => f.write_str(&redact_source(u.as_str())),
        }
    }
}

impl fmt::Debug for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedSource({self})")
    }
}

pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("http client build failed")
}

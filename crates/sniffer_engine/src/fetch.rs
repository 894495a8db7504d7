use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};

use crate::settings::EngineSettings;
use crate::types::TransportError;

/// Issues a single GET and returns the decoded body. No retry logic here;
/// that belongs to [`crate::RetryingFetcher`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// `reqwest`-backed transport. One instance holds one `Client`, so the
/// connection pool is shared across all workers of a run.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_body_bytes: u64,
}

impl ReqwestTransport {
    pub fn new(settings: &EngineSettings) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|err| TransportError::new(format!("invalid user agent: {err}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        // Retired catalog pages answer with redirects; those must surface as
        // failures, so redirects are never followed.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| TransportError::new(err.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: settings.max_body_bytes,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(format!("http status {status}")));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_body_bytes {
                return Err(TransportError::new(format!(
                    "response too large ({content_len} bytes)"
                )));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_body_bytes {
                return Err(TransportError::new(format!(
                    "response too large ({next_len} bytes)"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        // The catalog declares UTF-8; decode lossily rather than fail on a
        // stray byte.
        let (text, _, _) = encoding_rs::UTF_8.decode(&bytes);
        Ok(text.into_owned())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new("timeout");
    }
    TransportError::new(err.to_string())
}

// Tabular source: something that hands back the sheet as CSV text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::FetchError;

#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_csv(&self) -> Result<String, FetchError>;
}

/// Published-sheet CSV export fetched over HTTP. Each request carries a cache-busting
/// query parameter set to the current epoch milliseconds.
pub struct HttpSheetSource {
    client: reqwest::Client,
    url: String,
    cache_bust_param: String,
}

impl HttpSheetSource {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        cache_bust_param: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            cache_bust_param: cache_bust_param.into(),
        })
    }

    pub fn request_url(&self, now_ms: i64) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", self.url, sep, self.cache_bust_param, now_ms)
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    #[instrument(skip(self), fields(source = "sheet", operation = "fetch_csv"))]
    async fn fetch_csv(&self) -> Result<String, FetchError> {
        let url = self.request_url(chrono::Utc::now().timestamp_millis());
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

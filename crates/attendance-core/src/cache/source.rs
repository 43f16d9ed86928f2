//! Remote origin of the attendance sheet.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::FetchError;

/// HTTP request timeout in seconds.
/// Published spreadsheets can be slow to export; 60s still fails a hung request.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Something that can produce the current raw CSV bytes.
pub trait DatasetSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// Fetches the sheet with a single HTTP GET.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl DatasetSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        debug!(url = %self.url, "Fetching dataset");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status, &body));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

use crate::domain::model::RawResponse;
use crate::utils::error::Result;
use async_trait::async_trait;
use url::Url;

/// Issues a single GET against the proxy.
///
/// Non-2xx statuses are NOT errors at this layer; they come back as a
/// `RawResponse` for the decoder to classify. Only failures to obtain a
/// response at all (connection refused, timeout) are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> Result<RawResponse> {
        (**self).get(url).await
    }
}

//! Response helpers shared by the provider clients.

use crate::error::ProviderError;

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`ProviderError::ApiError`] containing the
/// status and body text on failure.
pub(crate) async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::ApiError {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(provider, response).await?;
    Ok(response.json::<T>().await?)
}

/// Read a successful response body as raw bytes.
pub(crate) async fn read_bytes(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<Vec<u8>, ProviderError> {
    let response = ensure_success(provider, response).await?;
    Ok(response.bytes().await?.to_vec())
}

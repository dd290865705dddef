/// Errors from the outbound provider clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("{provider} API error: {status} - {body}")]
    ApiError {
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The video provider is shedding load.
    #[error("RATE_LIMIT: Server is busy. Please try again in 10 minutes.")]
    RateLimited,

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected {provider} response: {detail}")]
    InvalidResponse {
        provider: &'static str,
        detail: String,
    },

    /// The provider accepted the request but reported a failure in its body.
    #[error("{0}")]
    Rejected(String),
}

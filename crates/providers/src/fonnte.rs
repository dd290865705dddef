//! WhatsApp delivery through the Fonnte gateway.

use reqwest::multipart::Form;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http;

const PROVIDER: &str = "Fonnte";

#[derive(Clone)]
pub struct FonnteClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Fonnte answers 200 even for rejected sends; `status` carries the outcome.
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    reason: Option<String>,
}

impl FonnteClient {
    pub fn new(client: reqwest::Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Send a text message. `country_code` is omitted from the form when
    /// empty, letting the gateway apply its own default.
    pub async fn send(
        &self,
        local_number: &str,
        country_code: &str,
        message: &str,
    ) -> Result<(), ProviderError> {
        let mut form = Form::new()
            .text("target", local_number.to_string())
            .text("message", message.to_string());
        if !country_code.is_empty() {
            form = form.text("countryCode", country_code.to_string());
        }

        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .header("Authorization", &self.token)
            .multipart(form)
            .send()
            .await?;

        let result: SendResponse = http::parse_response(PROVIDER, response).await?;
        if !result.status {
            return Err(ProviderError::Rejected(
                result.reason.unwrap_or_else(|| "message rejected".into()),
            ));
        }
        Ok(())
    }
}

//! Provider credentials and endpoints.

/// Credentials and base URLs for every outbound provider.
///
/// Keys are optional: the server starts without them and only the
/// operations that need a missing key fail (with a configuration error).
///
/// | Env var                | Default                                   |
/// |------------------------|-------------------------------------------|
/// | `VEO_API_KEY`          | *(none)*                                  |
/// | `OPENAI_API_KEY`       | *(none)*                                  |
/// | `HUGGINGFACE_API_KEY`  | *(none)*                                  |
/// | `FONNTE_API_TOKEN`     | *(none)*                                  |
/// | `STORAGE_URL`          | *(none)*                                  |
/// | `STORAGE_SERVICE_KEY`  | *(none)*                                  |
/// | `VEO_BASE_URL`         | `https://api.geminigen.ai/uapi/v1`        |
/// | `OPENAI_BASE_URL`      | `https://api.openai.com/v1`               |
/// | `HUGGINGFACE_BASE_URL` | `https://router.huggingface.co/hf-inference/models` |
/// | `FONNTE_BASE_URL`      | `https://api.fonnte.com`                  |
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub veo_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub fonnte_api_token: Option<String>,
    /// Storage REST root, e.g. `https://<project>.supabase.co/storage/v1`.
    pub storage_url: Option<String>,
    pub storage_service_key: Option<String>,
    pub veo_base_url: String,
    pub openai_base_url: String,
    pub huggingface_base_url: String,
    pub fonnte_base_url: String,
}

pub const DEFAULT_VEO_BASE_URL: &str = "https://api.geminigen.ai/uapi/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_FONNTE_BASE_URL: &str = "https://api.fonnte.com";

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            veo_api_key: None,
            openai_api_key: None,
            huggingface_api_key: None,
            fonnte_api_token: None,
            storage_url: None,
            storage_service_key: None,
            veo_base_url: DEFAULT_VEO_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            huggingface_base_url: DEFAULT_HUGGINGFACE_BASE_URL.to_string(),
            fonnte_base_url: DEFAULT_FONNTE_BASE_URL.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Load provider settings from environment variables. Empty values
    /// count as unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            veo_api_key: env_opt("VEO_API_KEY"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            huggingface_api_key: env_opt("HUGGINGFACE_API_KEY"),
            fonnte_api_token: env_opt("FONNTE_API_TOKEN"),
            storage_url: env_opt("STORAGE_URL").map(|u| u.trim_end_matches('/').to_string()),
            storage_service_key: env_opt("STORAGE_SERVICE_KEY"),
            veo_base_url: env_opt("VEO_BASE_URL").unwrap_or(defaults.veo_base_url),
            openai_base_url: env_opt("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            huggingface_base_url: env_opt("HUGGINGFACE_BASE_URL")
                .unwrap_or(defaults.huggingface_base_url),
            fonnte_base_url: env_opt("FONNTE_BASE_URL").unwrap_or(defaults.fonnte_base_url),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

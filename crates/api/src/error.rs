use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};
use sparkfluence_core::error::CoreError;
use sparkfluence_pipeline::PipelineError;
use sparkfluence_providers::ProviderError;

/// Flat error codes reported in the `error.code` field of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    InvalidJson,
    EmptyBody,
    ConfigError,
    JobNotFound,
    NoImage,
    GenerationFailed,
    DbError,
    NotFound,
    RateLimited,
    Cooldown,
    InvalidPhone,
    PhoneRegistered,
    SendFailed,
    MissingParams,
    OtpExpired,
    InvalidOtp,
    PhoneTaken,
    ValidationError,
    Conflict,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidJson => "INVALID_JSON",
            Self::EmptyBody => "EMPTY_BODY",
            Self::ConfigError => "CONFIG_ERROR",
            Self::JobNotFound => "JOB_NOT_FOUND",
            Self::NoImage => "NO_IMAGE",
            Self::GenerationFailed => "GENERATION_FAILED",
            Self::DbError => "DB_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Cooldown => "COOLDOWN",
            Self::InvalidPhone => "INVALID_PHONE",
            Self::PhoneRegistered => "PHONE_REGISTERED",
            Self::SendFailed => "SEND_FAILED",
            Self::MissingParams => "MISSING_PARAMS",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::InvalidOtp => "INVALID_OTP",
            Self::PhoneTaken => "PHONE_TAKEN",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput
            | Self::InvalidJson
            | Self::EmptyBody
            | Self::NoImage
            | Self::InvalidPhone
            | Self::PhoneRegistered
            | Self::MissingParams
            | Self::OtpExpired
            | Self::InvalidOtp
            | Self::PhoneTaken
            | Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::JobNotFound | Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimited | Self::Cooldown => StatusCode::TOO_MANY_REQUESTS,
            Self::ConfigError
            | Self::GenerationFailed
            | Self::DbError
            | Self::SendFailed
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application-level error type for HTTP handlers.
///
/// Renders as `{ success: false, error: { code, message, ...extra }, data? }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `sparkfluence_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An outbound provider call failed outside a job's own bookkeeping.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A failure with an explicit code. `extra` is merged into the error
    /// object; `data` is attached next to it.
    #[error("{message}")]
    Coded {
        code: ErrorCode,
        message: String,
        extra: Map<String, Value>,
        data: Option<Value>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Coded {
            code,
            message: message.into(),
            extra: Map::new(),
            data: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::InvalidInput, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::ConfigError, message)
    }

    /// Add a field to the error object. No-op on uncoded variants.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Self::Coded { extra, .. } = &mut self {
            extra.insert(key.to_string(), value.into());
        }
        self
    }

    /// Attach a `data` payload to the error envelope. No-op on uncoded
    /// variants.
    pub fn with_data(mut self, payload: Value) -> Self {
        if let Self::Coded { data, .. } = &mut self {
            *data = Some(payload);
        }
        self
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Core(e) => Self::Core(e),
            PipelineError::Provider(e) => Self::Provider(e),
            PipelineError::Database(e) => Self::Database(e),
            PipelineError::MissingKey(key) => Self::config(format!("{key} not configured")),
            PipelineError::JobNotFound => Self::coded(ErrorCode::JobNotFound, "Job not found"),
            PipelineError::NoImage => Self::coded(ErrorCode::NoImage, "Job has no image URL"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message, extra, data) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    ErrorCode::NotFound,
                    format!("{entity} with id {id} not found"),
                    Map::new(),
                    None,
                ),
                CoreError::Validation(msg) => (ErrorCode::InvalidInput, msg, Map::new(), None),
                CoreError::Conflict(msg) => (ErrorCode::Conflict, msg, Map::new(), None),
                CoreError::Config(msg) => (ErrorCode::ConfigError, msg, Map::new(), None),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (ErrorCode::InternalError, sanitized(), Map::new(), None)
                }
            },

            // --- Database errors ---
            AppError::Database(err) => {
                let (code, message) = classify_sqlx_error(&err);
                (code, message, Map::new(), None)
            }

            // --- Provider errors ---
            AppError::Provider(err) => {
                tracing::error!(error = %err, "Provider call failed");
                (ErrorCode::GenerationFailed, err.to_string(), Map::new(), None)
            }

            // --- HTTP-specific errors ---
            AppError::Coded {
                code,
                message,
                extra,
                data,
            } => (code, message, extra, data),
            AppError::BadRequest(msg) => (ErrorCode::ValidationError, msg, Map::new(), None),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (ErrorCode::InternalError, sanitized(), Map::new(), None)
            }
        };

        let mut error = Map::new();
        error.insert("code".into(), json!(code.as_str()));
        error.insert("message".into(), json!(message));
        error.extend(extra);

        let mut body = json!({
            "success": false,
            "error": error,
        });
        if let Some(data) = data {
            body["data"] = data;
        }

        (code.status(), axum::Json(body)).into_response()
    }
}

fn sanitized() -> String {
    "An internal error occurred".to_string()
}

/// Classify a sqlx error into an error code and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (ErrorCode, String) {
    match err {
        sqlx::Error::RowNotFound => (ErrorCode::NotFound, "Resource not found".to_string()),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        ErrorCode::Conflict,
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (ErrorCode::DbError, "A database error occurred".to_string())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (ErrorCode::DbError, "A database error occurred".to_string())
        }
    }
}

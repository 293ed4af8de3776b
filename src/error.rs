use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{models::ResponseEnvelope, openai::ProviderError};

/// Every way a generation request can end without a result.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Missing OPENAI_API_KEY")]
    MissingCredential,
    #[error("Content-Type must be application/json")]
    UnsupportedContentType,
    #[error("Invalid JSON body")]
    MalformedBody,
    #[error("{0}")]
    MissingInput(String),
    #[error("Invalid type: {0}")]
    UnknownArtifactKind(String),
    #[error(transparent)]
    Provider(#[from] ProviderFailure),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnsupportedContentType
            | AppError::MalformedBody
            | AppError::MissingInput(_)
            | AppError::UnknownArtifactKind(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredential | AppError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(ProviderFailure::classify(&err.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(ResponseEnvelope::failure(self.to_string()))).into_response()
    }
}

/// User-facing category of a provider failure.
///
/// Derived from the provider's error text, whose wording is not a stable contract, so this is
/// advisory only: anything unrecognised is passed through as [`ProviderFailure::Unclassified`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("Invalid API key")]
    InvalidCredential,
    #[error("API quota exhausted")]
    QuotaExhausted,
    #[error("Too many requests, please try again shortly")]
    RateLimited,
    #[error("News content is too long for the model")]
    ContentTooLong,
    #[error("{0}")]
    Unclassified(String),
}

const CREDENTIAL_PATTERNS: &[&str] = &["api key", "invalid_api_key"];
const QUOTA_PATTERNS: &[&str] = &["quota"];
const RATE_LIMIT_PATTERNS: &[&str] = &["rate_limit", "rate limit"];
const TOO_LONG_PATTERNS: &[&str] =
    &["maximum context length", "context_length_exceeded", "too long"];

impl ProviderFailure {
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let matches = |patterns: &[&str]| patterns.iter().any(|p| lowered.contains(p));

        if matches(CREDENTIAL_PATTERNS) {
            ProviderFailure::InvalidCredential
        } else if matches(QUOTA_PATTERNS) {
            ProviderFailure::QuotaExhausted
        } else if matches(RATE_LIMIT_PATTERNS) {
            ProviderFailure::RateLimited
        } else if matches(TOO_LONG_PATTERNS) {
            ProviderFailure::ContentTooLong
        } else if raw.trim().is_empty() {
            ProviderFailure::Unclassified("Generation failed".to_string())
        } else {
            ProviderFailure::Unclassified(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_known_provider_messages() {
        let cases = [
            ("Incorrect API key provided: sk-****", ProviderFailure::InvalidCredential),
            (
                "You exceeded your current quota, please check your plan",
                ProviderFailure::QuotaExhausted,
            ),
            ("Rate limit reached for gpt-4o in organization org-1", ProviderFailure::RateLimited),
            ("error code: rate_limit_exceeded", ProviderFailure::RateLimited),
            (
                "This model's maximum context length is 128000 tokens",
                ProviderFailure::ContentTooLong,
            ),
        ];
        for (raw, expected) in cases {
            assert_eq!(ProviderFailure::classify(raw), expected, "{raw}");
        }
    }

    #[test]
    fn unmatched_message_passes_through() {
        let raw = "The server had an error while processing your request";
        assert_eq!(ProviderFailure::classify(raw), ProviderFailure::Unclassified(raw.into()));
        assert_eq!(
            ProviderFailure::classify("  "),
            ProviderFailure::Unclassified("Generation failed".into())
        );
    }

    #[test]
    fn provider_errors_classify_through_their_message() {
        let err: AppError =
            ProviderError::Api { status: 429, message: "Rate limit reached".into() }.into();
        assert!(matches!(err, AppError::Provider(ProviderFailure::RateLimited)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(AppError::MissingCredential.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::UnsupportedContentType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MalformedBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingInput("news".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::UnknownArtifactKind("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::UnknownArtifactKind("poem".into()).to_string(), "Invalid type: poem");
    }
}

use thiserror::Error;

use crate::core::bundle::CodeBundle;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Decode error: {source}")]
    Decode {
        source: DecodeError,
        /// Bundle the caller should keep showing; never regresses to empty.
        fallback: CodeBundle,
    },

    #[error("Analysis error: {0}")]
    Analysis(DecodeError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("No usage data for session: {0}")]
    SessionNotFound(String),
}

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited{}", retry_hint(.retry_after_ms))]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

fn retry_hint(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(", retry after {ms}ms"),
        None => String::new(),
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("no recognizable fields in model output ({0})")]
    Unrecognized(String),

    #[error("analysis output is not valid JSON ({0})")]
    Analysis(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("history must be an array: {0}")]
    InvalidHistory(String),

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure category the calling layer maps onto a status or exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    RateLimited,
    BadRequest,
    Decode,
    Upstream,
    Timeout,
    NotFound,
    Config,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            Self::Auth => 401,
            Self::RateLimited => 429,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Timeout => 504,
            Self::Upstream => 502,
            Self::Decode | Self::Config => 500,
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::BadRequest => 2,
            Self::Auth => 3,
            Self::RateLimited => 4,
            Self::Timeout => 5,
            Self::Upstream => 6,
            Self::Decode => 7,
            Self::NotFound => 8,
            Self::Config => 9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "Authentication failed",
            Self::RateLimited => "Rate limit exceeded",
            Self::BadRequest => "Invalid request",
            Self::Decode => "Internal server error",
            Self::Upstream => "Upstream error",
            Self::Timeout => "Upstream timeout",
            Self::NotFound => "Not found",
            Self::Config => "Configuration error",
        }
    }
}

impl AssistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider(e) => e.kind(),
            Self::Decode { .. } | Self::Analysis(_) => ErrorKind::Decode,
            Self::Validation(_) => ErrorKind::BadRequest,
            Self::Config(_) => ErrorKind::Config,
            Self::SessionNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// The unchanged fallback bundle carried by a decode failure.
    pub fn fallback_bundle(&self) -> Option<&CodeBundle> {
        match self {
            Self::Decode { fallback, .. } => Some(fallback),
            _ => None,
        }
    }
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) | Self::MissingApiKey(_) => ErrorKind::Auth,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Http(_) | Self::Api { .. } | Self::InvalidResponse(_) => ErrorKind::Upstream,
        }
    }

    /// Whether another attempt against the upstream could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => matches!(status, 500 | 502 | 503 | 529),
            _ => false,
        }
    }
}

//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs and API responses
//! can be grepped and monitored without parsing messages.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - INPUT_xxx: request validation errors (raised before the core runs)
//! - API_xxx: HTTP surface errors
//! - CFG_xxx: configuration errors
//! - REGISTRY_xxx: scam registry errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Input Errors
    // ============================================
    /// Malformed wallet/contract address
    InvalidAddress,
    /// tx_type outside approve|swap|transfer|send
    UnsupportedTxType,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Unauthorized (invalid API key)
    ApiUnauthorized,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Scam Registry Errors
    // ============================================
    /// Registry snapshot could not be read
    RegistryLoadFailed,
    /// Registry snapshot is malformed
    RegistryInvalid,

    // ============================================
    // Analysis Errors
    // ============================================
    /// Analysis aborted for this request
    AnalysisFailed,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Input Errors
            Self::InvalidAddress => "INPUT_INVALID_ADDRESS",
            Self::UnsupportedTxType => "INPUT_UNSUPPORTED_TX_TYPE",

            // API Errors
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            // Configuration Errors
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Registry Errors
            Self::RegistryLoadFailed => "REGISTRY_LOAD_FAILED",
            Self::RegistryInvalid => "REGISTRY_INVALID",

            // Analysis
            Self::AnalysisFailed => "ANALYSIS_FAILED",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::InvalidAddress | Self::UnsupportedTxType => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Malformed address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    /// Unsupported transaction type
    pub fn unsupported_tx_type(tx_type: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedTxType,
            format!("Unsupported tx_type: {} (expected approve, swap, transfer or send)", tx_type),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    /// Analysis aborted
    pub fn analysis_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AnalysisFailed, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Missing or malformed API key
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::ApiUnauthorized, "Invalid or missing API key")
    }

    /// Rate limit window exhausted
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            ErrorCode::ApiRateLimited,
            format!("Rate limit exceeded. Retry after {} seconds", retry_after_secs),
        )
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from provider errors
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::invalid_address("Address must start with 0x");
        assert_eq!(err.code, ErrorCode::InvalidAddress);
        assert_eq!(err.code_str(), "INPUT_INVALID_ADDRESS");
        assert_eq!(err.to_string(), "[INPUT_INVALID_ADDRESS] Address must start with 0x");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::InvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::UnsupportedTxType.http_status(), 400);
        assert_eq!(ErrorCode::ApiUnauthorized.http_status(), 401);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::AnalysisFailed.http_status(), 500);
    }

    #[test]
    fn test_rate_limited_message() {
        let err = AppError::rate_limited(42);
        assert_eq!(err.code_str(), "API_RATE_LIMITED");
        assert!(err.message.contains("42"));
    }

    #[test]
    fn test_unsupported_tx_type_message() {
        let err = AppError::unsupported_tx_type("mint");
        assert_eq!(err.code, ErrorCode::UnsupportedTxType);
        assert!(err.message.contains("mint"));
    }
}

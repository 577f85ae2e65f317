/*!
 * Error types for the bisub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with translator backends
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised while acquiring a caption track.
///
/// These are fatal for the current video: the pipeline never starts.
#[derive(Error, Debug)]
pub enum TrackError {
    /// The HTTP request could not be completed
    #[error("Failed to fetch caption track: {0}")]
    Request(String),

    /// The server answered with a non-success status
    #[error("Caption track request returned HTTP {0}")]
    Status(u16),

    /// The document was not a usable timed-text track
    #[error("Failed to parse caption track: {0}")]
    Parse(String),
}

/// Errors raised while pulling structured data out of a translator reply
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No fenced block or array literal was found
    #[error("No structured data found in response")]
    NoStructuredData,

    /// The first structured block did not parse
    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),

    /// The parsed value was neither an array nor an object, or an item was malformed
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The response did not carry exactly one item per batch entry
    #[error("Response has {actual} items but the batch has {expected}")]
    LengthMismatch {
        /// Number of subtitles in the batch
        expected: usize,
        /// Number of items extracted from the response
        actual: usize,
    },
}

/// Errors that can occur while translating one batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the translator backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The reply could not be turned into one record per subtitle
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The translator gave no answer at all
    #[error("Translator returned no response")]
    NoResponse,

    /// Every attempt for a batch failed
    #[error("Batch {batch} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Zero-based batch index
        batch: usize,
        /// Number of attempts made
        attempts: usize,
        /// The last error observed
        #[source]
        source: Box<TranslationError>,
    },
}

impl TranslationError {
    /// Whether the retry controller may submit the same batch again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(_) | Self::Extraction(_) => true,
            Self::NoResponse | Self::RetriesExhausted { .. } => false,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the caption track
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

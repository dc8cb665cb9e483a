//! Defines the custom error types for the lead-scout application.

use crate::places::PlacesStatus;
use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for the discovery pipeline.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// The requested country is not in the supported country table.
    #[error("Unsupported country: {0}")]
    UnsupportedCountry(String),

    /// A discovery run is already active on this controller.
    #[error("Discovery already running (run {0})")]
    AlreadyRunning(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a TOML configuration file.
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The structured search API answered with a non-OK status.
    #[error("Places API Error: {status}")]
    Places {
        /// Classified status reported by the API.
        status: PlacesStatus,
        /// Optional `error_message` from the response body.
        message: Option<String>,
    },

    /// The tabular store failed to read, create or append.
    #[error("Store Error: {0}")]
    Store(String),

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Indicates insufficient input data to proceed (e.g., empty website).
    #[error("Insufficient Input Data: {0}")]
    InsufficientInput(String),
}

impl AppError {
    /// Errors that only cost the current lead; the candidate loop carries on.
    pub(crate) fn is_persistence(&self) -> bool {
        matches!(
            self,
            AppError::Store(_) | AppError::Io(_) | AppError::Json(_)
        )
    }
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;

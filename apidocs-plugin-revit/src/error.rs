//! Error types for the Revit API search plugin

use apidocs_plugin::PluginError;

/// Errors that can occur while querying the documentation site
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The caller's cancellation token fired before a response arrived
    #[error("search cancelled")]
    Cancelled,

    /// Connection, TLS or body read failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL has no hierarchical path to append segments to
    #[error("base URL cannot carry a path: {0}")]
    UnusableBase(String),
}

impl From<SearchError> for PluginError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Cancelled => PluginError::Cancelled,
            other => PluginError::Transport(Box::new(other)),
        }
    }
}

/// Errors raised while reading or writing `settings.json`
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single search result entry was skipped
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid link: {0}")]
    InvalidLink(#[from] url::ParseError),
}

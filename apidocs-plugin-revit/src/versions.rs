//! The supported documentation versions.
//!
//! `SUPPORTED_VERSIONS` is the only table; both lookup directions and the
//! settings panel labels are derived from its declared order.

pub const SUPPORTED_VERSIONS: &[&str] = &["2022", "2023", "2024", "2025", "2025.3", "2026"];

pub const DEFAULT_VERSION: &str = "2023";

/// Prefix shown in front of each version in the settings panel.
pub const LABEL_PREFIX: &str = "R";

/// Index of [`DEFAULT_VERSION`] in [`SUPPORTED_VERSIONS`].
pub fn default_index() -> usize {
    SUPPORTED_VERSIONS
        .iter()
        .position(|v| *v == DEFAULT_VERSION)
        .unwrap_or(0)
}

/// Exact-match lookup. Unknown tokens resolve to [`default_index`].
pub fn token_to_index(token: &str) -> usize {
    SUPPORTED_VERSIONS
        .iter()
        .position(|v| *v == token)
        .unwrap_or_else(default_index)
}

pub fn index_to_token(index: usize) -> Option<&'static str> {
    SUPPORTED_VERSIONS.get(index).copied()
}

pub fn label(token: &str) -> String {
    format!("{LABEL_PREFIX}{token}")
}

pub fn labels() -> Vec<String> {
    SUPPORTED_VERSIONS.iter().map(|v| label(v)).collect()
}

//! Error taxonomy for the dispatcher.
//!
//! Only [`DispatchError`] ever escapes a cycle. Registry failures are
//! per-contract and end up as a count in [`crate::DispatchResult`].

use plowline_core::error::CoreError;

/// The weather source could not produce readings. Fatal to a cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Weather fetch timed out")]
    Timeout,

    #[error("Weather source unavailable: {0}")]
    Unavailable(String),

    #[error("Weather source returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// A contract or job registry call failed. Recovered per contract.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Registry operation timed out")]
    Timeout,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Registry storage error: {0}")]
    Storage(String),
}

/// Errors that abort a whole dispatch cycle before any tally exists.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Readings could not be fetched. No registry writes were made.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cycle options were rejected before the cycle started.
    #[error("Invalid dispatch configuration: {0}")]
    Configuration(CoreError),
}

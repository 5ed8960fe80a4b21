//! Operational error context propagation with `anyhow`.
//!
//! This module provides an extension trait for enhancing error context
//! on startup and coordination paths.

use std::{error::Error as StdError, fmt::Display};

use anyhow::{Context, Result as AnyhowResult};

/// Extension trait for enhanced error context.
///
/// Adds contextual information to errors so that startup failures are
/// reported with enough detail to act on.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}
